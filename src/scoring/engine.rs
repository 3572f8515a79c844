//! Risk assessment orchestration.

use crate::error::EngineResult;
use crate::scoring::classifier::{Classifier, ClassifierScorer};
use crate::scoring::rules::RuleScorer;
use crate::types::features::FeatureVector;
use crate::types::risk::RiskResult;
use crate::types::signals::ContextualSignals;
use std::sync::Arc;
use tracing::debug;

/// Input to an assessment; the shape selects the scoring strategy.
#[derive(Debug, Clone)]
pub enum AssessmentInput {
    /// Numeric feature vector, scored by the trained classifier.
    Features(FeatureVector),
    /// Categorical signals, scored by the deterministic rule table.
    Signals(ContextualSignals),
}

/// Orchestrates the two scoring strategies behind a uniform result shape.
///
/// The strategies are independent alternatives: a single assessment is always
/// served by exactly one of them.
#[derive(Clone)]
pub struct RiskAssessmentEngine {
    rules: Arc<RuleScorer>,
    classifier: ClassifierScorer,
}

impl RiskAssessmentEngine {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self {
            rules: Arc::new(RuleScorer::new()),
            classifier: ClassifierScorer::new(classifier),
        }
    }

    /// Assess one input, selecting the strategy from its shape.
    pub fn assess(&self, input: &AssessmentInput) -> EngineResult<RiskResult> {
        let result = match input {
            AssessmentInput::Features(features) => self.classifier.score(features)?,
            AssessmentInput::Signals(signals) => self.rules.score(signals),
        };

        debug!(
            level = result.level.as_str(),
            score = result.score,
            source = ?result.source,
            "Assessment complete"
        );

        Ok(result)
    }

    /// Human-readable explanations for the given signals.
    pub fn insights(&self, signals: &ContextualSignals) -> Vec<String> {
        self.rules.insights(signals)
    }

    /// Listing of every rule and its weight.
    pub fn rule_catalog(&self) -> Vec<String> {
        self.rules.rule_catalog()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::classifier::stub::StubClassifier;
    use crate::types::risk::{RiskLevel, RiskSource};
    use crate::types::signals::{Activity, LocationType, TimeOfDay, Weather};

    fn engine() -> RiskAssessmentEngine {
        RiskAssessmentEngine::new(Arc::new(StubClassifier::new(1, [0.2, 0.7, 0.1])))
    }

    fn calm_signals() -> ContextualSignals {
        ContextualSignals {
            location_type: LocationType::Home,
            activity: Activity::Walking,
            time: TimeOfDay::Day,
            weather: Weather::Clear,
            heart_rate: 70,
        }
    }

    #[test]
    fn test_features_select_classifier_strategy() {
        let input = AssessmentInput::Features(
            FeatureVector::new(25, 22.0, 3.0, 40.0, 1.0).unwrap(),
        );
        let result = engine().assess(&input).unwrap();

        assert_eq!(result.source, RiskSource::Model);
        assert_eq!(result.level, RiskLevel::Medium);
        assert!(result.probabilities.is_some());
    }

    #[test]
    fn test_signals_select_rule_strategy() {
        let input = AssessmentInput::Signals(calm_signals());
        let result = engine().assess(&input).unwrap();

        assert_eq!(result.source, RiskSource::Rule);
        assert_eq!(result.level, RiskLevel::Low);
        assert!(result.probabilities.is_none());
    }

    #[test]
    fn test_insights_delegate_to_rule_table() {
        let mut signals = calm_signals();
        signals.time = TimeOfDay::Night;

        let insights = engine().insights(&signals);
        assert_eq!(insights, vec!["Risk increases significantly during night."]);
    }

    #[test]
    fn test_rule_catalog_exposed() {
        assert_eq!(engine().rule_catalog().len(), 5);
    }
}
