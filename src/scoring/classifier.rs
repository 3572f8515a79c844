//! Classifier-backed risk scoring.
//!
//! The trained model sits behind the narrow [`Classifier`] trait so the
//! engine can be exercised with a stub; the production implementation is
//! [`crate::scoring::loader::OnnxClassifier`].

use crate::error::{EngineError, EngineResult};
use crate::types::features::{FeatureVector, FEATURE_COUNT};
use crate::types::risk::{Probabilities, RiskLevel, RiskResult, RiskSource};
use std::sync::Arc;
use tracing::debug;

/// Narrow interface over the trained classifier artifact.
pub trait Classifier: Send + Sync {
    /// Predicted class index: 0 = Low, 1 = Medium, 2 = High.
    fn predict_class(&self, features: &[f32; FEATURE_COUNT]) -> EngineResult<usize>;

    /// Class probabilities in `[Low, Medium, High]` order, summing to 1.
    fn predict_probabilities(&self, features: &[f32; FEATURE_COUNT]) -> EngineResult<[f64; 3]>;
}

/// Scoring strategy that wraps the trained classifier.
#[derive(Clone)]
pub struct ClassifierScorer {
    classifier: Arc<dyn Classifier>,
}

impl ClassifierScorer {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }

    /// Score a validated feature vector.
    ///
    /// The class index determines the level; the probability triple is passed
    /// through verbatim for downstream confidence display.
    pub fn score(&self, features: &FeatureVector) -> EngineResult<RiskResult> {
        features.validate()?;
        let input = features.as_model_input();

        let class = self.classifier.predict_class(&input)?;
        let probabilities = self.classifier.predict_probabilities(&input)?;

        let level = RiskLevel::from_class(class).ok_or_else(|| {
            EngineError::Inference(format!("model returned unknown class index {}", class))
        })?;

        debug!(class = class, level = level.as_str(), "Classifier prediction");

        Ok(RiskResult {
            level,
            score: class as f64,
            probabilities: Some(Probabilities::from_array(probabilities)),
            factors: Vec::new(),
            source: RiskSource::Model,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::stub::StubClassifier;
    use super::*;

    fn vector() -> FeatureVector {
        FeatureVector::new(25, 22.0, 3.0, 40.0, 1.0).unwrap()
    }

    #[test]
    fn test_class_maps_to_level() {
        for (class, expected) in [
            (0, RiskLevel::Low),
            (1, RiskLevel::Medium),
            (2, RiskLevel::High),
        ] {
            let mut probs = [0.1, 0.1, 0.1];
            probs[class] = 0.8;
            let scorer = ClassifierScorer::new(Arc::new(StubClassifier::new(class, probs)));

            let result = scorer.score(&vector()).unwrap();
            assert_eq!(result.level, expected);
            assert_eq!(result.score, class as f64);
            assert_eq!(result.source, RiskSource::Model);
        }
    }

    #[test]
    fn test_probabilities_pass_through() {
        let scorer = ClassifierScorer::new(Arc::new(StubClassifier::new(2, [0.05, 0.15, 0.8])));
        let result = scorer.score(&vector()).unwrap();

        let probs = result.probabilities.unwrap();
        assert!((probs.sum() - 1.0).abs() < 1e-6);
        assert_eq!(probs.argmax(), 2);
        assert_eq!(probs.high, 0.8);
    }

    #[test]
    fn test_level_matches_argmax_for_consistent_model() {
        let scorer = ClassifierScorer::new(Arc::new(StubClassifier::new(1, [0.2, 0.7, 0.1])));
        let result = scorer.score(&vector()).unwrap();

        let probs = result.probabilities.unwrap();
        assert_eq!(RiskLevel::from_class(probs.argmax()).unwrap(), result.level);
    }

    #[test]
    fn test_unknown_class_index_is_an_error() {
        let scorer = ClassifierScorer::new(Arc::new(StubClassifier::new(7, [0.3, 0.3, 0.4])));
        let err = scorer.score(&vector()).unwrap_err();
        assert!(matches!(err, EngineError::Inference(_)));
    }

    #[test]
    fn test_invalid_vector_rejected_before_inference() {
        let scorer = ClassifierScorer::new(Arc::new(StubClassifier::new(0, [1.0, 0.0, 0.0])));
        let invalid = FeatureVector {
            age: 25,
            time_of_day: f64::NAN,
            crowd_density: 3.0,
            area_safety_score: 40.0,
            weather: 1.0,
        };

        let err = scorer.score(&invalid).unwrap_err();
        assert!(matches!(err, EngineError::InvalidFeatureVector(_)));
    }
}
