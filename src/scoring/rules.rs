//! Deterministic rule-based risk scoring.
//!
//! One factor table drives scoring, insight text, and the rule catalog, so
//! the three can never drift apart. Factors are evaluated in table order and
//! each contributes its weight at most once; the weights sum to 100.

use crate::types::risk::{RiskLevel, RiskResult, RiskSource};
use crate::types::signals::ContextualSignals;

/// One independent risk contributor.
struct RiskFactor {
    label: &'static str,
    weight: u32,
    triggered: fn(&ContextualSignals) -> bool,
    /// Human-readable explanation; not every factor carries one.
    insight: Option<&'static str>,
}

fn night(s: &ContextualSignals) -> bool {
    s.time.is_night()
}

fn bad_weather(s: &ContextualSignals) -> bool {
    s.weather.reduces_visibility()
}

fn high_risk_activity(s: &ContextualSignals) -> bool {
    s.activity.is_high_risk()
}

fn high_heart_rate(s: &ContextualSignals) -> bool {
    s.heart_rate > 110
}

fn unsafe_location(s: &ContextualSignals) -> bool {
    s.location_type.is_unsafe()
}

const RISK_FACTORS: &[RiskFactor] = &[
    RiskFactor {
        label: "Night Time",
        weight: 25,
        triggered: night,
        insight: Some("Risk increases significantly during night."),
    },
    RiskFactor {
        label: "Bad Weather",
        weight: 20,
        triggered: bad_weather,
        insight: Some("Bad weather reduces visibility and increases risk."),
    },
    RiskFactor {
        label: "High-risk activity",
        weight: 20,
        triggered: high_risk_activity,
        insight: None,
    },
    RiskFactor {
        label: "High heart rate",
        weight: 15,
        triggered: high_heart_rate,
        insight: Some("Elevated heart rate indicates stress or danger."),
    },
    RiskFactor {
        label: "Unsafe location",
        weight: 20,
        triggered: unsafe_location,
        insight: None,
    },
];

const NO_CONTRIBUTORS: &str = "No major risk contributors detected.";

/// Explainable additive scorer over the factor table.
pub struct RuleScorer;

impl RuleScorer {
    pub fn new() -> Self {
        Self
    }

    /// Score contextual signals.
    ///
    /// Accumulates the weight of every triggered factor and maps the total to
    /// a level (>= 70 High, >= 40 Medium, else Low). Unknown categorical
    /// values simply fail every predicate and contribute 0.
    pub fn score(&self, signals: &ContextualSignals) -> RiskResult {
        let mut points = 0u32;
        let mut factors = Vec::new();

        for factor in RISK_FACTORS {
            if (factor.triggered)(signals) {
                points += factor.weight;
                factors.push(factor.label.to_string());
            }
        }

        RiskResult {
            level: RiskLevel::from_points(points),
            score: points as f64,
            probabilities: None,
            factors,
            source: RiskSource::Rule,
        }
    }

    /// One explanatory sentence per triggered insight-bearing factor.
    pub fn insights(&self, signals: &ContextualSignals) -> Vec<String> {
        let insights: Vec<String> = RISK_FACTORS
            .iter()
            .filter(|f| (f.triggered)(signals))
            .filter_map(|f| f.insight.map(str::to_string))
            .collect();

        if insights.is_empty() {
            vec![NO_CONTRIBUTORS.to_string()]
        } else {
            insights
        }
    }

    /// Human-readable listing of every rule and its weight.
    pub fn rule_catalog(&self) -> Vec<String> {
        RISK_FACTORS
            .iter()
            .map(|f| format!("{} increases risk by +{}", f.label, f.weight))
            .collect()
    }

    /// Highest achievable score.
    pub fn max_score(&self) -> u32 {
        RISK_FACTORS.iter().map(|f| f.weight).sum()
    }
}

impl Default for RuleScorer {
    fn default() -> Self {
        Self::new()
    }
}
