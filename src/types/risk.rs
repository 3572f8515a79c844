//! Risk classification data structures

use serde::{Deserialize, Serialize};

/// Fixed class-index order used by the trained classifier.
pub const CLASS_LABELS: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

/// Ordinal risk classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Map a rule-based point total (0-100) to a level.
    pub fn from_points(points: u32) -> Self {
        if points >= 70 {
            RiskLevel::High
        } else if points >= 40 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Map a classifier class index to a level.
    pub fn from_class(index: usize) -> Option<Self> {
        CLASS_LABELS.get(index).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

/// Class probability triple reported by the classifier, exposed verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Probabilities {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

impl Probabilities {
    pub fn from_array(p: [f64; 3]) -> Self {
        Self {
            low: p[0],
            medium: p[1],
            high: p[2],
        }
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.low, self.medium, self.high]
    }

    /// Index of the most probable class.
    pub fn argmax(&self) -> usize {
        let p = self.as_array();
        let mut best = 0;
        for (i, v) in p.iter().enumerate() {
            if *v > p[best] {
                best = i;
            }
        }
        best
    }

    pub fn sum(&self) -> f64 {
        self.low + self.medium + self.high
    }
}

/// Which strategy produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskSource {
    Rule,
    Model,
}

/// Uniform output of both scoring strategies.
///
/// `score` is a 0-100 point total on the rule path and the discrete class
/// index (0/1/2) on the model path; `probabilities` is populated on the model
/// path only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskResult {
    pub level: RiskLevel,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub probabilities: Option<Probabilities>,
    #[serde(default)]
    pub factors: Vec<String>,
    pub source: RiskSource,
}
