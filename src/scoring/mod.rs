//! Scoring strategies and orchestration

pub mod classifier;
pub mod engine;
pub mod loader;
pub mod rules;

pub use classifier::{Classifier, ClassifierScorer};
pub use engine::{AssessmentInput, RiskAssessmentEngine};
pub use loader::OnnxClassifier;
pub use rules::RuleScorer;
