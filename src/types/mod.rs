//! Core data types

pub mod features;
pub mod risk;
pub mod signals;

pub use features::{FeatureVector, FEATURE_COUNT};
pub use risk::{Probabilities, RiskLevel, RiskResult, RiskSource};
pub use signals::ContextualSignals;
