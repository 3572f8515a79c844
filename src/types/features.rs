//! Feature vector consumed by the trained classifier.
//!
//! Field order matches the training pipeline exactly; `as_model_input` is the
//! single place that order is defined.

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

/// Number of features the classifier expects.
pub const FEATURE_COUNT: usize = 5;

/// Fixed five-field numeric input for the classifier path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureVector {
    pub age: u32,
    pub time_of_day: f64,
    pub crowd_density: f64,
    pub area_safety_score: f64,
    pub weather: f64,
}

impl FeatureVector {
    /// Build a validated feature vector.
    ///
    /// Rejects non-finite values and negative crowd density; a vector that
    /// constructs is safe to hand to the model.
    pub fn new(
        age: u32,
        time_of_day: f64,
        crowd_density: f64,
        area_safety_score: f64,
        weather: f64,
    ) -> EngineResult<Self> {
        let vector = Self {
            age,
            time_of_day,
            crowd_density,
            area_safety_score,
            weather,
        };
        vector.validate()?;
        Ok(vector)
    }

    pub fn validate(&self) -> EngineResult<()> {
        for (name, value) in [
            ("timeOfDay", self.time_of_day),
            ("crowdDensity", self.crowd_density),
            ("areaSafetyScore", self.area_safety_score),
            ("weather", self.weather),
        ] {
            if !value.is_finite() {
                return Err(EngineError::InvalidFeatureVector(format!(
                    "{} is not a finite number",
                    name
                )));
            }
        }
        if self.crowd_density < 0.0 {
            return Err(EngineError::InvalidFeatureVector(
                "crowdDensity must be non-negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Model input in the exact order used during training.
    pub fn as_model_input(&self) -> [f32; FEATURE_COUNT] {
        [
            self.age as f32,
            self.time_of_day as f32,
            self.crowd_density as f32,
            self.area_safety_score as f32,
            self.weather as f32,
        ]
    }
}
