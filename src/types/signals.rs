//! Contextual signals consumed by the rule-based scoring path.
//!
//! Categorical fields parse case-insensitively and normalize separators, so
//! "Driving Fast" and "driving_fast" are the same activity. Unrecognized
//! values deliberately land on `Other` rather than failing deserialization:
//! an unknown category contributes nothing to the score instead of rejecting
//! the whole request.

use serde::{Deserialize, Serialize};

fn normalize(s: &str) -> String {
    s.trim().to_ascii_lowercase().replace([' ', '-'], "_")
}

/// Kind of location the user is currently in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum LocationType {
    Home,
    Street,
    Isolated,
    Other,
}

impl From<String> for LocationType {
    fn from(s: String) -> Self {
        match normalize(&s).as_str() {
            "home" => LocationType::Home,
            "street" => LocationType::Street,
            "isolated" => LocationType::Isolated,
            _ => LocationType::Other,
        }
    }
}

impl LocationType {
    /// Streets and isolated areas carry elevated exposure.
    pub fn is_unsafe(&self) -> bool {
        matches!(self, LocationType::Street | LocationType::Isolated)
    }
}

/// Current user activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Activity {
    Walking,
    Running,
    Driving,
    DrivingFast,
    Other,
}

impl From<String> for Activity {
    fn from(s: String) -> Self {
        match normalize(&s).as_str() {
            "walking" => Activity::Walking,
            "running" => Activity::Running,
            "driving" => Activity::Driving,
            "driving_fast" => Activity::DrivingFast,
            _ => Activity::Other,
        }
    }
}

impl Activity {
    pub fn is_high_risk(&self) -> bool {
        matches!(self, Activity::DrivingFast | Activity::Running)
    }
}

/// Coarse time-of-day bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum TimeOfDay {
    Day,
    Night,
    Other,
}

impl From<String> for TimeOfDay {
    fn from(s: String) -> Self {
        match normalize(&s).as_str() {
            "day" => TimeOfDay::Day,
            "night" => TimeOfDay::Night,
            _ => TimeOfDay::Other,
        }
    }
}

impl TimeOfDay {
    pub fn is_night(&self) -> bool {
        matches!(self, TimeOfDay::Night)
    }
}

/// Weather condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Weather {
    Clear,
    Rain,
    Storm,
    Fog,
    Other,
}

impl From<String> for Weather {
    fn from(s: String) -> Self {
        match normalize(&s).as_str() {
            "clear" => Weather::Clear,
            "rain" => Weather::Rain,
            "storm" => Weather::Storm,
            "fog" => Weather::Fog,
            _ => Weather::Other,
        }
    }
}

impl Weather {
    /// Rain, storm and fog all reduce visibility.
    pub fn reduces_visibility(&self) -> bool {
        matches!(self, Weather::Rain | Weather::Storm | Weather::Fog)
    }
}

/// Input shape for the rule-based scoring path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextualSignals {
    pub location_type: LocationType,
    pub activity: Activity,
    pub time: TimeOfDay,
    pub weather: Weather,
    pub heart_rate: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_parsing() {
        assert_eq!(TimeOfDay::from("NIGHT".to_string()), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from("Night".to_string()), TimeOfDay::Night);
        assert_eq!(Weather::from("Storm".to_string()), Weather::Storm);
        assert_eq!(LocationType::from("  Isolated ".to_string()), LocationType::Isolated);
    }

    #[test]
    fn test_activity_separator_normalization() {
        assert_eq!(Activity::from("driving fast".to_string()), Activity::DrivingFast);
        assert_eq!(Activity::from("driving_fast".to_string()), Activity::DrivingFast);
        assert_eq!(Activity::from("DRIVING FAST".to_string()), Activity::DrivingFast);
        assert_eq!(Activity::from("driving-fast".to_string()), Activity::DrivingFast);
    }

    #[test]
    fn test_unknown_values_fall_through() {
        assert_eq!(LocationType::from("mall".to_string()), LocationType::Other);
        assert_eq!(Activity::from("swimming".to_string()), Activity::Other);
        assert_eq!(TimeOfDay::from("dusk".to_string()), TimeOfDay::Other);
        assert_eq!(Weather::from("snow".to_string()), Weather::Other);

        assert!(!LocationType::Other.is_unsafe());
        assert!(!Activity::Other.is_high_risk());
        assert!(!TimeOfDay::Other.is_night());
        assert!(!Weather::Other.reduces_visibility());
    }

    #[test]
    fn test_signals_deserialization() {
        let json = r#"{
            "locationType": "Street",
            "activity": "running",
            "time": "night",
            "weather": "fog",
            "heartRate": 120
        }"#;

        let signals: ContextualSignals = serde_json::from_str(json).unwrap();
        assert_eq!(signals.location_type, LocationType::Street);
        assert_eq!(signals.activity, Activity::Running);
        assert_eq!(signals.time, TimeOfDay::Night);
        assert_eq!(signals.weather, Weather::Fog);
        assert_eq!(signals.heart_rate, 120);
    }

    #[test]
    fn test_garbled_signals_still_deserialize() {
        let json = r#"{
            "locationType": "???",
            "activity": "",
            "time": "midnightish",
            "weather": "hail",
            "heartRate": 70
        }"#;

        let signals: ContextualSignals = serde_json::from_str(json).unwrap();
        assert_eq!(signals.location_type, LocationType::Other);
        assert_eq!(signals.activity, Activity::Other);
        assert_eq!(signals.time, TimeOfDay::Other);
        assert_eq!(signals.weather, Weather::Other);
    }
}
