//! Service boundary: JSON request/response contracts and handlers.
//!
//! Transport-agnostic by design; `main` feeds these handlers from NATS
//! request-reply, but the contracts are the JSON bodies alone. Every failure
//! renders as `{"error": <message>}`.

use crate::dispatch::{AlertDispatcher, MessagingGateway};
use crate::error::{EngineError, EngineResult};
use crate::metrics::EngineMetrics;
use crate::scoring::engine::{AssessmentInput, RiskAssessmentEngine};
use crate::store::{LocationRecord, LocationStore, PredictionRecorder};
use crate::types::features::FeatureVector;
use crate::types::risk::{Probabilities, RiskLevel};
use crate::types::signals::ContextualSignals;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

/// Classifier-path prediction request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictRequest {
    pub email: String,
    pub age: u32,
    pub time_of_day: f64,
    pub crowd_density: f64,
    pub area_safety_score: f64,
    pub weather: f64,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: i64,
    pub probabilities: Probabilities,
}

/// Panic alert request
#[derive(Debug, Deserialize)]
pub struct PanicRequest {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Serialize)]
pub struct PanicResponse {
    pub status: String,
    pub sms_response: Value,
}

/// Live location update request
#[derive(Debug, Deserialize)]
pub struct LocationUpdateRequest {
    pub email: String,
    pub lat: f64,
    pub lng: f64,
}

/// Rule-path assessment response
#[derive(Debug, Serialize)]
pub struct RuleAssessResponse {
    pub risk_level: RiskLevel,
    pub risk_score: u32,
    pub factors: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub insights: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub rules: Vec<String>,
}

/// Latest-prediction query
#[derive(Debug, Deserialize)]
pub struct LatestRequest {
    pub email: String,
}

/// Shared handler state, one instance per process.
pub struct ServiceState<G> {
    pub engine: RiskAssessmentEngine,
    pub recorder: PredictionRecorder,
    pub locations: Arc<dyn LocationStore>,
    pub dispatcher: AlertDispatcher<G>,
    pub metrics: Arc<EngineMetrics>,
}

fn parse<'a, T: Deserialize<'a>>(payload: &'a [u8]) -> EngineResult<T> {
    serde_json::from_slice(payload).map_err(|e| EngineError::InvalidInput(e.to_string()))
}

impl<G: MessagingGateway> ServiceState<G> {
    /// Handle one request by operation name, returning the response body.
    pub async fn handle(&self, operation: &str, payload: &[u8]) -> Vec<u8> {
        let result = match operation {
            "predict" => self.predict(payload).await,
            "rules.assess" => self.assess_rules(payload),
            "rules.insights" => self.insights(payload),
            "rules.catalog" => self.rule_catalog(),
            "panic" => self.panic(payload).await,
            "location" => self.update_location(payload),
            "latest" => self.latest(payload),
            other => Err(EngineError::InvalidInput(format!(
                "unknown operation: {}",
                other
            ))),
        };

        let body = match result {
            Ok(value) => value,
            Err(e) => {
                warn!(operation = %operation, error = %e, "Request failed");
                json!({ "error": e.to_string() })
            }
        };

        serde_json::to_vec(&body).unwrap_or_else(|_| b"{}".to_vec())
    }

    /// Classifier-backed prediction, recorded per identity.
    ///
    /// Persistence is best-effort: a failed save is logged but the computed
    /// result is still returned to the caller.
    async fn predict(&self, payload: &[u8]) -> EngineResult<Value> {
        let started = Instant::now();
        let request: PredictRequest = parse(payload)?;

        let features = FeatureVector::new(
            request.age,
            request.time_of_day,
            request.crowd_density,
            request.area_safety_score,
            request.weather,
        )?;

        let result = self.engine.assess(&AssessmentInput::Features(features))?;
        self.metrics.record_assessment(started.elapsed(), &result);

        if let Err(e) = self.recorder.record(&request.email, &result) {
            warn!(identity = %request.email, error = %e, "Failed to persist prediction");
        }

        let probabilities = result.probabilities.ok_or_else(|| {
            EngineError::Inference("classifier result carried no probabilities".to_string())
        })?;

        serde_json::to_value(PredictResponse {
            prediction: result.score as i64,
            probabilities,
        })
        .map_err(|e| EngineError::Inference(e.to_string()))
    }

    /// Deterministic rule-based assessment.
    fn assess_rules(&self, payload: &[u8]) -> EngineResult<Value> {
        let started = Instant::now();
        let signals: ContextualSignals = parse(payload)?;

        let result = self.engine.assess(&AssessmentInput::Signals(signals))?;
        self.metrics.record_assessment(started.elapsed(), &result);

        serde_json::to_value(RuleAssessResponse {
            risk_level: result.level,
            risk_score: result.score as u32,
            factors: result.factors,
        })
        .map_err(|e| EngineError::InvalidInput(e.to_string()))
    }

    fn insights(&self, payload: &[u8]) -> EngineResult<Value> {
        let signals: ContextualSignals = parse(payload)?;
        let insights = self.engine.insights(&signals);
        serde_json::to_value(InsightsResponse { insights })
            .map_err(|e| EngineError::InvalidInput(e.to_string()))
    }

    fn rule_catalog(&self) -> EngineResult<Value> {
        serde_json::to_value(CatalogResponse {
            rules: self.engine.rule_catalog(),
        })
        .map_err(|e| EngineError::InvalidInput(e.to_string()))
    }

    /// Panic dispatch, bypassing scoring entirely.
    async fn panic(&self, payload: &[u8]) -> EngineResult<Value> {
        let request: PanicRequest = parse(payload)?;

        let outcome = self
            .dispatcher
            .send_panic_alert(&request.name, request.lat, request.lng)
            .await?;
        self.metrics.record_alert();

        serde_json::to_value(PanicResponse {
            status: outcome.status,
            sms_response: outcome.gateway_response,
        })
        .map_err(|e| EngineError::GatewayError(e.to_string()))
    }

    fn update_location(&self, payload: &[u8]) -> EngineResult<Value> {
        let request: LocationUpdateRequest = parse(payload)?;

        self.locations.set(LocationRecord {
            identity: request.email,
            lat: request.lat,
            lng: request.lng,
            timestamp: Utc::now(),
        })?;

        Ok(json!({ "status": "location_saved" }))
    }

    fn latest(&self, payload: &[u8]) -> EngineResult<Value> {
        let request: LatestRequest = parse(payload)?;

        let record = self
            .recorder
            .latest(&request.email)?
            .ok_or(EngineError::NotFound)?;

        serde_json::to_value(&record.result).map_err(|e| EngineError::Storage(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::stub::StubGateway;
    use crate::error::EngineResult;
    use crate::scoring::classifier::stub::StubClassifier;
    use crate::store::{MemoryStore, PredictionRecord, PredictionStore};

    fn state_with(
        classifier: StubClassifier,
        gateway: StubGateway,
    ) -> ServiceState<StubGateway> {
        let store = Arc::new(MemoryStore::new());
        ServiceState {
            engine: RiskAssessmentEngine::new(Arc::new(classifier)),
            recorder: PredictionRecorder::new(store.clone()),
            locations: store,
            dispatcher: AlertDispatcher::new(gateway, "1234567890"),
            metrics: Arc::new(EngineMetrics::new()),
        }
    }

    fn state() -> ServiceState<StubGateway> {
        state_with(
            StubClassifier::new(2, [0.1, 0.2, 0.7]),
            StubGateway::ok(json!({"return": true})),
        )
    }

    async fn call(state: &ServiceState<StubGateway>, operation: &str, body: Value) -> Value {
        let response = state
            .handle(operation, &serde_json::to_vec(&body).unwrap())
            .await;
        serde_json::from_slice(&response).unwrap()
    }

    fn predict_body() -> Value {
        json!({
            "email": "a@example.com",
            "age": 25,
            "timeOfDay": 22,
            "crowdDensity": 3,
            "areaSafetyScore": 40,
            "weather": 1
        })
    }

    #[tokio::test]
    async fn test_predict_contract() {
        let state = state();
        let response = call(&state, "predict", predict_body()).await;

        assert_eq!(response["prediction"], 2);
        assert_eq!(response["probabilities"]["high"], 0.7);
        assert_eq!(response["probabilities"]["low"], 0.1);
    }

    #[tokio::test]
    async fn test_predict_records_for_identity() {
        let state = state();
        call(&state, "predict", predict_body()).await;

        let latest = state.recorder.latest("a@example.com").unwrap().unwrap();
        assert_eq!(latest.result.score, 2.0);
    }

    #[tokio::test]
    async fn test_predict_rejects_malformed_payload() {
        let state = state();
        let response = call(&state, "predict", json!({"email": "a@example.com"})).await;

        assert!(response["error"]
            .as_str()
            .unwrap()
            .starts_with("invalid input"));
    }

    #[tokio::test]
    async fn test_rules_assess_contract() {
        let state = state();
        let response = call(
            &state,
            "rules.assess",
            json!({
                "locationType": "isolated",
                "activity": "running",
                "time": "night",
                "weather": "storm",
                "heartRate": 120
            }),
        )
        .await;

        assert_eq!(response["risk_level"], "High");
        assert_eq!(response["risk_score"], 100);
        assert_eq!(response["factors"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_insights_contract() {
        let state = state();
        let response = call(
            &state,
            "rules.insights",
            json!({
                "locationType": "home",
                "activity": "walking",
                "time": "day",
                "weather": "clear",
                "heartRate": 70
            }),
        )
        .await;

        assert_eq!(
            response["insights"],
            json!(["No major risk contributors detected."])
        );
    }

    #[tokio::test]
    async fn test_rule_catalog_contract() {
        let state = state();
        let response = call(&state, "rules.catalog", json!({})).await;
        assert_eq!(response["rules"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_panic_contract() {
        let state = state();
        let response = call(
            &state,
            "panic",
            json!({"name": "Asha", "lat": 12.9716, "lng": 77.5946}),
        )
        .await;

        assert_eq!(response["status"], "sent");
        assert_eq!(response["sms_response"], json!({"return": true}));
    }

    #[tokio::test]
    async fn test_panic_gateway_failure_surfaces() {
        let state = state_with(
            StubClassifier::new(0, [1.0, 0.0, 0.0]),
            StubGateway::failing(EngineError::GatewayError("no credit".to_string())),
        );
        let response = call(&state, "panic", json!({"name": "Asha", "lat": 1.0, "lng": 2.0})).await;

        assert!(response["error"]
            .as_str()
            .unwrap()
            .contains("messaging gateway error"));
    }

    #[tokio::test]
    async fn test_location_update_contract() {
        let state = state();
        let response = call(
            &state,
            "location",
            json!({"email": "a@example.com", "lat": 12.9, "lng": 77.5}),
        )
        .await;

        assert_eq!(response, json!({"status": "location_saved"}));
        let stored = state.locations.get("a@example.com").unwrap().unwrap();
        assert_eq!(stored.lat, 12.9);
    }

    #[tokio::test]
    async fn test_latest_without_history() {
        let state = state();
        let response = call(&state, "latest", json!({"email": "nobody@example.com"})).await;

        assert_eq!(response, json!({"error": "no predictions found"}));
    }

    #[tokio::test]
    async fn test_latest_after_predict() {
        let state = state();
        call(&state, "predict", predict_body()).await;
        let response = call(&state, "latest", json!({"email": "a@example.com"})).await;

        assert_eq!(response["level"], "High");
        assert_eq!(response["source"], "model");
    }

    #[tokio::test]
    async fn test_unknown_operation() {
        let state = state();
        let response = call(&state, "reboot", json!({})).await;
        assert!(response["error"].as_str().unwrap().contains("unknown operation"));
    }

    /// Store that always fails its writes.
    struct FailingStore;

    impl PredictionStore for FailingStore {
        fn append(&self, _record: PredictionRecord) -> EngineResult<()> {
            Err(EngineError::Storage("disk full".to_string()))
        }

        fn latest(&self, _identity: &str) -> EngineResult<Option<PredictionRecord>> {
            Err(EngineError::Storage("disk full".to_string()))
        }
    }

    #[tokio::test]
    async fn test_predict_returns_result_even_when_save_fails() {
        let store = Arc::new(MemoryStore::new());
        let state = ServiceState {
            engine: RiskAssessmentEngine::new(Arc::new(StubClassifier::new(1, [0.2, 0.7, 0.1]))),
            recorder: PredictionRecorder::new(Arc::new(FailingStore)),
            locations: store,
            dispatcher: AlertDispatcher::new(StubGateway::ok(json!({})), "1234567890"),
            metrics: Arc::new(EngineMetrics::new()),
        };

        let response = call(&state, "predict", predict_body()).await;

        // score-then-best-effort-persist: the result still comes back
        assert_eq!(response["prediction"], 1);
        assert_eq!(response["probabilities"]["medium"], 0.7);
    }
}
