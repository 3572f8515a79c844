//! Emergency alert dispatch.
//!
//! Fire-and-forget, at-most-once: one gateway call per panic signal, no
//! retries. Whatever the gateway acknowledges is the delivery confirmation.

use crate::error::{EngineError, EngineResult};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{error, info};

/// Ephemeral panic notification. Never persisted.
#[derive(Debug, Clone)]
pub struct AlertMessage {
    pub alert_id: String,
    pub subject_name: String,
    pub lat: f64,
    pub lng: f64,
    pub rendered_text: String,
}

impl AlertMessage {
    /// Render the fixed alert template with a map link to the coordinates.
    pub fn new(subject_name: &str, lat: f64, lng: f64) -> Self {
        let rendered_text = format!(
            "🚨 EMERGENCY ALERT!\n{} may be in danger.\nLocation: https://maps.google.com/?q={},{}",
            subject_name, lat, lng
        );

        Self {
            alert_id: uuid::Uuid::new_v4().to_string(),
            subject_name: subject_name.to_string(),
            lat,
            lng,
            rendered_text,
        }
    }
}

/// Result of one dispatch attempt. The gateway payload passes through
/// verbatim for the caller.
#[derive(Debug, Clone)]
pub struct DeliveryOutcome {
    pub status: String,
    pub gateway_response: Value,
}

/// Outbound text-message channel.
pub trait MessagingGateway: Send + Sync {
    /// Deliver `text` to `destination`, returning the gateway's
    /// acknowledgment payload.
    fn send(
        &self,
        destination: &str,
        text: &str,
    ) -> impl Future<Output = EngineResult<Value>> + Send;
}

/// SMS gateway reached over HTTP.
pub struct HttpSmsGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpSmsGateway {
    pub fn new(endpoint: &str, api_key: &str, timeout_secs: u64) -> EngineResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| EngineError::GatewayUnreachable(format!("failed to build client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

impl MessagingGateway for HttpSmsGateway {
    async fn send(&self, destination: &str, text: &str) -> EngineResult<Value> {
        let payload = serde_json::json!({
            "message": text,
            "language": "english",
            "route": "q",
            "numbers": destination,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("authorization", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| EngineError::GatewayUnreachable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| EngineError::GatewayError(format!("unparseable response: {}", e)))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(EngineError::GatewayError(format!("{}: {}", status, body)))
        }
    }
}

/// Formats and sends emergency notifications to the preconfigured
/// destination.
pub struct AlertDispatcher<G> {
    gateway: G,
    destination: String,
}

impl<G: MessagingGateway> AlertDispatcher<G> {
    pub fn new(gateway: G, destination: &str) -> Self {
        Self {
            gateway,
            destination: destination.to_string(),
        }
    }

    /// Send a panic alert for `subject_name` at the given coordinates.
    ///
    /// Gateway failures propagate to the caller unchanged; there is no retry
    /// and no escalation.
    pub async fn send_panic_alert(
        &self,
        subject_name: &str,
        lat: f64,
        lng: f64,
    ) -> EngineResult<DeliveryOutcome> {
        let message = AlertMessage::new(subject_name, lat, lng);

        match self
            .gateway
            .send(&self.destination, &message.rendered_text)
            .await
        {
            Ok(gateway_response) => {
                info!(
                    alert_id = %message.alert_id,
                    subject = %message.subject_name,
                    "Panic alert dispatched"
                );
                Ok(DeliveryOutcome {
                    status: "sent".to_string(),
                    gateway_response,
                })
            }
            Err(e) => {
                error!(alert_id = %message.alert_id, error = %e, "Panic alert failed");
                Err(e)
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::stub::StubGateway;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_embeds_name_and_coordinates() {
        let message = AlertMessage::new("Asha", 12.9716, 77.5946);

        assert!(message.rendered_text.contains("Asha"));
        assert!(message.rendered_text.contains("12.9716"));
        assert!(message.rendered_text.contains("77.5946"));
        assert!(message
            .rendered_text
            .contains("https://maps.google.com/?q=12.9716,77.5946"));
    }

    #[tokio::test]
    async fn test_dispatch_returns_gateway_payload_verbatim() {
        let ack = json!({"return": true, "request_id": "abc123"});
        let dispatcher = AlertDispatcher::new(StubGateway::ok(ack.clone()), "1234567890");

        let outcome = dispatcher
            .send_panic_alert("Asha", 12.9716, 77.5946)
            .await
            .unwrap();

        assert_eq!(outcome.status, "sent");
        assert_eq!(outcome.gateway_response, ack);
    }

    #[tokio::test]
    async fn test_dispatch_targets_configured_destination() {
        let gateway = StubGateway::ok(json!({}));
        let dispatcher = AlertDispatcher::new(gateway, "1234567890");

        dispatcher.send_panic_alert("Asha", 1.0, 2.0).await.unwrap();

        let sent = dispatcher.gateway.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "1234567890");
        assert!(sent[0].1.contains("Asha"));
    }

    #[tokio::test]
    async fn test_gateway_failure_propagates() {
        let gateway =
            StubGateway::failing(EngineError::GatewayError("credit exhausted".to_string()));
        let dispatcher = AlertDispatcher::new(gateway, "1234567890");

        let err = dispatcher
            .send_panic_alert("Asha", 1.0, 2.0)
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::GatewayError(_)));
    }
}
