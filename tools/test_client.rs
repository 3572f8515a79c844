//! Test Request Client
//!
//! Generates randomized assessment requests and exercises the service over
//! NATS request-reply.

use rand::Rng;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, warn};

/// Request generator for testing
struct RequestGenerator {
    rng: rand::rngs::ThreadRng,
    request_counter: u64,
}

impl RequestGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            request_counter: 0,
        }
    }

    /// Generate a calm, low-risk rule request
    fn generate_calm(&mut self) -> (String, Value) {
        self.request_counter += 1;
        let body = json!({
            "locationType": self.random_choice(&["home", "street"]),
            "activity": "walking",
            "time": "day",
            "weather": "clear",
            "heartRate": self.rng.gen_range(60..90),
        });
        ("rules.assess".to_string(), body)
    }

    /// Generate a high-risk rule request
    fn generate_risky(&mut self) -> (String, Value) {
        self.request_counter += 1;
        let body = json!({
            "locationType": self.random_choice(&["isolated", "street"]),
            "activity": self.random_choice(&["running", "driving fast"]),
            "time": "night",
            "weather": self.random_choice(&["rain", "storm", "fog"]),
            "heartRate": self.rng.gen_range(111..160),
        });
        ("rules.assess".to_string(), body)
    }

    /// Generate a classifier prediction request
    fn generate_predict(&mut self) -> (String, Value) {
        self.request_counter += 1;
        let body = json!({
            "email": format!("user_{:04}@example.com", self.rng.gen_range(1..50)),
            "age": self.rng.gen_range(18..70),
            "timeOfDay": self.rng.gen_range(0..24),
            "crowdDensity": self.rng.gen_range(0..10),
            "areaSafetyScore": self.rng.gen_range(0..100),
            "weather": self.rng.gen_range(0..4),
        });
        ("predict".to_string(), body)
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_client=info".parse()?),
        )
        .init();

    info!("Starting Test Request Client");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let prefix = args.get(2).map(|s| s.as_str()).unwrap_or("safety.");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(50);
    let risky_rate: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.2);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        prefix = %prefix,
        count = count,
        risky_rate = risky_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    // Connect to NATS
    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, risky_rate, delay_ms).await;
        }
    };

    let mut generator = RequestGenerator::new();
    let mut rng = rand::thread_rng();

    info!("Sending {} requests...", count);

    let mut rule_count = 0;
    let mut predict_count = 0;

    for i in 0..count {
        let (operation, body) = if rng.gen_bool(0.5) {
            predict_count += 1;
            generator.generate_predict()
        } else {
            rule_count += 1;
            if rng.gen_bool(risky_rate) {
                generator.generate_risky()
            } else {
                generator.generate_calm()
            }
        };

        let subject = format!("{}{}", prefix, operation);
        let payload = serde_json::to_vec(&body)?;

        match client.request(subject.clone(), payload.into()).await {
            Ok(reply) => {
                let response: Value = serde_json::from_slice(&reply.payload)?;
                info!(
                    request = i + 1,
                    subject = %subject,
                    response = %response,
                    "Reply received"
                );
            }
            Err(e) => {
                warn!(subject = %subject, error = %e, "Request failed");
            }
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Sent {} requests ({} rule, {} predict)",
        count, rule_count, predict_count
    );

    Ok(())
}

async fn run_dry_mode(count: u64, risky_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = RequestGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let (operation, body) = if rng.gen_bool(risky_rate) {
            generator.generate_risky()
        } else {
            generator.generate_calm()
        };

        if (i + 1) % 10 == 0 || i == 0 {
            info!(
                "Sample request {} ({}):\n{}",
                i + 1,
                operation,
                serde_json::to_string_pretty(&body)?
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
