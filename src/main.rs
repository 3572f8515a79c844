//! Safety Risk Engine - Main Entry Point
//!
//! Answers assessment, panic, and location requests over NATS request-reply.
//! Requests are handled in parallel on a bounded worker pool.

use anyhow::{Context, Result};
use futures::StreamExt;
use safety_risk_engine::{
    api::ServiceState,
    config::AppConfig,
    consumer::RequestConsumer,
    dispatch::{AlertDispatcher, HttpSmsGateway},
    metrics::{EngineMetrics, MetricsReporter},
    scoring::{OnnxClassifier, RiskAssessmentEngine},
    store::{MemoryStore, PredictionRecorder},
};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first so logging can honor it
    let config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(
                format!("safety_risk_engine={}", config.logging.level).parse()?,
            ),
        )
        .init();

    info!("Starting Safety Risk Engine");

    // Load the classifier artifact. A missing model is fatal: the service
    // cannot serve classifier-backed predictions without it.
    let classifier = OnnxClassifier::load(&config.model.path, config.model.onnx_threads)
        .context("classifier artifact unavailable")?;
    let engine = RiskAssessmentEngine::new(Arc::new(classifier));
    info!(model = %config.model.path, "Risk assessment engine initialized");

    // In-process stores back both the recorder and the location upserts
    let store = Arc::new(MemoryStore::new());
    let recorder = PredictionRecorder::new(store.clone());

    let gateway = HttpSmsGateway::new(
        &config.alert.gateway_url,
        &config.alert.api_key,
        config.alert.timeout_secs,
    )?;
    let dispatcher = AlertDispatcher::new(gateway, &config.alert.emergency_number);

    let metrics = Arc::new(EngineMetrics::new());

    // Connect to NATS
    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    let consumer = RequestConsumer::new(client.clone(), &config.nats.request_subject);

    let state = Arc::new(ServiceState {
        engine,
        recorder,
        locations: store,
        dispatcher,
        metrics: metrics.clone(),
    });

    // Start metrics reporter (prints summary every 30 seconds)
    let metrics_clone = metrics.clone();
    tokio::spawn(async move {
        let reporter = MetricsReporter::new(metrics_clone, 30);
        reporter.start().await;
    });

    let num_workers = config.pipeline.workers;
    info!(
        subject = %config.nats.request_subject,
        workers = num_workers,
        "Starting request handling loop"
    );

    // Semaphore to limit concurrent handling
    let semaphore = Arc::new(Semaphore::new(num_workers));
    let subject_prefix = prefix_of(&config.nats.request_subject);

    let mut subscription = consumer.subscribe().await?;

    while let Some(message) = subscription.next().await {
        let permit = semaphore.clone().acquire_owned().await?;

        let state = state.clone();
        let client = client.clone();
        let prefix = subject_prefix.clone();

        tokio::spawn(async move {
            let operation = message
                .subject
                .as_str()
                .strip_prefix(prefix.as_str())
                .unwrap_or(message.subject.as_str())
                .to_string();

            let response = state.handle(&operation, &message.payload).await;

            match message.reply {
                Some(reply) => {
                    if let Err(e) = client.publish(reply, response.into()).await {
                        warn!(operation = %operation, error = %e, "Failed to publish reply");
                    }
                }
                None => warn!(operation = %operation, "Request had no reply subject"),
            }

            drop(permit);
        });
    }

    info!("Service shutting down...");
    metrics.print_summary();

    Ok(())
}

/// Turn a wildcard subscription subject into the prefix its operations hang
/// off of ("safety.>" -> "safety.").
fn prefix_of(request_subject: &str) -> String {
    request_subject
        .trim_end_matches('>')
        .trim_end_matches('*')
        .to_string()
}
