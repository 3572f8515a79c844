//! Configuration management for the safety risk engine

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub model: ModelConfig,
    pub alert: AlertConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Wildcard subject the service answers on
    pub request_subject: String,
}

/// Classifier artifact configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Path to the ONNX model file
    pub path: String,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_onnx_threads() -> usize {
    1
}

/// Emergency alert configuration.
///
/// `api_key` and `emergency_number` are expected from the environment
/// (SAFETY__ALERT__API_KEY, SAFETY__ALERT__EMERGENCY_NUMBER) rather than the
/// config file.
#[derive(Debug, Clone, Deserialize)]
pub struct AlertConfig {
    /// SMS gateway endpoint
    pub gateway_url: String,
    /// Gateway API key
    #[serde(default)]
    pub api_key: String,
    /// Single preconfigured emergency destination
    #[serde(default)]
    pub emergency_number: String,
    /// Gateway request timeout in seconds (default: 10)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

/// Request handling configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Maximum concurrently handled requests
    pub workers: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from the default file path, with environment
    /// overrides.
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path, layering SAFETY__-prefixed
    /// environment variables on top.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix("SAFETY").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                request_subject: "safety.>".to_string(),
            },
            model: ModelConfig {
                path: "models/safety_risk.onnx".to_string(),
                onnx_threads: 1,
            },
            alert: AlertConfig {
                gateway_url: "https://www.fast2sms.com/dev/bulkV2".to_string(),
                api_key: String::new(),
                emergency_number: String::new(),
                timeout_secs: 10,
            },
            pipeline: PipelineConfig { workers: 4 },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}
