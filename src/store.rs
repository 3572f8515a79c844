//! Prediction and location persistence.
//!
//! The stores are external collaborators behind narrow traits; the default
//! [`MemoryStore`] keeps everything in process. Retrieval semantics live
//! here: latest-by-timestamp for predictions, last-write-wins judged by
//! record timestamp for locations.

use crate::error::{EngineError, EngineResult};
use crate::types::risk::RiskResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

/// One timestamped assessment outcome, keyed by user identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub identity: String,
    pub result: RiskResult,
    pub timestamp: DateTime<Utc>,
}

/// Most recent known position for an identity. No history is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub identity: String,
    pub lat: f64,
    pub lng: f64,
    pub timestamp: DateTime<Utc>,
}

/// Append-only prediction storage.
pub trait PredictionStore: Send + Sync {
    fn append(&self, record: PredictionRecord) -> EngineResult<()>;

    /// The entry with the greatest timestamp, or `None` for an unknown
    /// identity.
    fn latest(&self, identity: &str) -> EngineResult<Option<PredictionRecord>>;
}

/// Upsert location storage, one record per identity.
pub trait LocationStore: Send + Sync {
    fn set(&self, record: LocationRecord) -> EngineResult<()>;
    fn get(&self, identity: &str) -> EngineResult<Option<LocationRecord>>;
}

/// In-process store backing both traits.
#[derive(Default)]
pub struct MemoryStore {
    predictions: RwLock<HashMap<String, Vec<PredictionRecord>>>,
    locations: RwLock<HashMap<String, LocationRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(e: impl std::fmt::Display) -> EngineError {
    EngineError::Storage(format!("store lock poisoned: {}", e))
}

impl PredictionStore for MemoryStore {
    fn append(&self, record: PredictionRecord) -> EngineResult<()> {
        let mut predictions = self.predictions.write().map_err(poisoned)?;
        predictions
            .entry(record.identity.clone())
            .or_default()
            .push(record);
        Ok(())
    }

    fn latest(&self, identity: &str) -> EngineResult<Option<PredictionRecord>> {
        let predictions = self.predictions.read().map_err(poisoned)?;
        Ok(predictions
            .get(identity)
            .and_then(|records| records.iter().max_by_key(|r| r.timestamp))
            .cloned())
    }
}

impl LocationStore for MemoryStore {
    fn set(&self, record: LocationRecord) -> EngineResult<()> {
        let mut locations = self.locations.write().map_err(poisoned)?;
        match locations.get(&record.identity) {
            // The store judges last-write-wins by timestamp, not call order.
            Some(existing) if existing.timestamp > record.timestamp => {}
            _ => {
                locations.insert(record.identity.clone(), record);
            }
        }
        Ok(())
    }

    fn get(&self, identity: &str) -> EngineResult<Option<LocationRecord>> {
        let locations = self.locations.read().map_err(poisoned)?;
        Ok(locations.get(identity).cloned())
    }
}

/// Persists assessment results and retrieves the most recent one per user.
#[derive(Clone)]
pub struct PredictionRecorder {
    store: std::sync::Arc<dyn PredictionStore>,
}

impl PredictionRecorder {
    pub fn new(store: std::sync::Arc<dyn PredictionStore>) -> Self {
        Self { store }
    }

    /// Stamp and append one result.
    pub fn record(&self, identity: &str, result: &RiskResult) -> EngineResult<()> {
        let record = PredictionRecord {
            identity: identity.to_string(),
            result: result.clone(),
            timestamp: Utc::now(),
        };

        self.store.append(record)?;
        debug!(identity = %identity, "Prediction recorded");
        Ok(())
    }

    /// Most recent result for an identity; `None` is a valid empty result.
    pub fn latest(&self, identity: &str) -> EngineResult<Option<PredictionRecord>> {
        self.store.latest(identity)
    }
}
