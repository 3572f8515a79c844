//! Error taxonomy for the safety risk engine.

use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced by the engine and its collaborators.
///
/// `ModelUnavailable` is fatal at startup; everything else is per-call and
/// recoverable. `NotFound` is a valid empty result, not a failure — the
/// service boundary renders it as an error object for the caller.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Missing or malformed request field. Rejected before any scorer runs.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The classifier artifact could not be loaded at startup.
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    /// Feature vector failed validation at call time.
    #[error("invalid feature vector: {0}")]
    InvalidFeatureVector(String),

    /// The loaded model failed during inference.
    #[error("inference failed: {0}")]
    Inference(String),

    /// The messaging gateway could not be reached at all.
    #[error("messaging gateway unreachable: {0}")]
    GatewayUnreachable(String),

    /// The messaging gateway responded with a failure.
    #[error("messaging gateway error: {0}")]
    GatewayError(String),

    /// No stored entry for the requested identity.
    #[error("no predictions found")]
    NotFound,

    /// Persistence store failure.
    #[error("storage error: {0}")]
    Storage(String),
}
