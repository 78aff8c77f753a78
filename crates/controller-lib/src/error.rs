//! Error taxonomy for the control loop
//!
//! Cycle-local kinds (generation, validation, prediction) are caught at
//! the loop boundary and the run moves on to the next test case. Storage
//! is the sole fatal kind: a run that cannot persist observations stops.

use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, ControllerError>;

/// Everything that can go wrong in one control cycle.
///
/// External-call variants carry the underlying tool or service diagnostic
/// text verbatim.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Load-generator invocation failed (spawn error, non-zero exit, or
    /// timeout). Transient; the cycle is skipped.
    #[error("load generation failed: {0}")]
    Generation(String),

    /// Feature vector incomplete or non-finite. Signals a parser or
    /// contract regression, so it is never retried.
    #[error("feature vector validation failed: {0}")]
    Validation(String),

    /// Prediction service unreachable or returned a non-success status.
    #[error("prediction service unavailable: {0}")]
    PredictionUnavailable(String),

    /// Prediction service answered without a usable replica count.
    #[error("malformed prediction response: {0}")]
    PredictionMalformed(String),

    /// Orchestrator scale command failed. Recorded, never aborts the
    /// cycle: the observation is still worth keeping.
    #[error("scaling failed: {0}")]
    ScalingFailed(String),

    /// Observation log unavailable. Fatal for the whole run.
    #[error("observation store failure: {0}")]
    Storage(#[from] std::io::Error),
}

impl ControllerError {
    /// Whether the failed operation may be retried within the cycle.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::PredictionUnavailable(_) | Self::PredictionMalformed(_)
        )
    }

    /// Whether the error terminates the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}
