//! Feature vector construction
//!
//! Assembles the fixed nine-field vector the prediction model was trained
//! on, deriving the error rate from the observed status-class counts.

use crate::error::{ControllerError, Result};
use crate::models::{FeatureVector, MetricsRecord};

/// Status classes at or above this value count as server errors.
const ERROR_CLASS_MIN: u16 = 500;
/// Success range for the error-rate denominator.
const SUCCESS_RANGE: std::ops::RangeInclusive<u16> = 200..=399;

/// Builds the predictor's input vector from one metrics record.
pub struct FeatureVectorBuilder;

impl FeatureVectorBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build the ordered feature vector for one cycle.
    ///
    /// `concurrency` is the controlled parameter of the current test
    /// case. Fails with a validation error if any field is non-finite —
    /// that is a contract regression, not a transient fault, so callers
    /// must not retry it.
    pub fn build(&self, record: &MetricsRecord, concurrency: u32) -> Result<FeatureVector> {
        let vector = FeatureVector {
            requests_per_sec: record.requests_per_sec,
            size_per_request: record.size_per_request,
            concurrent_requests: concurrency as f64,
            latency_p10: record.latency_p10,
            latency_p50: record.latency_p50,
            latency_p75: record.latency_p75,
            latency_p90: record.latency_p90,
            latency_p99: record.latency_p99,
            error_rate: error_rate(record),
        };
        for (name, value) in vector.fields() {
            if !value.is_finite() {
                return Err(ControllerError::Validation(format!(
                    "field {:?} is not finite ({})",
                    name, value
                )));
            }
        }
        Ok(vector)
    }
}

impl Default for FeatureVectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Server errors over server errors plus successes. Classes outside both
/// ranges (1xx and 4xx) stay out of the ratio entirely. Zero when nothing
/// qualifies.
fn error_rate(record: &MetricsRecord) -> f64 {
    let mut errors = 0u64;
    let mut successes = 0u64;
    for (&code, &count) in &record.status_counts {
        if code >= ERROR_CLASS_MIN {
            errors += count;
        } else if SUCCESS_RANGE.contains(&code) {
            successes += count;
        }
    }
    let total = errors + successes;
    if total == 0 {
        0.0
    } else {
        errors as f64 / total as f64
    }
}
