//! Core data models for the replica controller

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Structured metrics extracted from one load-generator report.
///
/// Never partial: rate, size, and every tracked percentile are present,
/// defaulting to zero when the report text did not contain them. The
/// concurrency level is the controlled parameter of the test case and is
/// supplied by the caller, never parsed from the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub requests_per_sec: f64,
    /// Mean response size in bytes.
    pub size_per_request: f64,
    pub concurrency: u32,
    pub latency_p10: f64,
    pub latency_p50: f64,
    pub latency_p75: f64,
    pub latency_p90: f64,
    pub latency_p99: f64,
    /// Response counts keyed by status code; absent codes mean zero.
    pub status_counts: BTreeMap<u16, u64>,
}

impl MetricsRecord {
    /// An all-zero record for the given concurrency level.
    pub fn empty(concurrency: u32) -> Self {
        Self {
            requests_per_sec: 0.0,
            size_per_request: 0.0,
            concurrency,
            latency_p10: 0.0,
            latency_p50: 0.0,
            latency_p75: 0.0,
            latency_p90: 0.0,
            latency_p99: 0.0,
            status_counts: BTreeMap::new(),
        }
    }

    /// Count of responses observed for a status code.
    pub fn status_count(&self, code: u16) -> u64 {
        self.status_counts.get(&code).copied().unwrap_or(0)
    }
}

/// The ordered feature contract consumed by the prediction service.
///
/// Field order matches model training and must never be permuted: serde
/// serializes struct fields in declaration order, so this layout IS the
/// wire contract. All nine values are finite once validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    #[serde(rename = "Requests/sec")]
    pub requests_per_sec: f64,
    #[serde(rename = "Size/request")]
    pub size_per_request: f64,
    #[serde(rename = "Concurrent requests")]
    pub concurrent_requests: f64,
    #[serde(rename = "10th percentile")]
    pub latency_p10: f64,
    #[serde(rename = "50th percentile")]
    pub latency_p50: f64,
    #[serde(rename = "75th percentile")]
    pub latency_p75: f64,
    #[serde(rename = "90th percentile")]
    pub latency_p90: f64,
    #[serde(rename = "99th percentile")]
    pub latency_p99: f64,
    pub error_rate: f64,
}

impl FeatureVector {
    /// Wire field names in contract order.
    pub const FIELD_NAMES: [&'static str; 9] = [
        "Requests/sec",
        "Size/request",
        "Concurrent requests",
        "10th percentile",
        "50th percentile",
        "75th percentile",
        "90th percentile",
        "99th percentile",
        "error_rate",
    ];

    /// Ordered (name, value) pairs matching the wire contract. The
    /// observation log derives its columns from this, so the file and the
    /// wire can never disagree on ordering.
    pub fn fields(&self) -> [(&'static str, f64); 9] {
        [
            ("Requests/sec", self.requests_per_sec),
            ("Size/request", self.size_per_request),
            ("Concurrent requests", self.concurrent_requests),
            ("10th percentile", self.latency_p10),
            ("50th percentile", self.latency_p50),
            ("75th percentile", self.latency_p75),
            ("90th percentile", self.latency_p90),
            ("99th percentile", self.latency_p99),
            ("error_rate", self.error_rate),
        ]
    }
}

/// A target replica count, always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalingDecision(u32);

impl ScalingDecision {
    /// Round half away from zero, then clamp to a minimum of one replica.
    pub fn from_raw(raw: f64) -> Self {
        let rounded = raw.round();
        if rounded >= 1.0 {
            Self(rounded as u32)
        } else {
            Self(1)
        }
    }

    pub fn replicas(&self) -> u32 {
        self.0
    }
}

/// One durable row per cycle: feature fields, decision, timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationRecord {
    pub features: FeatureVector,
    pub replicas: u32,
    /// RFC 3339 timestamp taken at record creation.
    pub timestamp: String,
}

impl ObservationRecord {
    pub fn new(features: FeatureVector, decision: ScalingDecision) -> Self {
        Self {
            features,
            replicas: decision.replicas(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    /// Ordered (column, value) pairs; the store's header row is derived
    /// from the first record's columns.
    pub fn columns(&self) -> Vec<(&'static str, String)> {
        let mut cols: Vec<(&'static str, String)> = self
            .features
            .fields()
            .iter()
            .map(|(name, value)| (*name, value.to_string()))
            .collect();
        cols.push(("replicas", self.replicas.to_string()));
        cols.push(("timestamp", self.timestamp.clone()));
        cols
    }
}

/// One load-generation trial: total requests at a concurrency level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub requests: u64,
    pub concurrency: u32,
}
