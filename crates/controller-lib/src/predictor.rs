//! Prediction service client
//!
//! Sends the ordered feature vector to the external predictor over HTTP
//! and validates the returned replica count. Transient failures are
//! retried with bounded doubling backoff; once the attempt budget is
//! spent the cycle is abandoned rather than scaling on a guess.

use crate::error::{ControllerError, Result};
use crate::models::{FeatureVector, ScalingDecision};
use anyhow::Context;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Retry discipline for prediction calls.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    pub attempts: u32,
    /// Delay before the second attempt; doubles per attempt afterwards.
    pub initial_backoff: Duration,
    /// Backoff ceiling.
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

/// Success body: the predicted replica count.
#[derive(Debug, Deserialize)]
struct PredictResponse {
    replicas: Option<f64>,
}

/// Failure body on non-success status.
#[derive(Debug, Deserialize)]
struct PredictErrorBody {
    error: Option<String>,
}

/// HTTP client for the external prediction service.
pub struct PredictorClient {
    client: Client,
    predict_url: Url,
    retry: RetryConfig,
}

impl PredictorClient {
    /// Create a client for the service at `endpoint`.
    pub fn new(endpoint: &str, timeout: Duration, retry: RetryConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        let base = Url::parse(endpoint).context("Invalid predictor URL")?;
        let predict_url = base.join("predict").context("Invalid predictor URL")?;

        Ok(Self {
            client,
            predict_url,
            retry,
        })
    }

    /// Request a replica count for one feature vector.
    ///
    /// Retries transient failures up to the configured attempt budget;
    /// the last error is returned once the budget runs out.
    pub async fn predict(&self, vector: &FeatureVector) -> Result<ScalingDecision> {
        let mut backoff = self.retry.initial_backoff;
        let mut last_err = None;

        for attempt in 1..=self.retry.attempts {
            match self.predict_once(vector).await {
                Ok(decision) => {
                    if attempt > 1 {
                        debug!(attempt, "prediction succeeded after retry");
                    }
                    return Ok(decision);
                }
                Err(e) if e.is_retryable() => {
                    warn!(
                        attempt,
                        attempts = self.retry.attempts,
                        error = %e,
                        "prediction attempt failed"
                    );
                    last_err = Some(e);
                    if attempt < self.retry.attempts {
                        tokio::time::sleep(backoff).await;
                        backoff = (backoff * 2).min(self.retry.max_backoff);
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or_else(|| {
            ControllerError::PredictionUnavailable("no prediction attempts configured".into())
        }))
    }

    async fn predict_once(&self, vector: &FeatureVector) -> Result<ScalingDecision> {
        let response = self
            .client
            .post(self.predict_url.clone())
            .json(vector)
            .send()
            .await
            .map_err(|e| ControllerError::PredictionUnavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ControllerError::PredictionUnavailable(e.to_string()))?;

        if !status.is_success() {
            // The service reports failures as {"error": "..."}; surface
            // that diagnostic verbatim.
            let detail = serde_json::from_str::<PredictErrorBody>(&body)
                .ok()
                .and_then(|parsed| parsed.error)
                .unwrap_or(body);
            return Err(ControllerError::PredictionUnavailable(format!(
                "{}: {}",
                status, detail
            )));
        }

        let parsed: PredictResponse = serde_json::from_str(&body).map_err(|_| {
            ControllerError::PredictionMalformed(format!("unexpected response body: {}", body))
        })?;
        let raw = parsed.replicas.ok_or_else(|| {
            ControllerError::PredictionMalformed(format!("missing replicas field: {}", body))
        })?;
        if !raw.is_finite() {
            return Err(ControllerError::PredictionMalformed(format!(
                "non-finite replica count: {}",
                raw
            )));
        }

        let decision = ScalingDecision::from_raw(raw);
        debug!(raw, replicas = decision.replicas(), "prediction received");
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_vector() -> FeatureVector {
        FeatureVector {
            requests_per_sec: 120.5,
            size_per_request: 512.0,
            concurrent_requests: 20.0,
            latency_p10: 0.003,
            latency_p50: 0.012,
            latency_p75: 0.02,
            latency_p90: 0.1,
            latency_p99: 0.25,
            error_rate: 0.05,
        }
    }

    fn no_retry() -> RetryConfig {
        RetryConfig {
            attempts: 1,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_rounds_and_clamps_replicas() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/predict")
            .match_header("content-type", "application/json")
            .with_status(200)
            .with_body(r#"{"replicas": 2.6}"#)
            .create_async()
            .await;

        let client =
            PredictorClient::new(&server.url(), Duration::from_secs(5), no_retry()).unwrap();
        let decision = client.predict(&sample_vector()).await.unwrap();
        assert_eq!(decision.replicas(), 3);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_sub_one_prediction_clamps_to_one() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/predict")
            .with_status(200)
            .with_body(r#"{"replicas": 0.4}"#)
            .create_async()
            .await;

        let client =
            PredictorClient::new(&server.url(), Duration::from_secs(5), no_retry()).unwrap();
        let decision = client.predict(&sample_vector()).await.unwrap();
        assert_eq!(decision.replicas(), 1);
    }

    #[tokio::test]
    async fn test_request_body_uses_wire_field_names() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/predict")
            .match_body(mockito::Matcher::AllOf(vec![
                mockito::Matcher::Regex(r#""Requests/sec":120\.5"#.into()),
                mockito::Matcher::Regex(r#""Concurrent requests":20\.0"#.into()),
                mockito::Matcher::Regex(r#""99th percentile":0\.25"#.into()),
                mockito::Matcher::Regex(r#""error_rate":0\.05"#.into()),
            ]))
            .with_status(200)
            .with_body(r#"{"replicas": 1}"#)
            .create_async()
            .await;

        let client =
            PredictorClient::new(&server.url(), Duration::from_secs(5), no_retry()).unwrap();
        client.predict(&sample_vector()).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_body_surfaced_on_failure_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/predict")
            .with_status(400)
            .with_body(r#"{"error": "feature mismatch"}"#)
            .create_async()
            .await;

        let client =
            PredictorClient::new(&server.url(), Duration::from_secs(5), no_retry()).unwrap();
        let err = client.predict(&sample_vector()).await.unwrap_err();
        match err {
            ControllerError::PredictionUnavailable(msg) => {
                assert!(msg.contains("feature mismatch"), "diagnostic lost: {}", msg);
            }
            other => panic!("expected PredictionUnavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_replicas_field_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/predict")
            .with_status(200)
            .with_body(r#"{"confidence": 0.9}"#)
            .create_async()
            .await;

        let client =
            PredictorClient::new(&server.url(), Duration::from_secs(5), no_retry()).unwrap();
        let err = client.predict(&sample_vector()).await.unwrap_err();
        assert!(matches!(err, ControllerError::PredictionMalformed(_)));
    }

    #[tokio::test]
    async fn test_non_json_body_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/predict")
            .with_status(200)
            .with_body("<html>oops</html>")
            .create_async()
            .await;

        let client =
            PredictorClient::new(&server.url(), Duration::from_secs(5), no_retry()).unwrap();
        let err = client.predict(&sample_vector()).await.unwrap_err();
        assert!(matches!(err, ControllerError::PredictionMalformed(_)));
    }

    #[tokio::test]
    async fn test_retries_stop_at_attempt_budget() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/predict")
            .with_status(503)
            .with_body(r#"{"error": "model loading"}"#)
            .expect(3)
            .create_async()
            .await;

        let retry = RetryConfig {
            attempts: 3,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(4),
        };
        let client = PredictorClient::new(&server.url(), Duration::from_secs(5), retry).unwrap();
        let err = client.predict(&sample_vector()).await.unwrap_err();
        assert!(matches!(err, ControllerError::PredictionUnavailable(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_service_is_unavailable() {
        // Nothing listens on this port.
        let client = PredictorClient::new(
            "http://127.0.0.1:9",
            Duration::from_millis(200),
            no_retry(),
        )
        .unwrap();
        let err = client.predict(&sample_vector()).await.unwrap_err();
        assert!(matches!(err, ControllerError::PredictionUnavailable(_)));
    }
}
