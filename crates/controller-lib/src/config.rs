//! Controller configuration
//!
//! One value constructed at startup and passed by reference through the
//! control loop; nothing reads ambient global state, so independent loop
//! instances and test harnesses can each carry their own configuration.

use crate::models::TestCase;
use crate::predictor::RetryConfig;
use serde::Deserialize;
use std::time::Duration;

/// Controller configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ControllerConfig {
    /// URL the load generator drives.
    #[serde(default = "default_target_url")]
    pub target_url: String,

    /// Deployment to scale.
    #[serde(default = "default_workload")]
    pub workload: String,

    /// Namespace of the scaled deployment.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Prediction service base address.
    #[serde(default = "default_predictor_url")]
    pub predictor_url: String,

    /// Observation log path.
    #[serde(default = "default_log_path")]
    pub log_path: String,

    /// Explicit test-case schedule, run in order.
    #[serde(default = "default_test_cases")]
    pub test_cases: Vec<TestCase>,

    /// Candidate request counts for a sweep; crossed with
    /// `sweep_concurrency` and appended after `test_cases`.
    #[serde(default)]
    pub sweep_requests: Vec<u64>,

    /// Candidate concurrency levels for a sweep.
    #[serde(default)]
    pub sweep_concurrency: Vec<u32>,

    /// Delay between cycles, letting the scaled workload stabilize
    /// before the next measurement.
    #[serde(default = "default_pace_secs")]
    pub pace_secs: u64,

    /// Prediction attempts per cycle, including the first.
    #[serde(default = "default_predict_attempts")]
    pub predict_attempts: u32,

    /// Delay before the second prediction attempt, in milliseconds;
    /// doubles per attempt up to the maximum.
    #[serde(default = "default_predict_backoff_ms")]
    pub predict_backoff_ms: u64,

    /// Prediction backoff ceiling, in milliseconds.
    #[serde(default = "default_predict_backoff_max_ms")]
    pub predict_backoff_max_ms: u64,

    /// Load-generation timeout, in seconds.
    #[serde(default = "default_generate_timeout_secs")]
    pub generate_timeout_secs: u64,

    /// Per-attempt prediction request timeout, in seconds.
    #[serde(default = "default_predict_timeout_secs")]
    pub predict_timeout_secs: u64,

    /// Scale-command timeout, in seconds.
    #[serde(default = "default_scale_timeout_secs")]
    pub scale_timeout_secs: u64,

    /// Load-generator binary.
    #[serde(default = "default_loadgen_bin")]
    pub loadgen_bin: String,

    /// Orchestrator CLI binary.
    #[serde(default = "default_orchestrator_bin")]
    pub orchestrator_bin: String,
}

fn default_target_url() -> String {
    "http://127.0.0.1:31112/function/hello".to_string()
}

fn default_workload() -> String {
    "hello".to_string()
}

fn default_namespace() -> String {
    "openfaas-fn".to_string()
}

fn default_predictor_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_log_path() -> String {
    "log.csv".to_string()
}

fn default_test_cases() -> Vec<TestCase> {
    vec![
        TestCase { requests: 500, concurrency: 10 },
        TestCase { requests: 1000, concurrency: 20 },
        TestCase { requests: 1500, concurrency: 30 },
        TestCase { requests: 2000, concurrency: 40 },
        TestCase { requests: 2500, concurrency: 50 },
    ]
}

fn default_pace_secs() -> u64 {
    30
}

fn default_predict_attempts() -> u32 {
    3
}

fn default_predict_backoff_ms() -> u64 {
    1000
}

fn default_predict_backoff_max_ms() -> u64 {
    30_000
}

fn default_generate_timeout_secs() -> u64 {
    300
}

fn default_predict_timeout_secs() -> u64 {
    10
}

fn default_scale_timeout_secs() -> u64 {
    30
}

fn default_loadgen_bin() -> String {
    "hey".to_string()
}

fn default_orchestrator_bin() -> String {
    "kubectl".to_string()
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            target_url: default_target_url(),
            workload: default_workload(),
            namespace: default_namespace(),
            predictor_url: default_predictor_url(),
            log_path: default_log_path(),
            test_cases: default_test_cases(),
            sweep_requests: Vec::new(),
            sweep_concurrency: Vec::new(),
            pace_secs: default_pace_secs(),
            predict_attempts: default_predict_attempts(),
            predict_backoff_ms: default_predict_backoff_ms(),
            predict_backoff_max_ms: default_predict_backoff_max_ms(),
            generate_timeout_secs: default_generate_timeout_secs(),
            predict_timeout_secs: default_predict_timeout_secs(),
            scale_timeout_secs: default_scale_timeout_secs(),
            loadgen_bin: default_loadgen_bin(),
            orchestrator_bin: default_orchestrator_bin(),
        }
    }
}

impl ControllerConfig {
    /// Full ordered schedule: explicit cases, then the row-major cross
    /// product of the sweep sequences.
    pub fn schedule(&self) -> Vec<TestCase> {
        let mut cases = self.test_cases.clone();
        for &requests in &self.sweep_requests {
            for &concurrency in &self.sweep_concurrency {
                cases.push(TestCase { requests, concurrency });
            }
        }
        cases
    }

    pub fn pace(&self) -> Duration {
        Duration::from_secs(self.pace_secs)
    }

    pub fn generate_timeout(&self) -> Duration {
        Duration::from_secs(self.generate_timeout_secs)
    }

    pub fn predict_timeout(&self) -> Duration {
        Duration::from_secs(self.predict_timeout_secs)
    }

    pub fn scale_timeout(&self) -> Duration {
        Duration::from_secs(self.scale_timeout_secs)
    }

    pub fn retry(&self) -> RetryConfig {
        RetryConfig {
            attempts: self.predict_attempts,
            initial_backoff: Duration::from_millis(self.predict_backoff_ms),
            max_backoff: Duration::from_millis(self.predict_backoff_max_ms),
        }
    }

    /// Reject configurations the loop cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.schedule().is_empty() {
            anyhow::bail!("no test cases configured: set test_cases or both sweep sequences");
        }
        if self.predict_attempts == 0 {
            anyhow::bail!("predict_attempts must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ControllerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.schedule().len(), 5);
        assert_eq!(config.pace(), Duration::from_secs(30));
    }

    #[test]
    fn test_schedule_appends_row_major_cross_product() {
        let config = ControllerConfig {
            test_cases: vec![TestCase { requests: 100, concurrency: 1 }],
            sweep_requests: vec![400, 800],
            sweep_concurrency: vec![10, 20],
            ..ControllerConfig::default()
        };
        let schedule = config.schedule();
        assert_eq!(
            schedule,
            vec![
                TestCase { requests: 100, concurrency: 1 },
                TestCase { requests: 400, concurrency: 10 },
                TestCase { requests: 400, concurrency: 20 },
                TestCase { requests: 800, concurrency: 10 },
                TestCase { requests: 800, concurrency: 20 },
            ]
        );
    }

    #[test]
    fn test_empty_schedule_is_rejected() {
        let config = ControllerConfig {
            test_cases: Vec::new(),
            ..ControllerConfig::default()
        };
        assert!(config.validate().is_err());

        // A sweep alone is a valid schedule.
        let config = ControllerConfig {
            test_cases: Vec::new(),
            sweep_requests: vec![400],
            sweep_concurrency: vec![10],
            ..ControllerConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_attempts_is_rejected() {
        let config = ControllerConfig {
            predict_attempts: 0,
            ..ControllerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserializes_with_partial_input() {
        let config: ControllerConfig =
            serde_json::from_str(r#"{"workload": "billing", "pace_secs": 5}"#).unwrap();
        assert_eq!(config.workload, "billing");
        assert_eq!(config.pace_secs, 5);
        assert_eq!(config.namespace, "openfaas-fn");
        assert_eq!(config.predict_attempts, 3);
    }
}
