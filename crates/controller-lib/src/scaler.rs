//! Workload scaling actuation
//!
//! Issues the orchestrator's idempotent "set desired replica count"
//! command for the configured deployment. A failed actuation is reported
//! but never aborts the cycle; the observation still records the
//! attempted decision.

use crate::error::{ControllerError, Result};
use std::time::Duration;
use tokio::process::Command;
use tracing::info;

/// Applies scaling decisions through the orchestrator CLI.
#[derive(Debug, Clone)]
pub struct ScalingActuator {
    program: String,
    workload: String,
    namespace: String,
    timeout: Duration,
}

impl ScalingActuator {
    pub fn new(
        program: impl Into<String>,
        workload: impl Into<String>,
        namespace: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            program: program.into(),
            workload: workload.into(),
            namespace: namespace.into(),
            timeout,
        }
    }

    /// Set the desired replica count for the configured workload.
    ///
    /// Any non-zero exit, spawn error, or timeout is a scaling failure
    /// carrying the tool's stderr verbatim.
    pub async fn scale(&self, replicas: u32) -> Result<()> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("scale")
            .arg("deployment")
            .arg(&self.workload)
            .arg(format!("--replicas={}", replicas))
            .arg("-n")
            .arg(&self.namespace)
            .kill_on_drop(true);

        info!(
            workload = %self.workload,
            namespace = %self.namespace,
            replicas,
            "scaling workload"
        );

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                ControllerError::ScalingFailed(format!(
                    "{} timed out after {:?}",
                    self.program, self.timeout
                ))
            })?
            .map_err(|e| {
                ControllerError::ScalingFailed(format!("failed to spawn {}: {}", self.program, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ControllerError::ScalingFailed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}
