//! Synthetic load generation
//!
//! Invokes the external load-generator binary for one test case and
//! captures its stdout report. Report parsing lives in [`parser`].

pub mod parser;

use crate::error::{ControllerError, Result};
use crate::models::TestCase;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Runs the load-generator command against the target URL.
#[derive(Debug, Clone)]
pub struct LoadGenerator {
    program: String,
    target_url: String,
    timeout: Duration,
}

impl LoadGenerator {
    pub fn new(
        program: impl Into<String>,
        target_url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            program: program.into(),
            target_url: target_url.into(),
            timeout,
        }
    }

    /// Run one trial and return the raw report text.
    ///
    /// A spawn error, non-zero exit, or timeout is a generation failure;
    /// the tool's stderr is passed through verbatim.
    pub async fn run(&self, case: &TestCase) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-n")
            .arg(case.requests.to_string())
            .arg("-c")
            .arg(case.concurrency.to_string())
            .arg(&self.target_url)
            .kill_on_drop(true);

        debug!(
            program = %self.program,
            requests = case.requests,
            concurrency = case.concurrency,
            "invoking load generator"
        );

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                ControllerError::Generation(format!(
                    "{} timed out after {:?}",
                    self.program, self.timeout
                ))
            })?
            .map_err(|e| {
                ControllerError::Generation(format!("failed to spawn {}: {}", self.program, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ControllerError::Generation(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    fn fake_generator(dir: &Path, body: &str) -> String {
        let path = dir.join("fake-hey");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "#!/bin/sh").unwrap();
        writeln!(file, "{}", body).unwrap();
        let mut perms = file.metadata().unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn test_captures_stdout_report() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_generator(dir.path(), "printf 'Requests/sec:\\t120.5\\n'");
        let generator = LoadGenerator::new(program, "http://localhost:8080", Duration::from_secs(5));

        let case = TestCase { requests: 500, concurrency: 10 };
        let report = generator.run(&case).await.unwrap();
        assert!(report.contains("Requests/sec:"));
    }

    #[tokio::test]
    async fn test_arguments_follow_tool_contract() {
        let dir = tempfile::tempdir().unwrap();
        // Echo the arguments back so the report is the argv we were given.
        // Use printf rather than echo: a leading `-n` argument would be
        // swallowed by echo's no-newline flag under /bin/sh (dash).
        let program = fake_generator(dir.path(), "printf '%s\\n' \"$*\"");
        let generator = LoadGenerator::new(program, "http://svc/fn", Duration::from_secs(5));

        let case = TestCase { requests: 1500, concurrency: 30 };
        let report = generator.run(&case).await.unwrap();
        assert_eq!(report.trim(), "-n 1500 -c 30 http://svc/fn");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_generation_failure() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_generator(dir.path(), "echo 'connection refused' >&2\nexit 3");
        let generator = LoadGenerator::new(program, "http://localhost:8080", Duration::from_secs(5));

        let case = TestCase { requests: 10, concurrency: 1 };
        let err = generator.run(&case).await.unwrap_err();
        match err {
            ControllerError::Generation(msg) => {
                assert!(msg.contains("connection refused"), "stderr not surfaced: {}", msg);
            }
            other => panic!("expected Generation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_binary_is_generation_failure() {
        let generator = LoadGenerator::new(
            "/nonexistent/load-generator",
            "http://localhost:8080",
            Duration::from_secs(5),
        );
        let case = TestCase { requests: 10, concurrency: 1 };
        assert!(matches!(
            generator.run(&case).await,
            Err(ControllerError::Generation(_))
        ));
    }

    #[tokio::test]
    async fn test_slow_tool_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_generator(dir.path(), "sleep 5");
        let generator =
            LoadGenerator::new(program, "http://localhost:8080", Duration::from_millis(100));

        let case = TestCase { requests: 10, concurrency: 1 };
        let err = generator.run(&case).await.unwrap_err();
        match err {
            ControllerError::Generation(msg) => assert!(msg.contains("timed out")),
            other => panic!("expected Generation, got {:?}", other),
        }
    }
}
