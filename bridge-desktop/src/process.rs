//! Subprocess runner backed by `tokio::process`.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    process::{ProcessOutput, ProcessRunner},
};
use core_async::process::{Command, Stdio};
use std::io::ErrorKind;
use tracing::{debug, instrument, warn};

/// Runs external programs without a shell.
///
/// The child is killed if the returned future is dropped, so cancelling a
/// resolution also terminates the tool.
#[derive(Debug, Default, Clone)]
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    #[instrument(skip(self, args), fields(arg_count = args.len()))]
    async fn run(&self, program: &str, args: &[String]) -> Result<ProcessOutput> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to spawn process");
                if e.kind() == ErrorKind::NotFound {
                    BridgeError::NotAvailable(format!("{program} was not found on PATH"))
                } else {
                    BridgeError::OperationFailed(format!("Failed to spawn {program}: {e}"))
                }
            })?;

        debug!(
            status = ?output.status.code(),
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            "Process finished"
        );

        Ok(ProcessOutput {
            status: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[core_async::test]
    async fn test_captures_stdout_and_status() {
        let runner = TokioProcessRunner::new();
        let output = runner.run("sh", &sh("echo hello")).await.unwrap();

        assert!(output.success());
        assert_eq!(output.stdout_text(), "hello\n");
        assert!(output.stderr.is_empty());
    }

    #[core_async::test]
    async fn test_nonzero_exit_is_not_an_error() {
        let runner = TokioProcessRunner::new();
        let output = runner
            .run("sh", &sh("echo 'ERROR: private video' 1>&2; exit 1"))
            .await
            .unwrap();

        assert_eq!(output.status, Some(1));
        assert_eq!(output.stderr_text(), "ERROR: private video");
    }

    #[core_async::test]
    async fn test_missing_program_is_not_available() {
        let runner = TokioProcessRunner::new();
        let err = runner
            .run("definitely-not-a-real-program-4821", &[])
            .await
            .unwrap_err();

        assert!(matches!(err, BridgeError::NotAvailable(_)));
    }
}
