//! Subprocess execution.

use async_trait::async_trait;

use crate::error::Result;

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; `None` when the process was killed by a signal.
    pub status: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Standard error with surrounding whitespace removed.
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

/// Runs a program to completion and captures both output streams.
///
/// Implementations must not inherit the daemon's stdin, and must return
/// `Ok` for any process that started, whatever its exit status. Only a
/// failure to spawn is an `Err`.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> Result<ProcessOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;

    mock! {
        Runner {}

        #[async_trait]
        impl ProcessRunner for Runner {
            async fn run(&self, program: &str, args: &[String]) -> Result<ProcessOutput>;
        }
    }

    #[test]
    fn test_output_helpers() {
        let output = ProcessOutput {
            status: Some(0),
            stdout: b"https://cdn.example/a\n".to_vec(),
            stderr: b"  \n".to_vec(),
        };
        assert!(output.success());
        assert_eq!(output.stdout_text(), "https://cdn.example/a\n");
        assert_eq!(output.stderr_text(), "");
    }

    #[test]
    fn test_signal_termination_is_not_success() {
        let output = ProcessOutput {
            status: None,
            ..Default::default()
        };
        assert!(!output.success());
    }

    #[core_async::test]
    async fn test_runner_is_object_safe() {
        let mut mock = MockRunner::new();
        mock.expect_run()
            .withf(|program, args| program == "tool" && args.len() == 1)
            .returning(|_, _| {
                Ok(ProcessOutput {
                    status: Some(0),
                    stdout: b"ok".to_vec(),
                    stderr: Vec::new(),
                })
            });

        let runner: Box<dyn ProcessRunner> = Box::new(mock);
        let output = runner.run("tool", &["--version".to_string()]).await.unwrap();
        assert_eq!(output.stdout_text(), "ok");
    }
}
