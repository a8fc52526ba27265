//! Tokio-backed process runner.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::error::RunnerError;
use super::traits::CommandRunner;
use super::types::{CommandOutput, CommandRequest};

/// Runs requests as real child processes.
///
/// Children are killed when the waiting future is dropped, so cancelling a
/// batch (Ctrl-C) also stops the engine it was waiting on.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    fn name(&self) -> &str {
        "system"
    }

    async fn run(&self, request: &CommandRequest) -> Result<CommandOutput, RunnerError> {
        let program = request.program_name();

        let mut cmd = Command::new(&request.program);
        cmd.args(&request.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        match &request.output_log {
            Some(path) => {
                let log_error = |source| RunnerError::LogFile {
                    path: path.clone(),
                    source,
                };
                let file = tokio::fs::File::create(path)
                    .await
                    .map_err(log_error)?
                    .into_std()
                    .await;
                let stderr_file = file.try_clone().map_err(log_error)?;
                cmd.stdout(Stdio::from(file)).stderr(Stdio::from(stderr_file));
            }
            None => {
                cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
            }
        }

        debug!(program = %program, args = ?request.args, "Spawning process");

        let child = cmd.spawn().map_err(|source| RunnerError::Spawn {
            program: program.clone(),
            source,
        })?;

        let waited = match request.timeout {
            Some(limit) => match timeout(limit, child.wait_with_output()).await {
                Ok(result) => Some(result?),
                // The child is dropped with the future and killed by kill_on_drop.
                Err(_) => None,
            },
            None => Some(child.wait_with_output().await?),
        };

        let Some(output) = waited else {
            warn!(
                program = %program,
                timeout = ?request.timeout,
                "Process timed out and was killed"
            );
            if let Some(path) = &request.output_log {
                append_timeout_note(path, &program, request).await;
            }
            return Ok(CommandOutput {
                exit_code: None,
                output: String::new(),
                timed_out: true,
            });
        };

        let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        debug!(program = %program, status = %output.status, "Process exited");

        Ok(CommandOutput {
            exit_code: output.status.code(),
            output: combined,
            timed_out: false,
        })
    }
}

async fn append_timeout_note(path: &std::path::Path, program: &str, request: &CommandRequest) {
    let note = format!(
        "\n[reelpress] {} killed after exceeding the {}s timeout\n",
        program,
        request.timeout.map(|t| t.as_secs()).unwrap_or_default()
    );
    let file = tokio::fs::OpenOptions::new().append(true).open(path).await;
    if let Ok(mut file) = file {
        let _ = file.write_all(note.as_bytes()).await;
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn sh(script: &str) -> CommandRequest {
        CommandRequest::new("sh").arg("-c").arg(script)
    }

    #[tokio::test]
    async fn test_captures_combined_output() {
        let output = SystemRunner::new()
            .run(&sh("echo out; echo err 1>&2"))
            .await
            .unwrap();

        assert!(output.success());
        assert!(output.output.contains("out"));
        assert!(output.output.contains("err"));
    }

    #[tokio::test]
    async fn test_reports_exit_code() {
        let output = SystemRunner::new().run(&sh("exit 3")).await.unwrap();
        assert_eq!(output.exit_code, Some(3));
        assert!(!output.success());
    }

    #[tokio::test]
    async fn test_writes_log_file() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("job.log");

        let output = SystemRunner::new()
            .run(&sh("echo first; echo second 1>&2").log_to(&log))
            .await
            .unwrap();

        assert!(output.success());
        assert!(output.output.is_empty());
        let contents = std::fs::read_to_string(&log).unwrap();
        assert!(contents.contains("first"));
        assert!(contents.contains("second"));
    }

    #[tokio::test]
    async fn test_stdin_is_closed() {
        // `cat` exits immediately on a null stdin instead of waiting for input.
        let output = SystemRunner::new()
            .run(&CommandRequest::new("cat").timeout(Some(Duration::from_secs(5))))
            .await
            .unwrap();
        assert!(output.success());
    }

    #[tokio::test]
    async fn test_timeout_kills_process() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("slow.log");

        let output = SystemRunner::new()
            .run(
                &sh("sleep 10")
                    .log_to(&log)
                    .timeout(Some(Duration::from_millis(100))),
            )
            .await
            .unwrap();

        assert!(output.timed_out);
        assert_eq!(output.exit_code, None);
        let contents = std::fs::read_to_string(&log).unwrap();
        assert!(contents.contains("timeout"));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let result = SystemRunner::new()
            .run(&CommandRequest::new("nonexistent_tool_xyz_12345"))
            .await;
        let err = result.unwrap_err();
        assert!(err.is_not_found());
    }
}
