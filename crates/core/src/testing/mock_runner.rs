//! Mock command runner acting as a fake engine.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::runner::{CommandOutput, CommandRequest, CommandRunner, RunnerError};

const DEFAULT_ENCODERS: &[&str] = &["libx264", "libx265", "hevc_videotoolbox", "aac"];

/// Mock implementation of the CommandRunner trait.
///
/// Behaves like the external tools closely enough to drive a whole batch:
/// - `ffmpeg -encoders` prints an encoder listing
/// - `exiftool` exits with a configurable code
/// - any other invocation is treated as a conversion: it writes a log and an
///   output file at the last argument
///
/// Individual sources can be made to fail or to "succeed" without output.
///
/// # Example
///
/// ```rust,ignore
/// use reelpress_core::testing::MockRunner;
///
/// let runner = MockRunner::new();
/// runner.fail_source("corrupt.mov").await;
///
/// // Drive a batch...
///
/// assert_eq!(runner.engine_invocations().await, 3);
/// ```
#[derive(Debug)]
pub struct MockRunner {
    /// Every request received, in order.
    requests: Arc<RwLock<Vec<CommandRequest>>>,
    /// Source file names whose conversion exits with code 1.
    failing_sources: Arc<RwLock<HashSet<String>>>,
    /// Source file names whose conversion writes part of the output, then exits 1.
    partial_output_sources: Arc<RwLock<HashSet<String>>>,
    /// Source file names whose conversion exits 0 without writing output.
    missing_output_sources: Arc<RwLock<HashSet<String>>>,
    /// Size of written outputs. Defaults to 40% of the source.
    output_bytes: Arc<RwLock<Option<u64>>>,
    /// Encoders reported by `-encoders`.
    encoders: Arc<RwLock<Vec<String>>>,
    /// Exit code for exiftool invocations.
    metadata_exit_code: Arc<RwLock<i32>>,
    /// Program names that fail to spawn.
    unavailable: Arc<RwLock<HashSet<String>>>,
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRunner {
    /// Create a new mock runner where everything succeeds.
    pub fn new() -> Self {
        Self {
            requests: Arc::new(RwLock::new(Vec::new())),
            failing_sources: Arc::new(RwLock::new(HashSet::new())),
            partial_output_sources: Arc::new(RwLock::new(HashSet::new())),
            missing_output_sources: Arc::new(RwLock::new(HashSet::new())),
            output_bytes: Arc::new(RwLock::new(None)),
            encoders: Arc::new(RwLock::new(
                DEFAULT_ENCODERS.iter().map(|e| e.to_string()).collect(),
            )),
            metadata_exit_code: Arc::new(RwLock::new(0)),
            unavailable: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Get all recorded requests.
    pub async fn requests(&self) -> Vec<CommandRequest> {
        self.requests.read().await.clone()
    }

    /// Get recorded requests for one program name.
    pub async fn requests_for(&self, program: &str) -> Vec<CommandRequest> {
        self.requests
            .read()
            .await
            .iter()
            .filter(|r| r.program_name() == program)
            .cloned()
            .collect()
    }

    /// Number of conversion runs (excluding encoder listings).
    pub async fn engine_invocations(&self) -> usize {
        self.requests
            .read()
            .await
            .iter()
            .filter(|r| r.program_name() != "exiftool" && !r.has_arg("-encoders"))
            .count()
    }

    /// Make the conversion of `file_name` exit with code 1.
    pub async fn fail_source(&self, file_name: &str) {
        self.failing_sources
            .write()
            .await
            .insert(file_name.to_string());
    }

    /// Make the conversion of `file_name` write a truncated output, then exit 1.
    pub async fn fail_source_with_partial_output(&self, file_name: &str) {
        self.partial_output_sources
            .write()
            .await
            .insert(file_name.to_string());
    }

    /// Make the conversion of `file_name` exit 0 without producing output.
    pub async fn skip_output_for(&self, file_name: &str) {
        self.missing_output_sources
            .write()
            .await
            .insert(file_name.to_string());
    }

    /// Let every source convert normally again.
    pub async fn clear_failures(&self) {
        self.failing_sources.write().await.clear();
        self.partial_output_sources.write().await.clear();
        self.missing_output_sources.write().await.clear();
    }

    /// Set a fixed size for written outputs.
    pub async fn set_output_bytes(&self, bytes: u64) {
        *self.output_bytes.write().await = Some(bytes);
    }

    /// Replace the encoder listing.
    pub async fn set_encoders(&self, encoders: &[&str]) {
        *self.encoders.write().await = encoders.iter().map(|e| e.to_string()).collect();
    }

    /// Set the exit code returned by exiftool.
    pub async fn set_metadata_exit_code(&self, code: i32) {
        *self.metadata_exit_code.write().await = code;
    }

    /// Make a program fail to spawn as if it were not installed.
    pub async fn remove_program(&self, program: &str) {
        self.unavailable.write().await.insert(program.to_string());
    }

    async fn encoder_listing(&self) -> CommandOutput {
        let mut listing = String::from(
            "Encoders:\n V..... = Video\n A..... = Audio\n S..... = Subtitle\n \
             .F.... = Frame-level multithreading\n ------\n",
        );
        for encoder in self.encoders.read().await.iter() {
            let kind = if encoder == "aac" { 'A' } else { 'V' };
            listing.push_str(&format!(" {kind}....D {encoder:<20} mock encoder\n"));
        }

        CommandOutput {
            exit_code: Some(0),
            output: listing,
            timed_out: false,
        }
    }

    async fn metadata_copy(&self) -> CommandOutput {
        let code = *self.metadata_exit_code.read().await;
        let output = if code == 0 {
            "    1 image files updated\n".to_string()
        } else {
            "Error: Mock metadata failure\n".to_string()
        };

        CommandOutput {
            exit_code: Some(code),
            output,
            timed_out: false,
        }
    }

    async fn convert(&self, request: &CommandRequest) -> Result<CommandOutput, RunnerError> {
        let source = request
            .os_arg_after("-i")
            .map(PathBuf::from)
            .unwrap_or_default();
        let output = request.args.last().map(PathBuf::from).unwrap_or_default();
        let name = file_name(&source);

        let mut log = format!(
            "ffmpeg version mock\nInput #0, mov,mp4,m4a,3gp,3g2,mj2, from '{}':\n",
            source.display()
        );
        for frame in 1..=25 {
            log.push_str(&format!("frame={frame:5} fps= 30 q=28.0 size={}kB\r", frame * 64));
        }
        log.push('\n');

        let exit_code = if self.partial_output_sources.read().await.contains(&name) {
            tokio::fs::write(&output, b"partial").await?;
            log.push_str("Conversion failed!\n");
            1
        } else if self.failing_sources.read().await.contains(&name) {
            log.push_str(&format!(
                "{}: Invalid data found when processing input\n",
                source.display()
            ));
            1
        } else if self.missing_output_sources.read().await.contains(&name) {
            0
        } else {
            let bytes = match *self.output_bytes.read().await {
                Some(bytes) => bytes,
                None => tokio::fs::metadata(&source)
                    .await
                    .map(|m| m.len() * 4 / 10)
                    .unwrap_or(0),
            };
            tokio::fs::write(&output, vec![0u8; bytes as usize]).await?;
            log.push_str("video:1000kB audio:100kB subtitle:0kB other streams:0kB\n");
            0
        };

        match &request.output_log {
            Some(path) => {
                tokio::fs::write(path, &log)
                    .await
                    .map_err(|source| RunnerError::LogFile {
                        path: path.clone(),
                        source,
                    })?;
                Ok(CommandOutput {
                    exit_code: Some(exit_code),
                    output: String::new(),
                    timed_out: false,
                })
            }
            None => Ok(CommandOutput {
                exit_code: Some(exit_code),
                output: log,
                timed_out: false,
            }),
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[async_trait]
impl CommandRunner for MockRunner {
    fn name(&self) -> &str {
        "mock"
    }

    async fn run(&self, request: &CommandRequest) -> Result<CommandOutput, RunnerError> {
        self.requests.write().await.push(request.clone());

        let program = request.program_name();
        if self.unavailable.read().await.contains(&program) {
            return Err(RunnerError::Spawn {
                program,
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "No such file or directory",
                ),
            });
        }

        if request.has_arg("-encoders") {
            Ok(self.encoder_listing().await)
        } else if program == "exiftool" {
            Ok(self.metadata_copy().await)
        } else {
            self.convert(request).await
        }
    }
}
