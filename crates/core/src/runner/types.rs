//! Types for the runner module.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A single external program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    /// Program to execute (bare name or path).
    pub program: PathBuf,
    /// Arguments, in order. Paths are kept as-is, without UTF-8 conversion.
    pub args: Vec<OsString>,
    /// When set, stdout and stderr are both written to this file instead of
    /// being returned in [`CommandOutput::output`].
    pub output_log: Option<PathBuf>,
    /// Kill the process once this much time has passed.
    pub timeout: Option<Duration>,
}

impl CommandRequest {
    /// Create a request for the given program.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            output_log: None,
            timeout: None,
        }
    }

    /// Append a single argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(mut self, iter: impl IntoIterator<Item = impl Into<OsString>>) -> Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Send combined output to a log file.
    pub fn log_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_log = Some(path.into());
        self
    }

    /// Bound the execution time.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Short program name for messages.
    pub fn program_name(&self) -> String {
        program_name(&self.program)
    }

    /// Whether any argument equals `value`.
    pub fn has_arg(&self, value: &str) -> bool {
        self.args.iter().any(|a| a == value)
    }

    /// The argument following `flag`, if present.
    pub fn os_arg_after(&self, flag: &str) -> Option<&OsStr> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(OsString::as_os_str)
    }

    /// Like [`Self::os_arg_after`], for UTF-8 values.
    pub fn arg_after(&self, flag: &str) -> Option<&str> {
        self.os_arg_after(flag).and_then(OsStr::to_str)
    }
}

pub(crate) fn program_name(program: &Path) -> String {
    program
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| program.to_string_lossy().to_string())
}

/// Outcome of a process that was started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when the process was killed by a signal or timed out.
    pub exit_code: Option<i32>,
    /// Combined stdout and stderr. Empty when the request logged to a file.
    pub output: String,
    /// Whether the process was killed after exceeding its timeout.
    pub timed_out: bool,
}

impl CommandOutput {
    /// Whether the process exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0) && !self.timed_out
    }
}
