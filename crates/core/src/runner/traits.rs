//! Trait definitions for the runner module.

use async_trait::async_trait;

use super::error::RunnerError;
use super::types::{CommandOutput, CommandRequest};

/// Capability to run an external program to completion.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Returns the name of this runner implementation.
    fn name(&self) -> &str;

    /// Runs the request and waits for it to exit.
    ///
    /// Stdin is never attached. A non-zero exit is reported in the output,
    /// not as an error.
    async fn run(&self, request: &CommandRequest) -> Result<CommandOutput, RunnerError>;
}
