use async_trait::async_trait;

use super::types::FinalizeReport;
use crate::discovery::WorkItem;

/// Completes a successfully converted item.
#[async_trait]
pub trait Finalizer: Send + Sync {
    /// Runs every post-processing step for `item`.
    ///
    /// Only called once the output exists. Never fails; problems are reported
    /// as warnings in the returned report.
    async fn finalize(&self, item: &WorkItem) -> FinalizeReport;
}
