//! Trait definitions for the converter module.

use async_trait::async_trait;

use super::error::ConverterError;
use super::types::{ConversionResult, EncodingMode};
use crate::discovery::WorkItem;
use crate::planner::ResourcePlan;

/// A converter that transcodes one work item at a time.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Returns the name of this converter implementation.
    fn name(&self) -> &str;

    /// Converts a work item, writing the engine log to `item.log`.
    ///
    /// Never fails: problems are reported through the result's status so
    /// the batch can move on to the next item.
    async fn convert(
        &self,
        item: &WorkItem,
        plan: &ResourcePlan,
        mode: EncodingMode,
    ) -> ConversionResult;

    /// Validates that the engine is present and supports the encoding mode.
    async fn validate(&self, mode: EncodingMode) -> Result<(), ConverterError>;
}
