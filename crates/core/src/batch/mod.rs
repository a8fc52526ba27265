//! Batch driver.
//!
//! Runs every discovered item through conversion and post-processing, one at
//! a time, skipping items whose output already exists. Per-item failures are
//! recorded and never stop the batch; only problems with the directories
//! themselves end a run early.
//!
//! # Example
//!
//! ```ignore
//! use reelpress_core::batch::BatchProcessor;
//!
//! let (tx, mut rx) = tokio::sync::mpsc::channel(64);
//! let processor = BatchProcessor::new(run, plan, settings.batch, converter, finalizer)
//!     .with_progress(tx);
//!
//! let summary = processor.run().await?;
//! println!("{} succeeded, {} failed", summary.succeeded, summary.failed);
//! ```

mod error;
mod processor;
mod types;

pub use error::BatchError;
pub use processor::BatchProcessor;
pub use types::{BatchProgress, ItemOutcome, ItemRecord, RunSummary};
