//! Post-processing of successful conversions.
//!
//! After the engine produced an output, the finalizer copies container
//! metadata from the source with exiftool, copies the source timestamps and
//! reports how the size changed. None of these steps can fail an item; each
//! problem is returned as a [`PostProcessingWarning`].

mod post_processor;
mod traits;
mod types;

pub use post_processor::PostProcessor;
pub use traits::Finalizer;
pub use types::{FinalizeReport, PostProcessingWarning, SizeReport};
