//! Process invocation for external tools.
//!
//! Every call to the transcoding engine or the metadata tool goes through the
//! [`CommandRunner`] trait, so the batch can be driven end to end against a
//! fake engine in tests (see [`crate::testing::MockRunner`]).
//!
//! # Example
//!
//! ```ignore
//! use reelpress_core::runner::{CommandRequest, CommandRunner, SystemRunner};
//!
//! let runner = SystemRunner::new();
//! let request = CommandRequest::new("ffmpeg")
//!     .arg("-version")
//!     .log_to("/tmp/ffmpeg-version.log");
//!
//! let output = runner.run(&request).await?;
//! assert!(output.success());
//! ```

mod error;
mod system;
mod traits;
mod types;

pub use error::RunnerError;
pub use system::SystemRunner;
pub use traits::CommandRunner;
pub use types::{CommandOutput, CommandRequest};
