//! # relief-process
//!
//! **Purpose**: Supervision of the external build pipeline (make + GDAL) that
//! renders hillshade, color relief and contour rasters.
//!
//! ## Features
//!
//! - **Single build slot**: at most one build runs at a time; a second start
//!   fails fast with `AlreadyRunning` instead of queueing
//! - **Session state machine**: `pending -> running -> {succeeded, failed, cancelled}`
//!   with absorbing terminal states
//! - **Output streaming**: stdout/stderr delivered line by line, in order,
//!   always before the finished notification
//! - **Event-loop delivery**: observers run only when the owner dispatches
//!   events, never from a background task
//! - **Cancellation**: SIGTERM to the process group, bounded grace period,
//!   then SIGKILL
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! use std::path::Path;
//! use relief_process::{BuildSupervisor, BuildTarget};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut supervisor = BuildSupervisor::default();
//! supervisor.on_output(|_, chunk| print!("{}", chunk.text));
//!
//! let target = BuildTarget::make("make", "relief");
//! supervisor.start(&target, &HashMap::new(), Path::new("/data/alps"))?;
//!
//! if let Some(outcome) = supervisor.wait().await {
//!     println!("{} -> {}", outcome.target, outcome.status);
//! }
//! # Ok(())
//! # }
//! ```

pub mod child;
pub mod config;
pub mod error;
pub mod manager;
mod output;
pub mod session;
pub mod supervisor;
pub mod target;

pub use child::ManagedChild;
pub use config::{ProcessConfig, SupervisorConfig};
pub use error::{ProcessError, Result};
pub use manager::ProcessManager;
pub use session::{
    trim_front, BuildOutcome, BuildSession, OutputChunk, OutputStream, SessionId, SessionStatus,
    SupervisorEvent, MAX_OUTPUT_BYTES,
};
pub use supervisor::BuildSupervisor;
pub use target::BuildTarget;
