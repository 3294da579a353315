//! Game server process management.
//!
//! # Structure
//!
//! - `ProcessHandle` - spawn, feed and stop one server's child process
//! - `ServerEvent` / `ServerEventBroadcaster` - lifecycle event fan-out
//! - `shutdown` - SIGTERM → SIGKILL escalation by pid

mod broadcaster;
mod events;
mod handle;
pub mod shutdown;
mod stream;
mod types;

pub use broadcaster::ServerEventBroadcaster;
pub use events::{ServerEvent, ServerStatus};
pub use handle::{CommandWriter, ProcessHandle, READER_FLUSH_TIMEOUT};
pub use types::{ProcessExit, ProcessInfo, StartOutcome, StopOutcome};
