//! Stopping server processes.
//!
//! - `signal`: deliver SIGTERM / SIGKILL to a pid
//! - `graceful`: SIGTERM, wait for the exit watcher, escalate to SIGKILL

mod graceful;
mod signal;

pub(crate) use graceful::{ShutdownResult, terminate_and_wait, wait_for_exit};
pub use signal::{send_kill, send_terminate};
