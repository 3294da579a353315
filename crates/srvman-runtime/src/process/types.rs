//! Shared types for process management.

use serde::Serialize;
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::process::ChildStdin;
use tokio::sync::{Mutex, watch};

use crate::logs::LogSink;

/// How a server process ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessExit {
    /// Exit code, when the process exited normally
    pub code: Option<i32>,
    /// Terminating signal number (Unix only)
    pub signal: Option<i32>,
    pub success: bool,
    /// Human-readable summary, e.g. "exit status: 0"
    pub description: String,
}

impl ProcessExit {
    pub fn from_status(status: ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        Self {
            code: status.code(),
            signal,
            success: status.success(),
            description: status.to_string(),
        }
    }

    /// An exit whose status could not be collected.
    pub fn unknown(reason: impl Into<String>) -> Self {
        Self {
            code: None,
            signal: None,
            success: false,
            description: reason.into(),
        }
    }
}

/// Information about a running server process
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessInfo {
    /// Registry name of the server
    pub server: String,
    pub pid: u32,
    /// Unix timestamp (seconds) when the process was spawned
    pub started_at: u64,
}

impl ProcessInfo {
    pub fn new(server: impl Into<String>, pid: u32) -> Self {
        let started_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        Self {
            server: server.into(),
            pid,
            started_at,
        }
    }
}

/// A live child owned by a `ProcessHandle`.
///
/// The `Child` itself lives in the exit watcher task; the handle keeps the
/// stdin pipe, the run's log sink and a view of the exit state. Stdin has
/// its own lock so a write stuck on a full pipe never holds the handle.
pub(crate) struct RunningProcess {
    pub info: ProcessInfo,
    pub stdin: Arc<Mutex<ChildStdin>>,
    pub sink: LogSink,
    pub exit_rx: watch::Receiver<Option<ProcessExit>>,
}

impl RunningProcess {
    pub fn new(
        info: ProcessInfo,
        stdin: ChildStdin,
        sink: LogSink,
        exit_rx: watch::Receiver<Option<ProcessExit>>,
    ) -> Self {
        Self {
            info,
            stdin: Arc::new(Mutex::new(stdin)),
            sink,
            exit_rx,
        }
    }

    /// The exit, if the watcher has already observed it.
    pub fn exited(&self) -> Option<ProcessExit> {
        self.exit_rx.borrow().clone()
    }
}

/// Result of `ProcessHandle::start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new child was spawned.
    Started { pid: u32 },
    /// A child was already running; nothing was spawned.
    AlreadyRunning { pid: u32 },
}

impl StartOutcome {
    pub const fn pid(&self) -> u32 {
        match self {
            Self::Started { pid } | Self::AlreadyRunning { pid } => *pid,
        }
    }
}

/// Result of `ProcessHandle::stop`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// There was nothing to stop.
    NotRunning,
    /// The child exited within the grace period.
    Stopped(ProcessExit),
    /// The child ignored SIGTERM and was force-killed.
    Killed(ProcessExit),
    /// No exit could be confirmed. The handle forgot the child anyway.
    Abandoned { pid: u32, reason: String },
}
