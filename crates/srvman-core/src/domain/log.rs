//! Log entry types shared by the runtime and front ends.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a log line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSource {
    /// Captured from the child's standard output.
    Stdout,
    /// Captured from the child's standard error.
    Stderr,
    /// A command the operator sent to the child's standard input.
    Operator,
    /// A message produced by the supervisor itself (lifecycle, errors).
    System,
}

impl LogSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
            Self::Operator => "operator",
            Self::System => "system",
        }
    }
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of captured output or one operator/system action.
///
/// Entries are tagged with their server when they are produced, not when
/// they are drained, so a later change of selection can never move a line
/// into the wrong buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Name of the server this entry belongs to
    pub server: String,
    /// Unix timestamp in milliseconds
    pub timestamp: u64,
    /// Origin of the line
    pub source: LogSource,
    /// The line content, without trailing newline
    pub line: String,
}

impl LogEntry {
    /// Create a new log entry stamped with the current time.
    pub fn new(server: impl Into<String>, source: LogSource, line: impl Into<String>) -> Self {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX));
        Self {
            server: server.into(),
            timestamp,
            source,
            line: line.into(),
        }
    }
}
