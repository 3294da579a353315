//! Listening-port snapshot records.

use serde::{Deserialize, Serialize};

/// A listening port and the process that owned it at scan time.
///
/// Records are point-in-time snapshots; they are never persisted and are
/// re-derived on every scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortRecord {
    pub port: u16,
    pub pid: u32,
    pub process_name: String,
    /// Process start time (seconds since the epoch) when the OS reports it.
    /// Used to detect pid reuse before killing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<u64>,
}

impl PortRecord {
    pub fn new(port: u16, pid: u32, process_name: impl Into<String>) -> Self {
        Self {
            port,
            pid,
            process_name: process_name.into(),
            start_time: None,
        }
    }

    #[must_use]
    pub const fn with_start_time(mut self, start_time: u64) -> Self {
        self.start_time = Some(start_time);
        self
    }

    /// Case-insensitive substring match on the process name.
    ///
    /// An empty filter matches everything.
    pub fn matches_name(&self, filter: &str) -> bool {
        filter.is_empty()
            || self
                .process_name
                .to_lowercase()
                .contains(&filter.to_lowercase())
    }
}
