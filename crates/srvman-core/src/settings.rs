//! Supervisor settings and validation.
//!
//! These are the knobs of the runtime that are not part of any single
//! server's descriptor. Adapters fill them from flags and environment.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Executable used to launch servers when none is configured.
pub const DEFAULT_JAVA_EXECUTABLE: &str = "java";

/// Grace period between SIGTERM and a forced kill when stopping a server.
pub const DEFAULT_STOP_TIMEOUT_SECS: u64 = 30;

/// Process-name filter applied to port scans by default.
pub const DEFAULT_PORT_FILTER: &str = "java";

/// Port scan page size.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Runtime settings for the supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorSettings {
    /// Java executable (name on `PATH` or absolute path).
    pub java_executable: String,

    /// Seconds to wait after SIGTERM before force-killing a server.
    pub stop_timeout_secs: u64,

    /// Case-insensitive substring a process name must contain to appear in
    /// port scan pages. Empty shows every process.
    pub port_filter: String,

    /// Records per port scan page.
    pub page_size: usize,

    /// Per-server log line cap. `None` keeps every line.
    pub max_log_lines: Option<usize>,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            java_executable: DEFAULT_JAVA_EXECUTABLE.to_string(),
            stop_timeout_secs: DEFAULT_STOP_TIMEOUT_SECS,
            port_filter: DEFAULT_PORT_FILTER.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            max_log_lines: None,
        }
    }
}

impl SupervisorSettings {
    /// Stop timeout as a `Duration`.
    #[must_use]
    pub const fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }
}

/// Settings validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("Java executable cannot be empty")]
    EmptyJavaExecutable,

    #[error("Stop timeout must be between 1 and 600 seconds, got {0}")]
    InvalidStopTimeout(u64),

    #[error("Page size must be between 1 and 500, got {0}")]
    InvalidPageSize(usize),

    #[error("Log line cap must be at least 1, got {0}")]
    InvalidLogCap(usize),
}

/// Validate settings values.
pub fn validate_settings(settings: &SupervisorSettings) -> Result<(), SettingsError> {
    if settings.java_executable.trim().is_empty() {
        return Err(SettingsError::EmptyJavaExecutable);
    }

    if !(1..=600).contains(&settings.stop_timeout_secs) {
        return Err(SettingsError::InvalidStopTimeout(settings.stop_timeout_secs));
    }

    if !(1..=500).contains(&settings.page_size) {
        return Err(SettingsError::InvalidPageSize(settings.page_size));
    }

    if let Some(cap) = settings.max_log_lines {
        if cap == 0 {
            return Err(SettingsError::InvalidLogCap(cap));
        }
    }

    Ok(())
}
