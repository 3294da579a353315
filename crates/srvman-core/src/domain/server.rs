//! Server descriptor: identity and launch parameters of one managed server.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Initial heap passed to every JVM we launch.
pub const INITIAL_HEAP_FLAG: &str = "-Xms1G";

/// Identity and launch parameters of one manageable server process.
///
/// `name` is the registry key and the key of the server's log buffer, so it
/// must be unique within a registry.
///
/// The persisted field names are camelCase. The snake_case names written by
/// older config files are accepted on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerDescriptor {
    /// Unique server name.
    pub name: String,
    /// Directory the server is launched from.
    #[serde(alias = "server_path")]
    pub working_directory: PathBuf,
    /// Jar file passed to `-jar`, relative to the working directory.
    #[serde(alias = "server_file_name")]
    pub entry_file: String,
    /// Maximum JVM heap in GiB (`-Xmx<N>G`).
    #[serde(rename = "maxHeapGiB", alias = "max_ram")]
    pub max_heap_gib: u32,
    /// Whether this server is a proxy (informational only).
    #[serde(default, alias = "is_proxy")]
    pub is_proxy: bool,
}

/// Descriptor validation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("Server name cannot be empty")]
    EmptyName,

    #[error("Entry file cannot be empty")]
    EmptyEntryFile,

    #[error("Working directory cannot be empty")]
    EmptyWorkingDirectory,

    #[error("Maximum heap must be at least 1 GiB, got {0}")]
    InvalidHeap(u32),
}

impl ServerDescriptor {
    /// Create a descriptor for a non-proxy server.
    pub fn new(
        name: impl Into<String>,
        working_directory: impl Into<PathBuf>,
        entry_file: impl Into<String>,
        max_heap_gib: u32,
    ) -> Self {
        Self {
            name: name.into(),
            working_directory: working_directory.into(),
            entry_file: entry_file.into(),
            max_heap_gib,
            is_proxy: false,
        }
    }

    /// Mark this descriptor as a proxy server.
    #[must_use]
    pub const fn with_proxy(mut self, is_proxy: bool) -> Self {
        self.is_proxy = is_proxy;
        self
    }

    /// Check the invariants every registered descriptor must hold.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        if self.name.trim().is_empty() {
            return Err(DescriptorError::EmptyName);
        }
        if self.entry_file.trim().is_empty() {
            return Err(DescriptorError::EmptyEntryFile);
        }
        if self.working_directory.as_os_str().is_empty() {
            return Err(DescriptorError::EmptyWorkingDirectory);
        }
        if self.max_heap_gib == 0 {
            return Err(DescriptorError::InvalidHeap(self.max_heap_gib));
        }
        Ok(())
    }

    /// JVM arguments used to launch this server.
    ///
    /// `-Xms1G -Xmx<N>G -jar <entry_file> nogui`
    pub fn launch_args(&self) -> Vec<String> {
        vec![
            INITIAL_HEAP_FLAG.to_string(),
            format!("-Xmx{}G", self.max_heap_gib),
            "-jar".to_string(),
            self.entry_file.clone(),
            "nogui".to_string(),
        ]
    }
}
