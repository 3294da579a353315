//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No filesystem or OS-introspection types in any signature
//! - Traits are minimal: a config store loads and saves, an introspector
//!   enumerates and kills

pub mod config_store;
pub mod socket_introspection;

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::DescriptorError;

pub use config_store::{LoadedConfig, ServerConfigStore};
pub use socket_introspection::{ListeningSocket, ProcessIdentity, SocketIntrospector};

/// Errors for process lifecycle operations.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The interpreter could not be found or the working directory is invalid.
    #[error("Failed to launch {server}: {reason}")]
    Launch { server: String, reason: String },

    /// The server has no live process.
    #[error("Server {0} is not running")]
    NotRunning(String),

    /// Reading from or writing to the child's pipes failed.
    #[error("I/O error on {server}: {reason}")]
    Io { server: String, reason: String },
}

/// Errors for the configuration store.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read or written.
    #[error("Failed to access config file {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    /// The config file exists but does not have the expected shape.
    #[error("Malformed config file {path}: {reason}")]
    Format { path: PathBuf, reason: String },

    /// Serializing the registry failed.
    #[error("Failed to serialize config: {0}")]
    Serialization(String),
}

/// Errors for registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A server with the same name is already registered.
    #[error("Server {0} already exists")]
    DuplicateName(String),

    /// No server with that name is registered.
    #[error("Server {0} not found")]
    NotFound(String),

    /// The descriptor failed validation.
    #[error("Invalid server descriptor: {0}")]
    Validation(#[from] DescriptorError),

    /// Loading or persisting the registry failed.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors enumerating sockets or processes.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The socket table could not be read at all.
    #[error("Failed to enumerate sockets: {0}")]
    Sockets(String),
}

/// A single process could not be inspected or signalled.
///
/// These are per-process and never abort a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessAccessError {
    /// The process no longer exists.
    #[error("Process {0} no longer exists")]
    Vanished(u32),

    /// The OS refused access to the process.
    #[error("Access to process {0} denied")]
    AccessDenied(u32),

    /// Any other failure delivering the signal.
    #[error("Failed to signal process {pid}: {reason}")]
    Failed { pid: u32, reason: String },
}

/// Core error type for semantic domain errors.
///
/// Adapters map this to their own error types (CLI exit codes, log lines).
#[derive(Debug, Error)]
pub enum CoreError {
    /// Registry operation failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Process operation failed.
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// Port scan failed.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// Settings validation error.
    #[error(transparent)]
    Settings(#[from] crate::settings::SettingsError),

    /// No server is selected for an operation that needs one.
    #[error("No server selected")]
    NoSelection,
}

impl From<ConfigError> for CoreError {
    fn from(err: ConfigError) -> Self {
        Self::Registry(RegistryError::Config(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_lifts_into_core_error() {
        let err: CoreError = ConfigError::Serialization("boom".to_string()).into();
        assert!(matches!(err, CoreError::Registry(RegistryError::Config(_))));
        assert_eq!(err.to_string(), "Failed to serialize config: boom");
    }

    #[test]
    fn test_launch_error_message_names_server() {
        let err = ProcessError::Launch {
            server: "survival".to_string(),
            reason: "java not found".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to launch survival: java not found");
    }

    #[test]
    fn test_every_process_error_names_its_server() {
        let errors = [
            ProcessError::Launch { server: "survival".into(), reason: "no jar".into() },
            ProcessError::NotRunning("survival".into()),
            ProcessError::Io { server: "survival".into(), reason: "broken pipe".into() },
        ];
        for err in errors {
            // Exhaustive so a new variant has to show up here with a real use
            let kind = match &err {
                ProcessError::Launch { .. } => "launch",
                ProcessError::NotRunning(_) => "not running",
                ProcessError::Io { .. } => "io",
            };
            assert!(err.to_string().contains("survival"), "{kind}: {err}");
        }
    }
}
