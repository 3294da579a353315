//! CLI-specific error types and mappings.
//!
//! Maps `CoreError` to exit codes and user-facing messages.

use srvman_core::{CoreError, PathError, RegistryError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Core domain error with no better category.
    #[error("{0}")]
    Core(String),

    /// Bad input from the user.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// The named server does not exist.
    #[error("{0}")]
    NotFound(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Process execution error.
    #[error("Process error: {0}")]
    Process(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow Unix conventions:
    /// - 1: General error
    /// - 2: Misuse of shell command (invalid arguments)
    /// - 64-78: Specific error categories (see sysexits.h)
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Core(_) => 1,
            Self::Arguments(_) => 2,
            Self::NotFound(_) => 66, // EX_NOINPUT
            Self::Io(_) => 74,       // EX_IOERR
            Self::Config(_) => 78,   // EX_CONFIG
            Self::Process(_) => 71,  // EX_OSERR
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Registry(RegistryError::NotFound(name)) => {
                Self::NotFound(format!("Server {name} not found"))
            }
            CoreError::Registry(RegistryError::Config(e)) => Self::Config(e.to_string()),
            CoreError::Registry(e) => Self::Arguments(e.to_string()),
            CoreError::Process(e) => Self::Process(e.to_string()),
            CoreError::Scan(e) => Self::Io(e.to_string()),
            CoreError::Settings(e) => Self::Config(e.to_string()),
            CoreError::NoSelection => {
                Self::Arguments("no server selected (use `select NAME`)".to_string())
            }
        }
    }
}

impl From<PathError> for CliError {
    fn from(err: PathError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use srvman_core::{ConfigError, ProcessError, SettingsError};
    use std::path::PathBuf;

    #[test]
    fn test_not_found_maps_to_noinput() {
        let err = CliError::from(CoreError::from(RegistryError::NotFound("survival".into())));
        assert_eq!(err.exit_code(), 66);
        assert_eq!(err.to_string(), "Server survival not found");
    }

    #[test]
    fn test_duplicate_is_argument_error() {
        let err = CliError::from(CoreError::from(RegistryError::DuplicateName("survival".into())));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_config_errors_map_to_config() {
        let err = CliError::from(CoreError::from(ConfigError::Format {
            path: PathBuf::from("servers_config.json"),
            reason: "expected an object".into(),
        }));
        assert_eq!(err.exit_code(), 78);

        let err = CliError::from(CoreError::from(SettingsError::InvalidPageSize(0)));
        assert_eq!(err.exit_code(), 78);
    }

    #[test]
    fn test_process_error_maps_to_oserr() {
        let err = CliError::from(CoreError::from(ProcessError::NotRunning("survival".into())));
        assert_eq!(err.exit_code(), 71);
    }
}
