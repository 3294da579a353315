//! Configuration store port.
//!
//! The registry persists its descriptors through this trait. The store owns
//! the on-disk format; the registry only ever sees whole descriptor lists.

use crate::domain::ServerDescriptor;

use super::ConfigError;

/// Result of reading the configuration store.
///
/// Malformed individual entries do not fail the load; they are skipped and
/// described in `issues`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedConfig {
    /// Descriptors that parsed and validated.
    pub servers: Vec<ServerDescriptor>,
    /// Human-readable descriptions of skipped entries.
    pub issues: Vec<String>,
}

/// Port for loading and saving the server list.
#[cfg_attr(test, mockall::automock)]
pub trait ServerConfigStore: Send + Sync {
    /// Read every descriptor from the store.
    ///
    /// A missing store is an empty configuration, not an error. A store whose
    /// top-level shape is wrong yields `ConfigError::Format`.
    fn load(&self) -> Result<LoadedConfig, ConfigError>;

    /// Overwrite the store with `servers`.
    fn save(&self, servers: &[ServerDescriptor]) -> Result<(), ConfigError>;
}
