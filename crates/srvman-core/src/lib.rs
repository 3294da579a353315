//! Core domain types and port definitions for srvman.
//!
//! This crate holds everything that does not touch the operating system's
//! process table: server descriptors, the registry and its persistence,
//! log entry and port record types, supervisor settings, and the error
//! taxonomy shared by every adapter.
#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod paths;
pub mod ports;
pub mod services;
pub mod settings;
pub mod store;

// Re-export commonly used types for convenience
pub use domain::{DescriptorError, LogEntry, LogSource, PortRecord, ServerDescriptor};
pub use ports::{
    ConfigError, CoreError, ListeningSocket, LoadedConfig, ProcessAccessError, ProcessError,
    ProcessIdentity, RegistryError, ScanError, ServerConfigStore, SocketIntrospector,
};
pub use services::{LoadReport, ServerRegistry};
pub use settings::{
    DEFAULT_JAVA_EXECUTABLE, DEFAULT_PAGE_SIZE, DEFAULT_PORT_FILTER, DEFAULT_STOP_TIMEOUT_SECS,
    SettingsError, SupervisorSettings, validate_settings,
};
pub use store::JsonConfigStore;

// Re-export path utilities
pub use paths::{CONFIG_FILE_NAME, PathError, config_path, data_root, resolve_config_path};
