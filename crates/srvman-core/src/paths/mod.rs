//! Path utilities for srvman data directories and the config file.
//!
//! # Design
//!
//! - Returns `PathBuf` and `PathError` for clear error handling
//! - No interactive/terminal I/O - adapters handle user prompts separately
//! - OS-specific logic is kept private in `platform`

mod config;
mod error;
mod platform;

#[cfg(test)]
mod scoped_env;

pub use config::{CONFIG_FILE_NAME, config_path, resolve_config_path};
pub use error::PathError;
pub use platform::data_root;
