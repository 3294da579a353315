//! Config file location.

use std::env;
use std::path::{Path, PathBuf};

use super::error::PathError;
use super::platform::data_root;

/// File name of the server list inside the data root.
pub const CONFIG_FILE_NAME: &str = "servers_config.json";

/// Environment variable naming the config file directly.
const CONFIG_ENV: &str = "SRVMAN_CONFIG";

/// Location of the server list.
///
/// Resolution order:
/// 1. `SRVMAN_CONFIG` environment variable
/// 2. `<data_root>/servers_config.json`
pub fn config_path() -> Result<PathBuf, PathError> {
    if let Ok(path) = env::var(CONFIG_ENV) {
        return checked(PathBuf::from(path));
    }
    Ok(data_root()?.join(CONFIG_FILE_NAME))
}

/// Resolve the config path, preferring an explicit location (e.g. a CLI flag).
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf, PathError> {
    match explicit {
        Some(path) => checked(path.to_path_buf()),
        None => config_path(),
    }
}

fn checked(path: PathBuf) -> Result<PathBuf, PathError> {
    if path.as_os_str().is_empty() {
        return Err(PathError::EmptyPath);
    }
    if path.is_dir() {
        return Err(PathError::IsADirectory(path));
    }
    Ok(path)
}
