//! Platform-specific data root resolution.

use std::env;
use std::path::PathBuf;

use super::error::PathError;

/// Environment variable overriding the data root.
pub(super) const DATA_DIR_ENV: &str = "SRVMAN_DATA_DIR";

/// Get the root directory for application data.
///
/// Resolution order:
/// 1. `SRVMAN_DATA_DIR` environment variable (highest priority)
/// 2. System data directory (e.g., `~/.local/share/srvman`)
///
/// The directory is not created here; the config store creates it on the
/// first save.
pub fn data_root() -> Result<PathBuf, PathError> {
    if let Ok(path) = env::var(DATA_DIR_ENV) {
        if path.trim().is_empty() {
            return Err(PathError::EmptyPath);
        }
        return Ok(PathBuf::from(path));
    }

    let data_dir = dirs::data_dir().ok_or(PathError::NoDataDir)?;
    Ok(data_dir.join("srvman"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::scoped_env::ScopedEnv;

    #[test]
    fn test_data_root_honours_env_override() {
        let _env = ScopedEnv::lock().set(DATA_DIR_ENV, "/tmp/srvman-test-root");

        assert_eq!(data_root().unwrap(), PathBuf::from("/tmp/srvman-test-root"));
    }

    #[test]
    fn test_data_root_rejects_blank_override() {
        let _env = ScopedEnv::lock().set(DATA_DIR_ENV, "  ");

        assert!(matches!(data_root(), Err(PathError::EmptyPath)));
    }
}
