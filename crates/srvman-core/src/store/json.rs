//! JSON file config store.
//!
//! Format:
//! ```json
//! {
//!     "servers": [
//!         {
//!             "name": "survival",
//!             "workingDirectory": "/srv/s1",
//!             "entryFile": "server.jar",
//!             "maxHeapGiB": 4,
//!             "isProxy": false
//!         }
//!     ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::domain::ServerDescriptor;
use crate::ports::{ConfigError, LoadedConfig, ServerConfigStore};

#[derive(Serialize)]
struct ConfigDocument<'a> {
    servers: &'a [ServerDescriptor],
}

/// Server list persisted as a human-readable JSON document.
#[derive(Debug, Clone)]
pub struct JsonConfigStore {
    path: PathBuf,
}

impl JsonConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, e: &std::io::Error) -> ConfigError {
        ConfigError::Io {
            path: self.path.clone(),
            reason: e.to_string(),
        }
    }

    fn format_error(&self, reason: impl Into<String>) -> ConfigError {
        ConfigError::Format {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }

    fn parse_entries(entries: &[Value]) -> LoadedConfig {
        let mut loaded = LoadedConfig::default();

        for (index, entry) in entries.iter().enumerate() {
            let descriptor = match ServerDescriptor::deserialize(entry) {
                Ok(descriptor) => descriptor,
                Err(e) => {
                    loaded.issues.push(format!("entry {index}: {e}"));
                    continue;
                }
            };

            if let Err(e) = descriptor.validate() {
                loaded
                    .issues
                    .push(format!("entry {index} ({}): {e}", descriptor.name));
                continue;
            }

            loaded.servers.push(descriptor);
        }

        loaded
    }
}

impl ServerConfigStore for JsonConfigStore {
    fn load(&self) -> Result<LoadedConfig, ConfigError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "Config file missing, starting empty");
            return Ok(LoadedConfig::default());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| self.io_error(&e))?;
        let document: Value =
            serde_json::from_str(&content).map_err(|e| self.format_error(e.to_string()))?;

        let entries = document
            .as_object()
            .and_then(|obj| obj.get("servers"))
            .and_then(Value::as_array)
            .ok_or_else(|| self.format_error("expected an object with a \"servers\" array"))?;

        let loaded = Self::parse_entries(entries);
        for issue in &loaded.issues {
            warn!(path = %self.path.display(), "Skipping config entry: {}", issue);
        }
        Ok(loaded)
    }

    fn save(&self, servers: &[ServerDescriptor]) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_error(&e))?;
            }
        }

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        ConfigDocument { servers }
            .serialize(&mut serializer)
            .map_err(|e| ConfigError::Serialization(e.to_string()))?;
        buf.push(b'\n');

        // Write to a sibling temp file, then rename over the target
        let mut temp_name = self.path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        fs::write(&temp_path, &buf).map_err(|e| self.io_error(&e))?;
        fs::rename(&temp_path, &self.path).map_err(|e| self.io_error(&e))?;

        debug!(path = %self.path.display(), count = servers.len(), "Saved server config");
        Ok(())
    }
}
