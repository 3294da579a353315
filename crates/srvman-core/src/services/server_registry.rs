//! Registry of configured servers and the current selection.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::ServerDescriptor;
use crate::ports::{RegistryError, ServerConfigStore};

/// Summary of a `load()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Number of descriptors now in the registry.
    pub loaded: usize,
    /// Entries that were skipped, with the reason.
    pub issues: Vec<String>,
}

/// The set of configured servers plus the operator's current selection.
///
/// Every mutation is persisted immediately with a full overwrite of the
/// store. If persisting fails the in-memory change is rolled back, so memory
/// and disk never disagree.
pub struct ServerRegistry {
    store: Arc<dyn ServerConfigStore>,
    servers: Vec<ServerDescriptor>,
    selected: Option<String>,
}

impl ServerRegistry {
    /// Create an empty registry backed by `store`. Call `load()` to populate it.
    pub fn new(store: Arc<dyn ServerConfigStore>) -> Self {
        Self {
            store,
            servers: Vec::new(),
            selected: None,
        }
    }

    /// Rebuild the registry from the store.
    ///
    /// Malformed entries and duplicate names are skipped and listed in the
    /// report. If the store itself is malformed the registry is left empty and
    /// the error is returned.
    pub fn load(&mut self) -> Result<LoadReport, RegistryError> {
        let loaded = match self.store.load() {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!(error = %e, "Failed to load server config, registry left empty");
                self.servers.clear();
                self.selected = None;
                return Err(e.into());
            }
        };

        let mut issues = loaded.issues;
        let mut seen = HashSet::new();
        let mut servers = Vec::with_capacity(loaded.servers.len());
        for descriptor in loaded.servers {
            if seen.insert(descriptor.name.clone()) {
                servers.push(descriptor);
            } else {
                issues.push(format!("duplicate server name {}", descriptor.name));
            }
        }

        self.servers = servers;
        let keep_selection = self
            .selected
            .as_deref()
            .is_some_and(|name| self.contains(name));
        if !keep_selection {
            self.selected = None;
        }

        info!(count = self.servers.len(), skipped = issues.len(), "Loaded server config");
        Ok(LoadReport {
            loaded: self.servers.len(),
            issues,
        })
    }

    /// Persist the current descriptors (full overwrite).
    pub fn save(&self) -> Result<(), RegistryError> {
        self.store.save(&self.servers)?;
        Ok(())
    }

    /// Register a new server and persist.
    ///
    /// A duplicate name leaves the registry unchanged.
    pub fn add(&mut self, descriptor: ServerDescriptor) -> Result<(), RegistryError> {
        descriptor.validate()?;
        if self.contains(&descriptor.name) {
            return Err(RegistryError::DuplicateName(descriptor.name));
        }

        let name = descriptor.name.clone();
        self.servers.push(descriptor);
        if let Err(e) = self.save() {
            self.servers.pop();
            return Err(e);
        }

        debug!(server = %name, "Server added");
        Ok(())
    }

    /// Replace the descriptor registered as `name`.
    ///
    /// Renaming is allowed when the new name is free. The selection follows
    /// a rename. A process already started under the old descriptor is not
    /// affected.
    pub fn update(
        &mut self,
        name: &str,
        descriptor: ServerDescriptor,
    ) -> Result<(), RegistryError> {
        descriptor.validate()?;
        let index = self.index_of(name)?;
        if descriptor.name != name && self.contains(&descriptor.name) {
            return Err(RegistryError::DuplicateName(descriptor.name));
        }

        let new_name = descriptor.name.clone();
        let previous = std::mem::replace(&mut self.servers[index], descriptor);
        if let Err(e) = self.save() {
            self.servers[index] = previous;
            return Err(e);
        }

        if self.selected.as_deref() == Some(name) {
            self.selected = Some(new_name);
        }
        debug!(server = %name, "Server updated");
        Ok(())
    }

    /// Remove a server and persist. Clears the selection if it was selected.
    pub fn remove(&mut self, name: &str) -> Result<ServerDescriptor, RegistryError> {
        let index = self.index_of(name)?;
        let removed = self.servers.remove(index);
        if let Err(e) = self.save() {
            self.servers.insert(index, removed);
            return Err(e);
        }

        if self.selected.as_deref() == Some(name) {
            self.selected = None;
        }
        debug!(server = %name, "Server removed");
        Ok(removed)
    }

    /// Make `name` the current selection.
    pub fn select(&mut self, name: &str) -> Result<&ServerDescriptor, RegistryError> {
        let index = self.index_of(name)?;
        self.selected = Some(name.to_string());
        Ok(&self.servers[index])
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// The currently selected descriptor, if any.
    pub fn selected(&self) -> Option<&ServerDescriptor> {
        self.selected.as_deref().and_then(|name| self.get(name))
    }

    pub fn get(&self, name: &str) -> Option<&ServerDescriptor> {
        self.servers.iter().find(|s| s.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// All descriptors in registration order.
    pub fn list(&self) -> &[ServerDescriptor] {
        &self.servers
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    fn index_of(&self, name: &str) -> Result<usize, RegistryError> {
        self.servers
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }
}
