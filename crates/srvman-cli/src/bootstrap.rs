//! CLI bootstrap - the composition root.
//!
//! This is the only place where concrete adapters are chosen:
//! - `JsonConfigStore` for the server list
//! - `SystemIntrospector` for sockets and processes
//! - `Supervisor` over both

use std::path::PathBuf;
use std::sync::Arc;

use srvman_core::{
    JsonConfigStore, LoadReport, ServerRegistry, SupervisorSettings, resolve_config_path,
    validate_settings,
};
use srvman_runtime::{Supervisor, SystemIntrospector};
use tracing::{debug, warn};

use crate::error::CliError;
use crate::parser::Cli;

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Resolved location of servers_config.json.
    pub config_path: PathBuf,
    /// Supervisor settings after applying flags and env vars.
    pub settings: SupervisorSettings,
}

impl CliConfig {
    /// Resolve the config path and settings from parsed arguments.
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let config_path = resolve_config_path(cli.config.as_deref())?;

        let mut settings = SupervisorSettings::default();
        if let Some(java) = &cli.java {
            settings.java_executable.clone_from(java);
        }
        if let Some(secs) = cli.stop_timeout {
            settings.stop_timeout_secs = secs;
        }
        if cli.max_log_lines.is_some() {
            settings.max_log_lines = cli.max_log_lines;
        }
        validate_settings(&settings).map_err(|e| CliError::Config(e.to_string()))?;

        Ok(Self {
            config_path,
            settings,
        })
    }
}

/// Fully composed application context for CLI commands.
pub struct CliContext {
    pub supervisor: Arc<Supervisor>,
    pub config_path: PathBuf,
    /// What happened when the server list was loaded.
    pub load_report: LoadReport,
}

impl CliContext {
    pub fn supervisor(&self) -> &Arc<Supervisor> {
        &self.supervisor
    }
}

/// Load the server list and assemble the supervisor.
///
/// A malformed config file is an error here rather than an empty registry:
/// the next save would otherwise overwrite the user's file.
pub fn bootstrap(config: CliConfig) -> Result<CliContext, CliError> {
    let store = JsonConfigStore::new(&config.config_path);
    let mut registry = ServerRegistry::new(Arc::new(store));
    let load_report = registry
        .load()
        .map_err(|e| CliError::Config(e.to_string()))?;

    for issue in &load_report.issues {
        warn!(path = %config.config_path.display(), "Skipped config entry: {}", issue);
    }
    debug!(
        path = %config.config_path.display(),
        servers = load_report.loaded,
        "Server list loaded"
    );

    let supervisor = Supervisor::new(registry, Arc::new(SystemIntrospector::new()), config.settings)?;

    Ok(CliContext {
        supervisor: Arc::new(supervisor),
        config_path: config.config_path,
        load_report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_flags_override_settings() {
        let cli = Cli::parse_from([
            "srvman",
            "--config",
            "/tmp/srvman-test/servers_config.json",
            "--java",
            "/opt/jdk/bin/java",
            "--stop-timeout",
            "5",
            "list",
        ]);
        let config = CliConfig::from_cli(&cli).unwrap();
        assert_eq!(config.settings.java_executable, "/opt/jdk/bin/java");
        assert_eq!(config.settings.stop_timeout_secs, 5);
        assert_eq!(
            config.config_path,
            PathBuf::from("/tmp/srvman-test/servers_config.json")
        );
    }

    #[test]
    fn test_invalid_stop_timeout_is_config_error() {
        let cli = Cli::parse_from([
            "srvman",
            "--config",
            "/tmp/srvman-test/servers_config.json",
            "--stop-timeout",
            "0",
            "list",
        ]);
        let err = CliConfig::from_cli(&cli).unwrap_err();
        assert_eq!(err.exit_code(), 78);
    }

    #[test]
    fn test_bootstrap_loads_existing_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("servers_config.json");
        fs::write(
            &path,
            r#"{"servers": [
                {"name": "survival", "workingDirectory": "/srv/s1", "entryFile": "server.jar", "maxHeapGiB": 4},
                {"name": "broken"}
            ]}"#,
        )
        .unwrap();

        let ctx = bootstrap(CliConfig {
            config_path: path,
            settings: SupervisorSettings::default(),
        })
        .unwrap();

        assert_eq!(ctx.load_report.loaded, 1);
        assert_eq!(ctx.load_report.issues.len(), 1);
        let servers = tokio_test::block_on(ctx.supervisor().servers());
        assert_eq!(servers.len(), 1);
        assert_eq!(servers[0].name, "survival");
    }

    #[test]
    fn test_bootstrap_refuses_malformed_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("servers_config.json");
        fs::write(&path, "[]").unwrap();

        let result = bootstrap(CliConfig {
            config_path: path,
            settings: SupervisorSettings::default(),
        });
        assert!(matches!(result, Err(CliError::Config(_))));
    }
}
