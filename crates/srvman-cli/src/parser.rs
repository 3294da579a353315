//! Main CLI parser and top-level argument handling.
//!
//! This module defines the root CLI structure with global options.

use clap::Parser;
use std::path::PathBuf;

use crate::commands::Commands;

/// Supervise Java game servers: start and stop them, talk to their
/// consoles, and clear out whatever is squatting on their ports.
#[derive(Parser)]
#[command(name = "srvman")]
#[command(about = "Supervise Java game server processes")]
#[command(version)]
pub struct Cli {
    /// Server list to use instead of the default location
    /// (falls back to SRVMAN_CONFIG, then SRVMAN_DATA_DIR)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Java executable used to launch servers
    #[arg(long, global = true, env = "SRVMAN_JAVA")]
    pub java: Option<String>,

    /// Seconds to wait for a graceful stop before killing a server
    #[arg(long = "stop-timeout", global = true, env = "SRVMAN_STOP_TIMEOUT", value_name = "SECS")]
    pub stop_timeout: Option<u64>,

    /// Keep at most this many log lines per server
    #[arg(long = "max-log-lines", global = true, env = "SRVMAN_MAX_LOG_LINES", value_name = "N")]
    pub max_log_lines: Option<usize>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from([
            "srvman",
            "--verbose",
            "--config",
            "/tmp/servers_config.json",
            "--stop-timeout",
            "10",
            "list",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/servers_config.json")));
        assert_eq!(cli.stop_timeout, Some(10));
        assert!(matches!(cli.command, Some(Commands::List { json: false })));
    }

    #[test]
    fn test_global_args_after_subcommand() {
        let cli = Cli::parse_from(["srvman", "run", "survival", "--java", "/opt/jdk/bin/java"]);
        assert_eq!(cli.java.as_deref(), Some("/opt/jdk/bin/java"));
    }
}
