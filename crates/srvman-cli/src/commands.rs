//! Subcommand definitions.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show where the server list is stored
    Paths,

    /// List registered servers
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Register a server
    Add {
        /// Unique server name
        #[arg(long)]
        name: String,
        /// Directory the server runs in
        #[arg(long)]
        dir: PathBuf,
        /// Jar file to launch, relative to the directory
        #[arg(long)]
        jar: String,
        /// Maximum heap in GiB
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        ram: u32,
        /// Mark as a proxy (Velocity, BungeeCord, ...)
        #[arg(long)]
        proxy: bool,
    },

    /// Unregister a server
    Remove {
        /// Server name
        name: String,
    },

    /// Show one server's settings
    Show {
        /// Server name
        name: String,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List listening TCP ports and their processes
    Ports {
        /// Only show processes whose name contains this (case-insensitive)
        #[arg(long)]
        filter: Option<String>,
        /// Show every process, ignoring the filter
        #[arg(long, conflicts_with = "filter")]
        all: bool,
        /// Page to show, starting at 1
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
        page: u64,
    },

    /// Kill the processes listening on the given ports
    Close {
        /// Port numbers
        #[arg(required = true)]
        ports: Vec<u16>,
    },

    /// Start a server and attach to its console (Ctrl-C stops it)
    Run {
        /// Server name
        name: String,
    },

    /// Interactive session over all servers
    Console,
}
