//! Add command handler.
//!
//! Registers a new server and persists the server list.

use anyhow::Result;
use srvman_core::ServerDescriptor;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::display_server_summary;

/// Execute the add command.
///
/// Relative directories are made absolute against the current directory
/// so the entry keeps working when srvman is run from elsewhere.
pub async fn execute(
    ctx: &CliContext,
    name: &str,
    dir: &Path,
    jar: &str,
    ram: u32,
    proxy: bool,
) -> Result<()> {
    let dir = absolute_dir(dir)?;
    if !dir.is_dir() {
        warn!(dir = %dir.display(), "Server directory does not exist yet");
    } else if !dir.join(jar).is_file() {
        warn!(jar = %jar, dir = %dir.display(), "Jar not found in server directory");
    }

    let descriptor = ServerDescriptor::new(name, dir, jar, ram).with_proxy(proxy);
    ctx.supervisor()
        .add_server(descriptor.clone())
        .await
        .map_err(CliError::from)?;

    println!("Server added:");
    display_server_summary(&descriptor, None);
    Ok(())
}

fn absolute_dir(dir: &Path) -> Result<PathBuf, CliError> {
    std::path::absolute(dir).map_err(CliError::from)
}
