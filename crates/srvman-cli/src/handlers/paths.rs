//! Paths command handler.
//!
//! Displays the resolved storage locations for diagnostics.

use anyhow::Result;
use srvman_core::data_root;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Print the config file in use and the default data directory.
pub fn execute(ctx: &CliContext) -> Result<()> {
    let root = data_root().map_err(CliError::from)?;
    println!("config_file = {}", ctx.config_path.display());
    println!("config_exists = {}", ctx.config_path.exists());
    println!("data_root = {}", root.display());
    Ok(())
}
