//! Remove command handler.
//!
//! Unregisters a server. Its files on disk are left alone.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Execute the remove command.
pub async fn execute(ctx: &CliContext, name: &str) -> Result<()> {
    let removed = ctx
        .supervisor()
        .remove_server(name)
        .await
        .map_err(CliError::from)?;

    println!("Server '{}' removed.", removed.name);
    println!(
        "Note: the directory '{}' remains on disk.",
        removed.working_directory.display()
    );
    Ok(())
}
