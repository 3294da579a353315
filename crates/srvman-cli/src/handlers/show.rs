//! Show command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::display_server_summary;

/// Print one server's settings as text or JSON.
pub async fn execute(ctx: &CliContext, name: &str, json: bool) -> Result<()> {
    let supervisor = ctx.supervisor();
    let server = supervisor
        .server(name)
        .await
        .ok_or_else(|| CliError::NotFound(format!("Server {name} not found")))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&server)?);
        return Ok(());
    }

    let running = supervisor.running().await;
    display_server_summary(&server, running.iter().find(|r| r.server == server.name));
    Ok(())
}
