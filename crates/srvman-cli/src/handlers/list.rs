//! List command handler.
//!
//! Displays all registered servers with their current status.

use anyhow::Result;
use serde_json::json;

use crate::bootstrap::CliContext;
use crate::presentation::{format_status, print_separator, truncate_string};

/// Execute the list command.
///
/// Prints a table, or a JSON array when `json` is set.
pub async fn execute(ctx: &CliContext, json: bool) -> Result<()> {
    let supervisor = ctx.supervisor();
    let servers = supervisor.servers().await;
    let running = supervisor.running().await;
    let selected = supervisor.selected().await.map(|s| s.name);

    if json {
        let entries: Vec<_> = servers
            .iter()
            .map(|server| {
                let pid = running.iter().find(|r| r.server == server.name).map(|r| r.pid);
                json!({
                    "server": server,
                    "running": pid.is_some(),
                    "pid": pid,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if servers.is_empty() {
        println!("No servers registered.");
        println!("Use 'srvman add --name NAME --dir DIR --jar FILE --ram GIB' to add one.");
        return Ok(());
    }

    println!("{} server(s) in {}:\n", servers.len(), ctx.config_path.display());
    println!(
        "  {:<20} {:<8} {:<6} {:<22} Directory",
        "Name", "Heap", "Proxy", "Status"
    );
    print_separator(90);

    for server in &servers {
        let marker = if selected.as_deref() == Some(server.name.as_str()) {
            '*'
        } else {
            ' '
        };
        let info = running.iter().find(|r| r.server == server.name);
        println!(
            "{marker} {:<20} {:<8} {:<6} {:<22} {}",
            truncate_string(&server.name, 20),
            format!("{}G", server.max_heap_gib),
            if server.is_proxy { "yes" } else { "no" },
            format_status(info),
            server.working_directory.display()
        );
    }

    Ok(())
}
