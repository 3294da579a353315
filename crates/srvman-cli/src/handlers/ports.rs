//! Ports command handler.
//!
//! Scans listening TCP ports and prints one page of the result.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::print_port_page;

/// Execute the ports command.
///
/// `page` is one-based, as typed by the user.
pub async fn execute(ctx: &CliContext, filter: Option<&str>, all: bool, page: u64) -> Result<()> {
    let supervisor = ctx.supervisor();
    if let Some(filter) = filter {
        supervisor.set_port_filter(filter).await;
    }

    let first = supervisor.scan_ports(all).await.map_err(CliError::from)?;
    let index = usize::try_from(page.saturating_sub(1))
        .map_err(|_| CliError::Arguments(format!("page {page} is out of range")))?;
    let page = if index == 0 {
        first
    } else {
        supervisor.port_page(index).await.map_err(CliError::from)?
    };

    if !all {
        let filter = filter.unwrap_or(&supervisor.settings().port_filter);
        println!("Listening ports owned by processes matching '{filter}':");
    }
    print_port_page(&page);
    Ok(())
}
