//! Close command handler.
//!
//! Kills whatever is listening on the given ports.

use anyhow::Result;

use srvman_runtime::TerminationOutcome;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::print_termination_reports;

/// Execute the close command.
///
/// Fails with a process error when a port that had listeners still has an
/// owner we could not get rid of.
pub async fn execute(ctx: &CliContext, ports: &[u16]) -> Result<()> {
    let supervisor = ctx.supervisor();
    // A fresh scan gives the pid-reuse check something to compare against
    supervisor.scan_ports(true).await.map_err(CliError::from)?;
    let reports = supervisor.close_ports(ports).await.map_err(CliError::from)?;
    print_termination_reports(&reports);

    let stuck: Vec<u16> = reports
        .iter()
        .filter(|r| r.owners.iter().any(|o| !is_freed(&o.outcome)))
        .map(|r| r.port)
        .collect();
    if !stuck.is_empty() {
        return Err(CliError::Process(format!("could not free port(s) {stuck:?}")).into());
    }
    Ok(())
}

const fn is_freed(outcome: &TerminationOutcome) -> bool {
    matches!(outcome, TerminationOutcome::Killed | TerminationOutcome::Vanished)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vanished_owner_counts_as_freed() {
        assert!(is_freed(&TerminationOutcome::Killed));
        assert!(is_freed(&TerminationOutcome::Vanished));
        assert!(!is_freed(&TerminationOutcome::AccessDenied));
        assert!(!is_freed(&TerminationOutcome::PidReused));
        assert!(!is_freed(&TerminationOutcome::Failed("EIO".into())));
    }
}
