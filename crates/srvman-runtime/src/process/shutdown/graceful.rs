//! SIGTERM → SIGKILL escalation against a watched child.
//!
//! The `Child` is owned by its exit watcher task, so instead of awaiting
//! `child.wait()` here we wait for the watcher to publish the exit.

use std::time::Duration;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::signal::{send_kill, send_terminate};
use crate::process::types::ProcessExit;

/// How long to wait for the watcher after SIGKILL or after finding the
/// process already gone.
const KILL_WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ShutdownResult {
    /// Exited during the grace period (or had already exited).
    Exited(ProcessExit),
    /// Needed SIGKILL.
    Killed(ProcessExit),
    /// No exit observed even after SIGKILL.
    Unconfirmed(String),
}

/// Wait up to `limit` for the watcher to publish an exit.
pub(crate) async fn wait_for_exit(
    exit_rx: &mut watch::Receiver<Option<ProcessExit>>,
    limit: Duration,
) -> Option<ProcessExit> {
    match timeout(limit, exit_rx.wait_for(Option::is_some)).await {
        Ok(Ok(exit)) => (*exit).clone(),
        // Watcher dropped its sender without publishing; the child went with it
        Ok(Err(_)) => Some(ProcessExit::unknown("exit watcher ended")),
        Err(_) => None,
    }
}

/// Gracefully stop `pid`, escalating to SIGKILL after `grace`.
///
/// # Strategy
/// 1. Skip signalling if an exit was already observed
/// 2. Send SIGTERM and wait up to `grace`
/// 3. If still running, send SIGKILL and wait a short bound
pub(crate) async fn terminate_and_wait(
    pid: u32,
    exit_rx: &mut watch::Receiver<Option<ProcessExit>>,
    grace: Duration,
) -> ShutdownResult {
    if let Some(exit) = exit_rx.borrow().clone() {
        return ShutdownResult::Exited(exit);
    }

    // Phase 1: SIGTERM with grace period
    let waited = match send_terminate(pid) {
        Ok(true) => wait_for_exit(exit_rx, grace).await,
        Ok(false) => wait_for_exit(exit_rx, KILL_WAIT).await,
        Err(e) => {
            debug!(pid, error = %e, "SIGTERM not delivered, escalating");
            None
        }
    };
    if let Some(exit) = waited {
        return ShutdownResult::Exited(exit);
    }

    // Phase 2: SIGKILL
    warn!(pid, grace_secs = grace.as_secs(), "Process ignored SIGTERM, killing");
    let kill_error = match send_kill(pid) {
        Ok(_) => None,
        Err(e) => Some(e.to_string()),
    };

    match wait_for_exit(exit_rx, KILL_WAIT).await {
        Some(exit) => ShutdownResult::Killed(exit),
        None => ShutdownResult::Unconfirmed(kill_error.unwrap_or_else(|| {
            format!("process {pid} still running {}s after SIGKILL", KILL_WAIT.as_secs())
        })),
    }
}
