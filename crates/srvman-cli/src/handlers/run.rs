//! Run command handler.
//!
//! Starts one server and attaches the terminal to it: its log is streamed
//! to stdout and every stdin line is sent to its console. Ctrl-C stops the
//! server gracefully; the command returns once the server is gone.

use anyhow::Result;
use srvman_core::{LogEntry, LogSource};
use srvman_runtime::{ServerEvent, StartOutcome, StopOutcome};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::{Instant, timeout_at};
use tracing::{debug, warn};

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::format_entry;

/// How long to keep printing after an exit is reported.
const EXIT_FLUSH: Duration = Duration::from_secs(2);

/// Execute the run command.
pub async fn execute(ctx: &CliContext, name: &str) -> Result<()> {
    let supervisor = ctx.supervisor();
    // Subscribe first so the first lines of output are not missed
    let mut logs = supervisor.subscribe_logs();
    let mut events = supervisor.subscribe_events();

    match supervisor.start(name).await.map_err(CliError::from)? {
        StartOutcome::Started { pid } => debug!(server = %name, pid, "Attached to server"),
        StartOutcome::AlreadyRunning { pid } => {
            return Err(CliError::Process(format!(
                "{name} is already running (pid {pid})"
            ))
            .into());
        }
    }

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            entry = logs.recv() => match entry {
                Ok(entry) => print_if_ours(&entry, name),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Log output fell behind"),
                Err(RecvError::Closed) => break,
            },
            event = events.recv() => match event {
                Ok(ServerEvent::Exited { server, exit }) if server == name => {
                    flush_until_exit_line(&mut logs, name).await;
                    if exit.success {
                        return Ok(());
                    }
                    return Err(CliError::Process(format!(
                        "{name} exited unexpectedly ({})",
                        exit.description
                    ))
                    .into());
                }
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            },
            line = stdin.next_line(), if stdin_open => match line {
                Ok(Some(line)) if line.trim().is_empty() => {}
                Ok(Some(line)) => {
                    if let Err(e) = supervisor.send(name, &line).await {
                        warn!(server = %name, error = %e, "Command not delivered");
                    }
                }
                // Stay attached without stdin, e.g. under nohup
                Ok(None) => stdin_open = false,
                Err(e) => {
                    warn!(error = %e, "Failed to read stdin");
                    stdin_open = false;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                println!();
                let outcome = supervisor.stop(name).await.map_err(CliError::from)?;
                drain_ready(&mut logs, name);
                return match outcome {
                    StopOutcome::Abandoned { pid, reason } => Err(CliError::Process(format!(
                        "could not confirm that {name} (pid {pid}) stopped: {reason}"
                    ))
                    .into()),
                    StopOutcome::NotRunning | StopOutcome::Stopped(_) | StopOutcome::Killed(_) => Ok(()),
                };
            }
        }
    }

    Ok(())
}

fn print_if_ours(entry: &LogEntry, name: &str) {
    if entry.server == name {
        println!("{}", format_entry(entry));
    }
}

/// Print whatever is already queued for `name`.
fn drain_ready(logs: &mut broadcast::Receiver<LogEntry>, name: &str) {
    loop {
        match logs.try_recv() {
            Ok(entry) => print_if_ours(&entry, name),
            Err(broadcast::error::TryRecvError::Lagged(_)) => {}
            Err(_) => break,
        }
    }
}

/// The exit event can overtake the run's last lines. Keep printing until
/// the "Process exited" line shows up, or give up after `EXIT_FLUSH`.
async fn flush_until_exit_line(logs: &mut broadcast::Receiver<LogEntry>, name: &str) {
    let deadline = Instant::now() + EXIT_FLUSH;
    while let Ok(received) = timeout_at(deadline, logs.recv()).await {
        match received {
            Ok(entry) => {
                print_if_ours(&entry, name);
                if is_exit_line(&entry, name) {
                    break;
                }
            }
            Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => break,
        }
    }
}

fn is_exit_line(entry: &LogEntry, name: &str) -> bool {
    entry.server == name
        && entry.source == LogSource::System
        && entry.line.starts_with("Process exited")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_exit_line() {
        let exit = LogEntry::new("survival", LogSource::System, "Process exited (exit status: 0)");
        let other_server = LogEntry::new("lobby", LogSource::System, "Process exited (exit status: 0)");
        let output = LogEntry::new("survival", LogSource::Stdout, "Process exited (exit status: 0)");

        assert!(is_exit_line(&exit, "survival"));
        assert!(!is_exit_line(&other_server, "survival"));
        assert!(!is_exit_line(&output, "survival"));
    }

    #[tokio::test]
    async fn test_flush_stops_at_exit_line() {
        let (tx, mut rx) = broadcast::channel(16);
        tx.send(LogEntry::new("survival", LogSource::Stdout, "Stopping server")).unwrap();
        tx.send(LogEntry::new("survival", LogSource::System, "Process exited (exit status: 0)"))
            .unwrap();
        tx.send(LogEntry::new("survival", LogSource::Stdout, "after")).unwrap();

        flush_until_exit_line(&mut rx, "survival").await;
        assert_eq!(rx.try_recv().unwrap().line, "after");
    }

    #[tokio::test]
    async fn test_flush_gives_up_without_exit_line() {
        let (tx, mut rx) = broadcast::channel(16);
        tx.send(LogEntry::new("survival", LogSource::Stdout, "still going")).unwrap();

        let started = Instant::now();
        flush_until_exit_line(&mut rx, "survival").await;
        assert!(started.elapsed() >= EXIT_FLUSH);
    }
}
