//! Console command handler.
//!
//! An interactive session over every registered server. One server at a
//! time is "selected"; its log is printed live and commands without an
//! explicit server name act on it. Lifecycle events of the other servers
//! are shown as one-line notices.

use anyhow::Result;
use srvman_core::LogEntry;
use srvman_runtime::{ServerEvent, StartOutcome, StopOutcome, Supervisor};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::bootstrap::CliContext;
use crate::presentation::{
    format_entry, format_status, print_port_page, print_termination_reports,
};

/// Lines shown by `logs` and on `select` when no count is given.
const DEFAULT_TAIL: usize = 20;

const HELP: &str = "\
Commands:
  list                   registered servers and their status
  select NAME            switch the live log to NAME
  start [NAME]           start NAME or the selected server
  stop [NAME]            stop NAME or the selected server
  send TEXT              send TEXT to the selected server's console
  logs [N]               last N lines of the selected server's log
  ports [FILTER|all]     scan listening ports
  next | prev            page through the last port scan
  close PORT...          kill whatever listens on PORT
  save                   write the server list to disk
  help                   this text
  quit | exit            stop every server and leave";

/// Which ports a `ports` command should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortScope {
    /// Use the filter already in effect.
    Current,
    /// Ignore the filter.
    All,
    /// Replace the filter, then scan.
    Filter(String),
}

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Help,
    List,
    Select(String),
    Start(Option<String>),
    Stop(Option<String>),
    Send(String),
    Logs(usize),
    Ports(PortScope),
    Next,
    Prev,
    Close(Vec<u16>),
    Save,
    Quit,
}

impl ConsoleCommand {
    /// Parse one input line. Blank lines parse to `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(word, rest)| (word, rest.trim()));
        let arg = (!rest.is_empty()).then(|| rest.to_string());

        let command = match word.to_ascii_lowercase().as_str() {
            "help" | "?" => Self::Help,
            "list" | "ls" => Self::List,
            "select" => Self::Select(arg.ok_or("usage: select NAME")?),
            "start" => Self::Start(arg),
            "stop" => Self::Stop(arg),
            // Keep the text exactly as typed apart from the command word
            "send" => Self::Send(arg.ok_or("usage: send TEXT")?),
            "logs" => Self::Logs(match arg {
                Some(n) => n
                    .parse()
                    .map_err(|_| format!("not a line count: {n}"))?,
                None => DEFAULT_TAIL,
            }),
            "ports" => Self::Ports(match arg.as_deref() {
                None => PortScope::Current,
                Some("all") => PortScope::All,
                Some(filter) => PortScope::Filter(filter.to_string()),
            }),
            "next" => Self::Next,
            "prev" => Self::Prev,
            "close" => {
                let ports = rest
                    .split_whitespace()
                    .map(|p| p.parse::<u16>().map_err(|_| format!("not a port: {p}")))
                    .collect::<Result<Vec<_>, _>>()?;
                if ports.is_empty() {
                    return Err("usage: close PORT...".to_string());
                }
                Self::Close(ports)
            }
            "save" => Self::Save,
            "quit" | "exit" => Self::Quit,
            other => return Err(format!("unknown command: {other} (try `help`)")),
        };
        Ok(Some(command))
    }
}

/// Execute the console command.
///
/// Leaving by `quit`, end of input or Ctrl-C stops every running server.
pub async fn execute(ctx: &CliContext) -> Result<()> {
    let supervisor = ctx.supervisor();
    let initial = supervisor.selected().await.map(|s| s.name);
    let (selection_tx, selection_rx) = watch::channel(initial);
    let printer = spawn_printer(
        supervisor.subscribe_logs(),
        supervisor.subscribe_events(),
        selection_rx,
    );

    println!("srvman console. Type `help` for commands.");
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = stdin.next_line() => line,
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Failed to read stdin");
                break;
            }
        };

        match ConsoleCommand::parse(&line) {
            Ok(None) => {}
            Ok(Some(ConsoleCommand::Quit)) => break,
            Ok(Some(command)) => {
                if let Err(e) = dispatch(supervisor, command, &selection_tx).await {
                    println!("error: {e}");
                }
            }
            Err(message) => println!("{message}"),
        }
    }

    println!("Stopping running servers...");
    supervisor.shutdown().await;
    printer.abort();
    Ok(())
}

async fn dispatch(
    supervisor: &Supervisor,
    command: ConsoleCommand,
    selection: &watch::Sender<Option<String>>,
) -> Result<()> {
    match command {
        ConsoleCommand::Help => println!("{HELP}"),
        ConsoleCommand::List => {
            let running = supervisor.running().await;
            let selected = selection.borrow().clone();
            for server in supervisor.servers().await {
                let marker = if selected.as_deref() == Some(server.name.as_str()) {
                    '*'
                } else {
                    ' '
                };
                let info = running.iter().find(|r| r.server == server.name);
                println!("{marker} {:<20} {}", server.name, format_status(info));
            }
        }
        ConsoleCommand::Select(name) => {
            let server = supervisor.select(&name).await?;
            for entry in supervisor.logs().tail(&server.name, DEFAULT_TAIL) {
                println!("{}", format_entry(&entry));
            }
            selection.send_replace(Some(server.name.clone()));
            println!("Selected {}", server.name);
        }
        ConsoleCommand::Start(name) => {
            let outcome = match name {
                Some(name) => supervisor.start(&name).await?,
                None => supervisor.start_selected().await?,
            };
            if let StartOutcome::Started { pid } = outcome {
                debug!(pid, "Started from console");
            }
        }
        ConsoleCommand::Stop(name) => {
            let outcome = match name {
                Some(name) => supervisor.stop(&name).await?,
                None => supervisor.stop_selected().await?,
            };
            if let StopOutcome::Abandoned { pid, reason } = outcome {
                println!("Could not confirm that pid {pid} stopped: {reason}");
            }
        }
        ConsoleCommand::Send(text) => supervisor.send_selected(&text).await?,
        ConsoleCommand::Logs(count) => {
            let Some(name) = selection.borrow().clone() else {
                println!("No server selected (use `select NAME`)");
                return Ok(());
            };
            for entry in supervisor.logs().tail(&name, count) {
                println!("{}", format_entry(&entry));
            }
        }
        ConsoleCommand::Ports(scope) => {
            let page = match scope {
                PortScope::Current => supervisor.scan_ports(false).await?,
                PortScope::All => supervisor.scan_ports(true).await?,
                PortScope::Filter(filter) => {
                    supervisor.set_port_filter(&filter).await;
                    supervisor.scan_ports(false).await?
                }
            };
            print_port_page(&page);
        }
        ConsoleCommand::Next => print_port_page(&supervisor.next_ports_page().await?),
        ConsoleCommand::Prev => print_port_page(&supervisor.prev_ports_page().await?),
        ConsoleCommand::Close(ports) => {
            let reports = supervisor.close_ports(&ports).await?;
            // The selected server's log already shows these
            if selection.borrow().is_none() {
                print_termination_reports(&reports);
            }
        }
        ConsoleCommand::Save => {
            supervisor.save().await?;
            println!("Server list saved.");
        }
        ConsoleCommand::Quit => {}
    }
    Ok(())
}

/// Print the selected server's log live, plus notices for the others.
fn spawn_printer(
    mut logs: broadcast::Receiver<LogEntry>,
    mut events: broadcast::Receiver<ServerEvent>,
    selection: watch::Receiver<Option<String>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                entry = logs.recv() => match entry {
                    Ok(entry) => {
                        if selection.borrow().as_deref() == Some(entry.server.as_str()) {
                            println!("{}", format_entry(&entry));
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => warn!(skipped, "Log output fell behind"),
                    Err(RecvError::Closed) => break,
                },
                event = events.recv() => match event {
                    Ok(event) => {
                        if selection.borrow().as_deref() != Some(event.server()) {
                            if let Some(notice) = event_notice(&event) {
                                println!("{notice}");
                            }
                        }
                    }
                    Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => break,
                },
            }
        }
    })
}

fn event_notice(event: &ServerEvent) -> Option<String> {
    match event {
        ServerEvent::Started { server, pid } => Some(format!("* {server} started (pid {pid})")),
        ServerEvent::Stopping { .. } => None,
        ServerEvent::Stopped { server, .. } => Some(format!("* {server} stopped")),
        ServerEvent::Exited { server, exit } => {
            Some(format!("! {server} exited ({})", exit.description))
        }
    }
}
