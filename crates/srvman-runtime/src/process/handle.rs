//! One supervised server process.
//!
//! Each start spawns three tasks: a stdout reader, a stderr reader and an
//! exit watcher that owns the `Child`. The watcher waits for the child, gives
//! the readers a bounded time to flush, writes a final system line and then
//! publishes the exit on a watch channel. Anything observing that channel
//! therefore sees the exit only after the run's output is queued.

use srvman_core::{LogSource, ProcessError, ServerDescriptor, SupervisorSettings};
use std::io;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, warn};

use super::shutdown::{ShutdownResult, terminate_and_wait};
use super::stream::spawn_stream_reader;
use super::types::{ProcessExit, ProcessInfo, RunningProcess, StartOutcome, StopOutcome};
use crate::logs::LogSink;

/// Time the readers get to reach EOF once the child has exited.
pub const READER_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Writes console lines to one run's stdin.
///
/// Holds its own reference to the pipe, so a write blocked on a child that
/// stopped reading never keeps the owning [`ProcessHandle`] locked.
#[derive(Clone)]
pub struct CommandWriter {
    server: String,
    stdin: Arc<Mutex<ChildStdin>>,
    sink: LogSink,
}

impl CommandWriter {
    /// Echo `text` into the log as an operator entry, then write it plus a
    /// newline and flush. Write failures are logged as system entries.
    pub async fn send(&self, text: &str) -> Result<(), ProcessError> {
        let command = text.trim_end_matches(['\r', '\n']);
        let mut line = String::with_capacity(command.len() + 1);
        line.push_str(command);
        line.push('\n');

        let mut stdin = self.stdin.lock().await;
        self.sink.emit(LogSource::Operator, command);
        let written = match stdin.write_all(line.as_bytes()).await {
            Ok(()) => stdin.flush().await,
            Err(e) => Err(e),
        };

        written.map_err(|e| {
            self.sink.system(format!("Failed to send command: {e}"));
            warn!(server = %self.server, error = %e, "Failed to write to server stdin");
            ProcessError::Io {
                server: self.server.clone(),
                reason: e.to_string(),
            }
        })
    }
}

/// A run whose stop could not be confirmed. Its child may still be alive.
struct AbandonedRun {
    pid: u32,
    exit_rx: watch::Receiver<Option<ProcessExit>>,
}

/// Spawns, feeds and stops the process for one server descriptor.
pub struct ProcessHandle {
    descriptor: ServerDescriptor,
    java: String,
    stop_timeout: Duration,
    running: Option<RunningProcess>,
    abandoned: Option<AbandonedRun>,
    last_exit: Option<ProcessExit>,
}

impl ProcessHandle {
    pub fn new(descriptor: ServerDescriptor, java: impl Into<String>, stop_timeout: Duration) -> Self {
        Self {
            descriptor,
            java: java.into(),
            stop_timeout,
            running: None,
            abandoned: None,
            last_exit: None,
        }
    }

    pub fn from_settings(descriptor: ServerDescriptor, settings: &SupervisorSettings) -> Self {
        Self::new(
            descriptor,
            settings.java_executable.clone(),
            settings.stop_timeout(),
        )
    }

    pub fn descriptor(&self) -> &ServerDescriptor {
        &self.descriptor
    }

    /// Replace the descriptor. Takes effect on the next start.
    pub fn set_descriptor(&mut self, descriptor: ServerDescriptor) {
        self.descriptor = descriptor;
    }

    /// True while a child is alive and not yet observed to have exited.
    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| running.exited().is_none())
    }

    pub fn pid(&self) -> Option<u32> {
        self.running.as_ref().map(|running| running.info.pid)
    }

    pub fn info(&self) -> Option<&ProcessInfo> {
        self.running.as_ref().map(|running| &running.info)
    }

    /// Unix seconds when the current child was spawned.
    pub fn started_at(&self) -> Option<u64> {
        self.info().map(|info| info.started_at)
    }

    /// How the most recent run ended, once it has been collected.
    pub fn exit_status(&self) -> Option<&ProcessExit> {
        self.last_exit.as_ref()
    }

    /// Exit channel of the current run.
    pub fn exit_receiver(&self) -> Option<watch::Receiver<Option<ProcessExit>>> {
        self.running.as_ref().map(|running| running.exit_rx.clone())
    }

    /// Forget the current run if it has already exited.
    ///
    /// Returns the exit when a run was collected. Dropping the run closes
    /// the child's stdin and releases its log sink.
    pub fn reap(&mut self) -> Option<ProcessExit> {
        let exit = self.running.as_ref()?.exited()?;
        self.running = None;
        self.last_exit = Some(exit.clone());
        Some(exit)
    }

    /// Launch the server, attaching its output to `sink`.
    ///
    /// If a child is already running nothing is spawned; an "already running"
    /// line goes to `sink` instead. A child left behind by an unconfirmed
    /// stop blocks a new launch until its exit is observed.
    pub fn start(&mut self, sink: LogSink) -> Result<StartOutcome, ProcessError> {
        self.reap();
        if let Some(running) = &self.running {
            let pid = running.info.pid;
            sink.system(format!(
                "Server {} is already running (pid {pid})",
                self.descriptor.name
            ));
            return Ok(StartOutcome::AlreadyRunning { pid });
        }
        if let Some(pid) = self.abandoned_pid() {
            return Err(self.launch_error(format!(
                "previous process (pid {pid}) has not exited yet"
            )));
        }

        let name = self.descriptor.name.clone();
        let dir = &self.descriptor.working_directory;
        if !dir.is_dir() {
            return Err(self.launch_error(format!(
                "working directory {} does not exist",
                dir.display()
            )));
        }

        let args = self.descriptor.launch_args();
        let mut cmd = Command::new(&self.java);
        cmd.args(&args)
            .current_dir(dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(server = %name, java = %self.java, ?args, "Spawning server");
        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                self.launch_error(format!("java executable `{}` not found", self.java))
            } else {
                self.launch_error(e.to_string())
            }
        })?;

        let pid = child
            .id()
            .ok_or_else(|| self.launch_error("process exited before it could be tracked"))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| self.launch_error("stdin pipe unavailable"))?;

        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_stream_reader(stdout, LogSource::Stdout, sink.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_stream_reader(stderr, LogSource::Stderr, sink.clone()));
        }

        let (exit_tx, exit_rx) = watch::channel(None);
        spawn_exit_watcher(child, readers, sink.clone(), exit_tx);

        sink.system(format!("Started {name} (pid {pid})"));
        info!(server = %name, pid, "Server started");

        self.running = Some(RunningProcess::new(
            ProcessInfo::new(&name, pid),
            stdin,
            sink,
            exit_rx,
        ));
        Ok(StartOutcome::Started { pid })
    }

    /// Writer for the current run's console.
    pub fn command_writer(&mut self) -> Result<CommandWriter, ProcessError> {
        self.reap();
        let running = self
            .running
            .as_ref()
            .ok_or_else(|| ProcessError::NotRunning(self.descriptor.name.clone()))?;
        Ok(CommandWriter {
            server: self.descriptor.name.clone(),
            stdin: Arc::clone(&running.stdin),
            sink: running.sink.clone(),
        })
    }

    /// Write one line to the server's console.
    ///
    /// The command is echoed into the log as an operator entry. Write
    /// failures are logged as system entries and returned. Callers that
    /// share the handle should take a [`CommandWriter`] and release the
    /// handle before writing.
    pub async fn send_command(&mut self, text: &str) -> Result<(), ProcessError> {
        self.command_writer()?.send(text).await
    }

    /// Stop the server: SIGTERM, wait up to the stop timeout, then SIGKILL.
    ///
    /// Never fails. Problems are written to the run's log and reflected in
    /// the outcome; the handle is idle afterwards in every case.
    pub async fn stop(&mut self) -> StopOutcome {
        if self.reap().is_some() {
            return StopOutcome::NotRunning;
        }
        let Some(mut running) = self.running.take() else {
            return StopOutcome::NotRunning;
        };

        let pid = running.info.pid;
        let name = &self.descriptor.name;
        running.sink.system(format!("Stopping {name} (pid {pid})"));
        info!(server = %name, pid, "Stopping server");

        let outcome = match terminate_and_wait(pid, &mut running.exit_rx, self.stop_timeout).await {
            ShutdownResult::Exited(exit) => StopOutcome::Stopped(exit),
            ShutdownResult::Killed(exit) => {
                running.sink.system(format!(
                    "{name} did not stop within {}s and was killed",
                    self.stop_timeout.as_secs()
                ));
                StopOutcome::Killed(exit)
            }
            ShutdownResult::Unconfirmed(reason) => {
                running
                    .sink
                    .system(format!("Could not confirm that {name} stopped: {reason}"));
                warn!(server = %name, pid, %reason, "Stop unconfirmed");
                self.abandoned = Some(AbandonedRun {
                    pid,
                    exit_rx: running.exit_rx.clone(),
                });
                StopOutcome::Abandoned { pid, reason }
            }
        };

        if let StopOutcome::Stopped(exit) | StopOutcome::Killed(exit) = &outcome {
            self.last_exit = Some(exit.clone());
        }
        outcome
    }

    /// Pid of an abandoned child whose exit has not been observed yet.
    fn abandoned_pid(&mut self) -> Option<u32> {
        let abandoned = self.abandoned.as_ref()?;
        let pid = abandoned.pid;
        let exit = abandoned.exit_rx.borrow().clone();
        match exit {
            Some(exit) => {
                self.last_exit = Some(exit);
                self.abandoned = None;
                None
            }
            None => Some(pid),
        }
    }

    fn launch_error(&self, reason: impl Into<String>) -> ProcessError {
        ProcessError::Launch {
            server: self.descriptor.name.clone(),
            reason: reason.into(),
        }
    }
}

/// Own `child` until it exits, then flush readers and publish the exit.
fn spawn_exit_watcher(
    mut child: Child,
    readers: Vec<JoinHandle<usize>>,
    sink: LogSink,
    exit_tx: watch::Sender<Option<ProcessExit>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let exit = match child.wait().await {
            Ok(status) => ProcessExit::from_status(status),
            Err(e) => ProcessExit::unknown(format!("failed to wait for process: {e}")),
        };

        // Grandchildren can keep a pipe open forever
        let deadline = Instant::now() + READER_FLUSH_TIMEOUT;
        for mut reader in readers {
            if timeout_at(deadline, &mut reader).await.is_err() {
                reader.abort();
                debug!(server = sink.server(), "Output reader abandoned after exit");
            }
        }

        sink.system(format!("Process exited ({})", exit.description));
        debug!(server = sink.server(), ?exit, "Exit observed");
        exit_tx.send_replace(Some(exit));
    })
}
