//! The supervisor front ends talk to.
//!
//! Routes start/stop/send to per-server [`ProcessHandle`]s, owns the log
//! stream and the port scanner, and keeps the operator's selection (through
//! the registry). Each server's handle has its own lock, so stopping one
//! server never blocks work on another.

use srvman_core::{
    CoreError, LogEntry, LogSource, ProcessError, RegistryError, ServerDescriptor,
    ServerRegistry, SocketIntrospector, SupervisorSettings, validate_settings,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, RwLock, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::logs::LogStream;
use crate::portscan::{PortPage, PortPager, PortScanner, ScanSnapshot, TerminationReport};
use crate::process::{
    ProcessExit, ProcessHandle, ProcessInfo, READER_FLUSH_TIMEOUT, ServerEvent,
    ServerEventBroadcaster, StartOutcome, StopOutcome,
};

type SharedHandle = Arc<Mutex<ProcessHandle>>;

/// Background tasks bound to one run of a server.
struct RunTasks {
    drain: JoinHandle<usize>,
    cancel: CancellationToken,
    stop_requested: Arc<AtomicBool>,
}

/// Last scan plus the navigation state over it.
#[derive(Default)]
struct PortView {
    snapshot: Option<ScanSnapshot>,
    pager: PortPager,
    show_all: bool,
}

/// Coordinates the registry, server processes, logs and port scanning.
pub struct Supervisor {
    settings: SupervisorSettings,
    registry: RwLock<ServerRegistry>,
    handles: RwLock<HashMap<String, SharedHandle>>,
    runs: Mutex<HashMap<String, RunTasks>>,
    logs: Arc<LogStream>,
    events: Arc<ServerEventBroadcaster>,
    scanner: RwLock<PortScanner>,
    ports: Mutex<PortView>,
}

impl Supervisor {
    /// Build a supervisor over an already loaded registry.
    pub fn new(
        registry: ServerRegistry,
        introspector: Arc<dyn SocketIntrospector>,
        settings: SupervisorSettings,
    ) -> Result<Self, CoreError> {
        validate_settings(&settings)?;
        Ok(Self {
            logs: Arc::new(LogStream::with_max_lines(settings.max_log_lines)),
            scanner: RwLock::new(PortScanner::from_settings(introspector, &settings)),
            settings,
            registry: RwLock::new(registry),
            handles: RwLock::new(HashMap::new()),
            runs: Mutex::new(HashMap::new()),
            events: Arc::new(ServerEventBroadcaster::new()),
            ports: Mutex::new(PortView::default()),
        })
    }

    pub const fn settings(&self) -> &SupervisorSettings {
        &self.settings
    }

    pub fn logs(&self) -> &Arc<LogStream> {
        &self.logs
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ServerEvent> {
        self.events.subscribe()
    }

    pub fn subscribe_logs(&self) -> broadcast::Receiver<LogEntry> {
        self.logs.subscribe()
    }

    pub fn history(&self, name: &str) -> Vec<LogEntry> {
        self.logs.history(name)
    }

    // ---- registry -------------------------------------------------------

    pub async fn servers(&self) -> Vec<ServerDescriptor> {
        self.registry.read().await.list().to_vec()
    }

    pub async fn server(&self, name: &str) -> Option<ServerDescriptor> {
        self.registry.read().await.get(name).cloned()
    }

    pub async fn add_server(&self, descriptor: ServerDescriptor) -> Result<(), CoreError> {
        self.registry.write().await.add(descriptor)?;
        Ok(())
    }

    pub async fn update_server(
        &self,
        name: &str,
        descriptor: ServerDescriptor,
    ) -> Result<(), CoreError> {
        self.registry.write().await.update(name, descriptor)?;
        Ok(())
    }

    /// Unregister a server, stopping it first if it is running.
    pub async fn remove_server(&self, name: &str) -> Result<ServerDescriptor, CoreError> {
        if !self.registry.read().await.contains(name) {
            return Err(RegistryError::NotFound(name.to_string()).into());
        }
        if self.is_running(name).await {
            self.stop(name).await?;
        }
        let removed = self.registry.write().await.remove(name)?;
        self.handles.write().await.remove(name);
        Ok(removed)
    }

    pub async fn save(&self) -> Result<(), CoreError> {
        self.registry.read().await.save()?;
        Ok(())
    }

    pub async fn select(&self, name: &str) -> Result<ServerDescriptor, CoreError> {
        let mut registry = self.registry.write().await;
        let descriptor = registry.select(name)?.clone();
        debug!(server = %name, "Selected server");
        Ok(descriptor)
    }

    pub async fn clear_selection(&self) {
        self.registry.write().await.clear_selection();
    }

    pub async fn selected(&self) -> Option<ServerDescriptor> {
        self.registry.read().await.selected().cloned()
    }

    async fn selected_name(&self) -> Result<String, CoreError> {
        self.registry
            .read()
            .await
            .selected()
            .map(|s| s.name.clone())
            .ok_or(CoreError::NoSelection)
    }

    // ---- process lifecycle ----------------------------------------------

    /// Launch `name`. A server that is already running is left alone and
    /// an "already running" line is logged.
    pub async fn start(&self, name: &str) -> Result<StartOutcome, CoreError> {
        let descriptor = self
            .server(name)
            .await
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        let handle = self.handle_for(&descriptor).await;
        let mut guard = handle.lock().await;

        if guard.is_running() {
            let pid = guard.pid().unwrap_or_default();
            self.system_line(name, format!("Server {name} is already running (pid {pid})"));
            return Ok(StartOutcome::AlreadyRunning { pid });
        }
        guard.reap();
        guard.set_descriptor(descriptor);

        // Earlier output must land before this run's
        self.finish_run(name).await;

        let (sink, rx) = LogStream::channel(name);
        let outcome = match guard.start(sink) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.system_line(name, e.to_string());
                warn!(server = %name, error = %e, "Failed to start server");
                return Err(e.into());
            }
        };

        let cancel = CancellationToken::new();
        let drain = self.logs.spawn_drain(rx, cancel.clone());
        let stop_requested = Arc::new(AtomicBool::new(false));
        if let Some(exit_rx) = guard.exit_receiver() {
            self.spawn_exit_monitor(name, Arc::clone(&handle), exit_rx, Arc::clone(&stop_requested));
        }
        self.runs.lock().await.insert(
            name.to_string(),
            RunTasks {
                drain,
                cancel,
                stop_requested,
            },
        );

        self.events.broadcast(ServerEvent::Started {
            server: name.to_string(),
            pid: outcome.pid(),
        });
        Ok(outcome)
    }

    /// Stop `name` gracefully. Stopping a server that is not running is a
    /// logged no-op.
    pub async fn stop(&self, name: &str) -> Result<StopOutcome, CoreError> {
        let Some(handle) = self.existing_handle(name).await else {
            if !self.registry.read().await.contains(name) {
                return Err(RegistryError::NotFound(name.to_string()).into());
            }
            self.system_line(name, format!("Server {name} is not running"));
            return Ok(StopOutcome::NotRunning);
        };

        let mut guard = handle.lock().await;
        let Some(pid) = guard.pid().filter(|_| guard.is_running()) else {
            guard.reap();
            self.system_line(name, format!("Server {name} is not running"));
            return Ok(StopOutcome::NotRunning);
        };

        if let Some(run) = self.runs.lock().await.get(name) {
            run.stop_requested.store(true, Ordering::SeqCst);
        }
        self.events.broadcast(ServerEvent::Stopping {
            server: name.to_string(),
            pid,
        });

        let outcome = guard.stop().await;
        drop(guard);
        self.finish_run(name).await;

        if outcome == StopOutcome::NotRunning {
            self.system_line(name, format!("Server {name} is not running"));
            return Ok(outcome);
        }
        let (exit, forced) = match &outcome {
            StopOutcome::Stopped(exit) => (Some(exit.clone()), false),
            StopOutcome::Killed(exit) => (Some(exit.clone()), true),
            StopOutcome::NotRunning | StopOutcome::Abandoned { .. } => (None, true),
        };
        self.system_line(name, format!("Server {name} stopped"));
        info!(server = %name, forced, "Server stopped");
        self.events.broadcast(ServerEvent::Stopped {
            server: name.to_string(),
            exit,
            forced,
        });
        Ok(outcome)
    }

    /// Send one console line to `name`.
    ///
    /// The handle is only locked to fetch the run's writer, so a child that
    /// stops reading stdin cannot hold up `stop` on the same server.
    pub async fn send(&self, name: &str, text: &str) -> Result<(), CoreError> {
        let writer = match self.existing_handle(name).await {
            Some(handle) => handle.lock().await.command_writer(),
            None => Err(ProcessError::NotRunning(name.to_string())),
        };
        let result = match writer {
            Ok(writer) => writer.send(text).await,
            Err(e) => Err(e),
        };

        if let Err(ProcessError::NotRunning(_)) = &result {
            self.system_line(name, format!("Server {name} is not running, command not sent: {text}"));
        }
        result.map_err(CoreError::from)
    }

    pub async fn start_selected(&self) -> Result<StartOutcome, CoreError> {
        let name = self.selected_name().await?;
        self.start(&name).await
    }

    pub async fn stop_selected(&self) -> Result<StopOutcome, CoreError> {
        let name = self.selected_name().await?;
        self.stop(&name).await
    }

    pub async fn send_selected(&self, text: &str) -> Result<(), CoreError> {
        let name = self.selected_name().await?;
        self.send(&name, text).await
    }

    pub async fn is_running(&self, name: &str) -> bool {
        match self.existing_handle(name).await {
            Some(handle) => handle.lock().await.is_running(),
            None => false,
        }
    }

    /// Every running server, ordered by name.
    pub async fn running(&self) -> Vec<ProcessInfo> {
        let handles: Vec<SharedHandle> = self.handles.read().await.values().cloned().collect();
        let mut running = Vec::new();
        for handle in handles {
            let guard = handle.lock().await;
            if guard.is_running() {
                if let Some(info) = guard.info() {
                    running.push(info.clone());
                }
            }
        }
        running.sort_by(|a, b| a.server.cmp(&b.server));
        running
    }

    /// Stop every running server.
    pub async fn shutdown(&self) {
        for info in self.running().await {
            if let Err(e) = self.stop(&info.server).await {
                warn!(server = %info.server, error = %e, "Failed to stop server during shutdown");
            }
        }
    }

    // ---- ports ----------------------------------------------------------

    /// Rescan listening ports and return the first page.
    ///
    /// `show_all` bypasses the process name filter.
    pub async fn scan_ports(&self, show_all: bool) -> Result<PortPage, CoreError> {
        let snapshot = self.scanner.read().await.scan_listening()?;
        let mut view = self.ports.lock().await;
        view.snapshot = Some(snapshot);
        view.show_all = show_all;
        view.pager.reset();
        Ok(self.current_page(&mut view).await)
    }

    /// Page `index` of the last scan (scanning first if there is none).
    /// Pages past the end are empty.
    pub async fn port_page(&self, index: usize) -> Result<PortPage, CoreError> {
        self.ensure_scanned().await?;
        let view = self.ports.lock().await;
        let scanner = self.scanner.read().await;
        Ok(match &view.snapshot {
            Some(snapshot) if view.show_all => scanner.page_unfiltered(snapshot, index),
            Some(snapshot) => scanner.page(snapshot, index),
            None => crate::portscan::paginate(&[], index, scanner.page_size()),
        })
    }

    pub async fn next_ports_page(&self) -> Result<PortPage, CoreError> {
        self.ensure_scanned().await?;
        let mut view = self.ports.lock().await;
        view.pager.next();
        Ok(self.current_page(&mut view).await)
    }

    pub async fn prev_ports_page(&self) -> Result<PortPage, CoreError> {
        self.ensure_scanned().await?;
        let mut view = self.ports.lock().await;
        view.pager.prev();
        Ok(self.current_page(&mut view).await)
    }

    pub async fn set_port_filter(&self, filter: &str) {
        self.scanner.write().await.set_filter(filter);
        self.ports.lock().await.pager.reset();
    }

    /// Kill whatever is listening on each port.
    ///
    /// Outcomes are written to the selected server's log, or only to
    /// tracing when nothing is selected.
    pub async fn close_ports(&self, ports: &[u16]) -> Result<Vec<TerminationReport>, CoreError> {
        let selected = self.selected_name().await.ok();
        let snapshot = self.ports.lock().await.snapshot.clone();
        let scanner = self.scanner.read().await;

        let mut reports = Vec::with_capacity(ports.len());
        for &port in ports {
            let expected = snapshot.as_ref().and_then(|s| s.get(port));
            let report = scanner.terminate(port, expected)?;

            let lines: Vec<String> = if report.owners.is_empty() {
                vec![format!("Port {port}: nothing listening")]
            } else {
                report
                    .owners
                    .iter()
                    .map(|owner| format!("Port {port}: pid {} {}", owner.pid, owner.outcome))
                    .collect()
            };
            for line in lines {
                match &selected {
                    Some(name) => self.system_line(name, line),
                    None => info!("{}", line),
                }
            }
            reports.push(report);
        }
        Ok(reports)
    }

    // ---- internals ------------------------------------------------------

    fn system_line(&self, name: &str, line: impl Into<String>) {
        self.logs.append_line(name, LogSource::System, line);
    }

    async fn existing_handle(&self, name: &str) -> Option<SharedHandle> {
        self.handles.read().await.get(name).cloned()
    }

    async fn handle_for(&self, descriptor: &ServerDescriptor) -> SharedHandle {
        let mut handles = self.handles.write().await;
        Arc::clone(handles.entry(descriptor.name.clone()).or_insert_with(|| {
            Arc::new(Mutex::new(ProcessHandle::from_settings(
                descriptor.clone(),
                &self.settings,
            )))
        }))
    }

    /// Collect the previous run's drain task, cancelling it if the channel
    /// does not close in time.
    async fn finish_run(&self, name: &str) {
        let Some(mut run) = self.runs.lock().await.remove(name) else {
            return;
        };
        if timeout(READER_FLUSH_TIMEOUT, &mut run.drain).await.is_err() {
            debug!(server = %name, "Log channel still open, cancelling drain");
            run.cancel.cancel();
            let _ = run.drain.await;
        }
    }

    fn spawn_exit_monitor(
        &self,
        name: &str,
        handle: SharedHandle,
        mut exit_rx: watch::Receiver<Option<ProcessExit>>,
        stop_requested: Arc<AtomicBool>,
    ) {
        let name = name.to_string();
        let events = Arc::clone(&self.events);
        tokio::spawn(async move {
            let exit = match exit_rx.wait_for(Option::is_some).await {
                Ok(exit) => (*exit).clone().unwrap_or_else(|| ProcessExit::unknown("exit not recorded")),
                Err(_) => ProcessExit::unknown("exit watcher ended"),
            };

            if !stop_requested.load(Ordering::SeqCst) {
                warn!(server = %name, exit = %exit.description, "Server exited on its own");
                events.broadcast(ServerEvent::Exited {
                    server: name.clone(),
                    exit,
                });
            }
            // Release stdin and the run's log sink
            handle.lock().await.reap();
        });
    }

    async fn ensure_scanned(&self) -> Result<(), CoreError> {
        if self.ports.lock().await.snapshot.is_none() {
            self.scan_ports(false).await?;
        }
        Ok(())
    }

    async fn current_page(&self, view: &mut PortView) -> PortPage {
        let scanner = self.scanner.read().await;
        let Some(snapshot) = &view.snapshot else {
            return crate::portscan::paginate(&[], 0, scanner.page_size());
        };
        let total = if view.show_all {
            snapshot.len()
        } else {
            snapshot.filtered(scanner.filter()).len()
        };
        view.pager.update(total, scanner.page_size());
        let index = view.pager.index();
        if view.show_all {
            scanner.page_unfiltered(snapshot, index)
        } else {
            scanner.page(snapshot, index)
        }
    }
}
