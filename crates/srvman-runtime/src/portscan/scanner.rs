//! Port → owner correlation and owner termination.

use serde::Serialize;
use srvman_core::{
    PortRecord, ProcessAccessError, ProcessIdentity, ScanError, SocketIntrospector,
    SupervisorSettings,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::page::{PortPage, paginate};

/// Listening ports at one point in time, ordered by port.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSnapshot {
    records: BTreeMap<u16, PortRecord>,
}

impl ScanSnapshot {
    pub fn get(&self, port: u16) -> Option<&PortRecord> {
        self.records.get(&port)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &PortRecord> {
        self.records.values()
    }

    /// Records whose process name contains `filter` (case-insensitive).
    pub fn filtered(&self, filter: &str) -> Vec<PortRecord> {
        self.records
            .values()
            .filter(|record| record.matches_name(filter))
            .cloned()
            .collect()
    }
}

/// What happened to one owner of a port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "camelCase")]
pub enum TerminationOutcome {
    Killed,
    /// Gone before we got to it.
    Vanished,
    AccessDenied,
    /// The pid now belongs to a different process than the one scanned.
    PidReused,
    Failed(String),
}

impl fmt::Display for TerminationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Killed => f.write_str("killed"),
            Self::Vanished => f.write_str("already gone"),
            Self::AccessDenied => f.write_str("access denied"),
            Self::PidReused => f.write_str("pid reused by another process, skipped"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnerOutcome {
    pub pid: u32,
    pub outcome: TerminationOutcome,
}

/// Result of terminating the owners of one port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerminationReport {
    pub port: u16,
    /// One entry per owning process. Empty if nothing was listening.
    pub owners: Vec<OwnerOutcome>,
}

impl TerminationReport {
    pub fn killed(&self) -> usize {
        self.owners
            .iter()
            .filter(|o| o.outcome == TerminationOutcome::Killed)
            .count()
    }
}

/// Scans listening TCP sockets and kills their owners.
pub struct PortScanner {
    introspector: Arc<dyn SocketIntrospector>,
    filter: String,
    page_size: usize,
}

impl PortScanner {
    pub fn new(introspector: Arc<dyn SocketIntrospector>, filter: impl Into<String>, page_size: usize) -> Self {
        Self {
            introspector,
            filter: filter.into(),
            page_size: page_size.max(1),
        }
    }

    pub fn from_settings(introspector: Arc<dyn SocketIntrospector>, settings: &SupervisorSettings) -> Self {
        Self::new(introspector, settings.port_filter.clone(), settings.page_size)
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into();
    }

    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Map every listening port to the process holding it.
    ///
    /// Builds a pid → ports index in one pass over the socket table and
    /// resolves each pid once. Sockets without a resolvable owner are
    /// skipped. When several processes share a port the lowest pid is kept.
    pub fn scan_listening(&self) -> Result<ScanSnapshot, ScanError> {
        let sockets = self.introspector.listening_sockets()?;

        let mut by_pid: HashMap<u32, Vec<u16>> = HashMap::new();
        let mut unowned = 0usize;
        for socket in &sockets {
            if socket.pids.is_empty() {
                unowned += 1;
            }
            for &pid in &socket.pids {
                by_pid.entry(pid).or_default().push(socket.port);
            }
        }

        let processes: HashMap<u32, ProcessIdentity> = self
            .introspector
            .processes()
            .into_iter()
            .filter(|p| by_pid.contains_key(&p.pid))
            .map(|p| (p.pid, p))
            .collect();

        let mut records: BTreeMap<u16, PortRecord> = BTreeMap::new();
        for (pid, ports) in by_pid {
            let Some(identity) = processes.get(&pid) else {
                unowned += 1;
                continue;
            };
            for port in ports {
                let replace = records.get(&port).is_none_or(|existing| pid < existing.pid);
                if replace {
                    let mut record = PortRecord::new(port, pid, identity.name.clone());
                    record.start_time = identity.start_time;
                    records.insert(port, record);
                }
            }
        }

        debug!(
            sockets = sockets.len(),
            ports = records.len(),
            unowned,
            "Scanned listening sockets"
        );
        Ok(ScanSnapshot { records })
    }

    /// Page `index` of the snapshot after applying the name filter.
    pub fn page(&self, snapshot: &ScanSnapshot, index: usize) -> PortPage {
        paginate(&snapshot.filtered(&self.filter), index, self.page_size)
    }

    /// Page `index` of the snapshot, ignoring the name filter.
    pub fn page_unfiltered(&self, snapshot: &ScanSnapshot, index: usize) -> PortPage {
        paginate(&snapshot.filtered(""), index, self.page_size)
    }

    /// Force-kill every process currently listening on `port`.
    ///
    /// Owners are re-resolved now, not taken from an old snapshot. When
    /// `expected` is the snapshot record for this port and carries a start
    /// time, a live process with that pid but a different start time is
    /// left alone. One owner failing never stops the others.
    pub fn terminate(
        &self,
        port: u16,
        expected: Option<&PortRecord>,
    ) -> Result<TerminationReport, ScanError> {
        let owners: BTreeSet<u32> = self
            .introspector
            .listening_sockets()?
            .into_iter()
            .filter(|socket| socket.port == port)
            .flat_map(|socket| socket.pids)
            .collect();

        if owners.is_empty() {
            debug!(port, "Nothing listening");
        }

        let owners = owners
            .into_iter()
            .map(|pid| OwnerOutcome {
                pid,
                outcome: self.terminate_owner(pid, expected.filter(|e| e.port == port)),
            })
            .collect::<Vec<_>>();

        for owner in &owners {
            match owner.outcome {
                TerminationOutcome::Killed => info!(port, pid = owner.pid, "Killed port owner"),
                _ => warn!(port, pid = owner.pid, outcome = %owner.outcome, "Port owner not killed"),
            }
        }

        Ok(TerminationReport { port, owners })
    }

    fn terminate_owner(&self, pid: u32, expected: Option<&PortRecord>) -> TerminationOutcome {
        if let Some(expected_start) = expected.filter(|e| e.pid == pid).and_then(|e| e.start_time) {
            match self.introspector.process(pid) {
                None => return TerminationOutcome::Vanished,
                Some(current) if current.start_time.is_some_and(|t| t != expected_start) => {
                    return TerminationOutcome::PidReused;
                }
                Some(_) => {}
            }
        }

        match self.introspector.kill(pid) {
            Ok(()) => TerminationOutcome::Killed,
            Err(ProcessAccessError::Vanished(_)) => TerminationOutcome::Vanished,
            Err(ProcessAccessError::AccessDenied(_)) => TerminationOutcome::AccessDenied,
            Err(ProcessAccessError::Failed { reason, .. }) => TerminationOutcome::Failed(reason),
        }
    }
}
