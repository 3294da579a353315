//! OS process and socket introspection port.
//!
//! The port scanner never talks to the OS directly; it goes through this
//! trait so the correlation and termination logic can be tested against a
//! fake process table.

use serde::{Deserialize, Serialize};

use super::{ProcessAccessError, ScanError};

/// A TCP socket in the LISTEN state and the processes that hold it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListeningSocket {
    /// Local port number.
    pub port: u16,
    /// Owning pids. Empty when the OS would not tell us (access denied).
    pub pids: Vec<u32>,
}

impl ListeningSocket {
    pub fn new(port: u16, pids: Vec<u32>) -> Self {
        Self { port, pids }
    }
}

/// Identity of one OS process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessIdentity {
    pub pid: u32,
    pub name: String,
    /// Seconds since the epoch, if the OS reports it.
    pub start_time: Option<u64>,
}

impl ProcessIdentity {
    pub fn new(pid: u32, name: impl Into<String>) -> Self {
        Self {
            pid,
            name: name.into(),
            start_time: None,
        }
    }

    #[must_use]
    pub const fn with_start_time(mut self, start_time: u64) -> Self {
        self.start_time = Some(start_time);
        self
    }
}

/// Port for enumerating sockets and processes and killing processes.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
pub trait SocketIntrospector: Send + Sync {
    /// Every TCP socket (IPv4 and IPv6) currently in the LISTEN state.
    fn listening_sockets(&self) -> Result<Vec<ListeningSocket>, ScanError>;

    /// Every process currently visible to us.
    fn processes(&self) -> Vec<ProcessIdentity>;

    /// Look up a single process by pid.
    fn process(&self, pid: u32) -> Option<ProcessIdentity>;

    /// Forcibly kill a process.
    fn kill(&self, pid: u32) -> Result<(), ProcessAccessError>;
}
