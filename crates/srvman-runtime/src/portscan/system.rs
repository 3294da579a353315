//! OS-backed socket and process introspection.
//!
//! Sockets come from `netstat2`, process identity from `sysinfo`, and kills
//! go through the same signal path used for supervised children.

use netstat2::{
    AddressFamilyFlags, ProtocolFlags, ProtocolSocketInfo, TcpState, iterate_sockets_info,
};
use srvman_core::{
    ListeningSocket, ProcessAccessError, ProcessIdentity, ScanError, SocketIntrospector,
};
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use sysinfo::{Pid, Process, ProcessesToUpdate, System};
use tracing::debug;

use crate::process::shutdown::send_kill;

/// [`SocketIntrospector`] over the live system tables.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemIntrospector;

impl SystemIntrospector {
    pub const fn new() -> Self {
        Self
    }

    fn identity(pid: Pid, process: &Process) -> ProcessIdentity {
        ProcessIdentity::new(pid.as_u32(), process.name().to_string_lossy())
            .with_start_time(process.start_time())
    }
}

impl SocketIntrospector for SystemIntrospector {
    fn listening_sockets(&self) -> Result<Vec<ListeningSocket>, ScanError> {
        let af = AddressFamilyFlags::IPV4 | AddressFamilyFlags::IPV6;
        let sockets =
            iterate_sockets_info(af, ProtocolFlags::TCP).map_err(|e| ScanError::Sockets(e.to_string()))?;

        // IPv4 and IPv6 listeners on the same port collapse into one entry
        let mut by_port: BTreeMap<u16, BTreeSet<u32>> = BTreeMap::new();
        for socket in sockets {
            let info = match socket {
                Ok(info) => info,
                Err(e) => {
                    debug!(error = %e, "Skipping unreadable socket entry");
                    continue;
                }
            };
            if let ProtocolSocketInfo::Tcp(ref tcp) = info.protocol_socket_info {
                if tcp.state == TcpState::Listen {
                    by_port
                        .entry(tcp.local_port)
                        .or_default()
                        .extend(info.associated_pids.iter().copied());
                }
            }
        }

        Ok(by_port
            .into_iter()
            .map(|(port, pids)| ListeningSocket::new(port, pids.into_iter().collect()))
            .collect())
    }

    fn processes(&self) -> Vec<ProcessIdentity> {
        let mut system = System::new();
        system.refresh_processes(ProcessesToUpdate::All, true);
        system
            .processes()
            .iter()
            .map(|(pid, process)| Self::identity(*pid, process))
            .collect()
    }

    fn process(&self, pid: u32) -> Option<ProcessIdentity> {
        let target = Pid::from_u32(pid);
        let mut system = System::new();
        system.refresh_processes(ProcessesToUpdate::Some(&[target]), true);
        system.process(target).map(|process| Self::identity(target, process))
    }

    fn kill(&self, pid: u32) -> Result<(), ProcessAccessError> {
        match send_kill(pid) {
            Ok(true) => Ok(()),
            Ok(false) => Err(ProcessAccessError::Vanished(pid)),
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                Err(ProcessAccessError::AccessDenied(pid))
            }
            Err(e) => Err(ProcessAccessError::Failed {
                pid,
                reason: e.to_string(),
            }),
        }
    }
}
