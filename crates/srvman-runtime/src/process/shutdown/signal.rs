//! Signal delivery by pid.
//!
//! The pid of a supervised child stays reserved until its exit watcher reaps
//! it, so signalling by pid cannot hit an unrelated process as long as the
//! caller checked that no exit has been observed yet.

use std::io;

#[cfg(unix)]
use nix::errno::Errno;
#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// Ask a process to shut down (SIGTERM).
///
/// Returns `Ok(false)` if the process is already gone. On platforms without
/// a graceful signal this returns `ErrorKind::Unsupported` and the caller
/// should escalate to [`send_kill`].
pub fn send_terminate(pid: u32) -> io::Result<bool> {
    #[cfg(unix)]
    {
        deliver(pid, Signal::SIGTERM)
    }

    #[cfg(not(unix))]
    {
        let _ = pid;
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "no graceful termination signal on this platform",
        ))
    }
}

/// Force-kill a process.
///
/// Returns `Ok(false)` if the process is already gone.
pub fn send_kill(pid: u32) -> io::Result<bool> {
    #[cfg(unix)]
    {
        deliver(pid, Signal::SIGKILL)
    }

    #[cfg(not(unix))]
    {
        kill_with_sysinfo(pid)
    }
}

#[cfg(unix)]
fn deliver(pid: u32, sig: Signal) -> io::Result<bool> {
    let raw = i32::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, format!("pid {pid} out of range")))?;
    match signal::kill(Pid::from_raw(raw), sig) {
        Ok(()) => Ok(true),
        Err(Errno::ESRCH) => Ok(false),
        Err(e) => Err(io::Error::from(e)),
    }
}

#[cfg(not(unix))]
fn kill_with_sysinfo(pid: u32) -> io::Result<bool> {
    use sysinfo::{Pid, ProcessesToUpdate, System};

    let target = Pid::from_u32(pid);
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[target]), true);
    match system.process(target) {
        Some(process) if process.kill() => Ok(true),
        Some(_) => Err(io::Error::other(format!("failed to kill process {pid}"))),
        None => Ok(false),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::process::Command;

    #[test]
    fn test_terminate_running_process() {
        let mut child = Command::new("sleep").arg("30").spawn().unwrap();
        assert!(send_terminate(child.id()).unwrap());

        let status = child.wait().unwrap();
        assert!(!status.success());
    }

    #[test]
    fn test_signal_reaped_process_reports_gone() {
        let mut child = Command::new("true").spawn().unwrap();
        let pid = child.id();
        child.wait().unwrap();

        assert!(!send_kill(pid).unwrap());
    }
}
