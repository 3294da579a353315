//! Process runtime and OS-level concerns for srvman.
//!
//! - [`process`]: spawning game servers, capturing their output, stopping them
//! - [`logs`]: per-server log buffers fed by tagged, unbounded channels
//! - [`portscan`]: listening socket enumeration and owner termination
//! - [`supervisor`]: the facade front ends talk to
#![deny(unsafe_code)]

pub mod logs;
pub mod portscan;
pub mod process;
pub mod supervisor;

pub use logs::{LogReceiver, LogSink, LogStream};
pub use portscan::{
    PortPage, PortPager, PortScanner, ScanSnapshot, SystemIntrospector, TerminationOutcome,
    TerminationReport, paginate,
};
pub use process::{
    CommandWriter, ProcessExit, ProcessHandle, ProcessInfo, ServerEvent, ServerEventBroadcaster,
    ServerStatus, StartOutcome, StopOutcome,
};
pub use supervisor::Supervisor;
