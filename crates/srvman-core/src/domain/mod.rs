//! Domain types.
//!
//! Pure data with no infrastructure dependencies. Everything here is
//! serializable so adapters can hand it to a front end unchanged.

mod log;
mod port;
mod server;

pub use log::{LogEntry, LogSource};
pub use port::PortRecord;
pub use server::{DescriptorError, ServerDescriptor};
