//! Listening port discovery and termination of the owning processes.
//!
//! The scanner works against the [`SocketIntrospector`] port; the
//! [`SystemIntrospector`] adapter backs it with the real OS tables.
//!
//! [`SocketIntrospector`]: srvman_core::SocketIntrospector

mod page;
mod scanner;
mod system;

pub use page::{PortPage, PortPager, paginate};
pub use scanner::{OwnerOutcome, PortScanner, ScanSnapshot, TerminationOutcome, TerminationReport};
pub use system::SystemIntrospector;
