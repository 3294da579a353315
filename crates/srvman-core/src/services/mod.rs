//! Core services.
//!
//! Services own in-memory state and persist it through ports. They never
//! touch the filesystem or OS directly.

mod server_registry;

pub use server_registry::{LoadReport, ServerRegistry};
