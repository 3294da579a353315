//! Shared CLI presentation utilities.
//!
//! Format-only helpers for consistent terminal output across commands.
//! Nothing here talks to the supervisor.

pub mod server_display;
pub mod tables;

// Re-export commonly used items
pub use server_display::{display_server_summary, format_entry, format_status};
pub use tables::{
    format_optional, print_port_page, print_separator, print_termination_reports,
    truncate_string,
};
