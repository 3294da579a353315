//! Table formatting utilities for CLI output.

use srvman_runtime::{PortPage, TerminationReport};

/// Truncates a string to a maximum length, adding "..." if needed.
///
/// Counts characters, not bytes, so names with multi-byte characters
/// are never split inside a character.
///
/// # Examples
///
/// ```rust
/// use srvman_cli::presentation::truncate_string;
///
/// assert_eq!(truncate_string("Hello", 10), "Hello");
/// assert_eq!(truncate_string("Hello World", 8), "Hello...");
/// ```
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Print a horizontal separator line.
pub fn print_separator(width: usize) {
    println!("{}", "-".repeat(width));
}

/// Format an optional value for table display, returning a default if None.
pub fn format_optional<T: std::fmt::Display>(value: &Option<T>, default: &str) -> String {
    match value {
        Some(v) => v.to_string(),
        None => default.to_string(),
    }
}

/// Print one page of a port scan as a table.
pub fn print_port_page(page: &PortPage) {
    if page.total == 0 {
        println!("No listening ports matched.");
        return;
    }

    println!("{:<8} {:<10} {:<30}", "PORT", "PID", "PROCESS");
    print_separator(50);
    if page.is_empty() {
        println!("(no entries on this page)");
    }
    for record in &page.records {
        println!(
            "{:<8} {:<10} {:<30}",
            record.port,
            record.pid,
            truncate_string(&record.process_name, 30)
        );
    }
    print_separator(50);
    println!(
        "Page {} of {} ({} port{})",
        page.index + 1,
        page.page_count,
        page.total,
        if page.total == 1 { "" } else { "s" }
    );
}

/// Print what happened to each port's owners.
pub fn print_termination_reports(reports: &[TerminationReport]) {
    for report in reports {
        if report.owners.is_empty() {
            println!("Port {}: nothing listening", report.port);
            continue;
        }
        for owner in &report.owners {
            println!("Port {}: pid {} {}", report.port, owner.pid, owner.outcome);
        }
    }
}
