//! Server and log line display utilities.

use srvman_core::{LogEntry, LogSource, ServerDescriptor};
use srvman_runtime::ProcessInfo;

/// Display a server's settings to stdout.
pub fn display_server_summary(server: &ServerDescriptor, running: Option<&ProcessInfo>) {
    println!("  Name: {}", server.name);
    println!("  Directory: {}", server.working_directory.display());
    println!("  Jar: {}", server.entry_file);
    println!("  Max heap: {} GiB", server.max_heap_gib);
    println!("  Proxy: {}", if server.is_proxy { "yes" } else { "no" });
    println!("  Status: {}", format_status(running));
    println!("  Launch: java {}", server.launch_args().join(" "));
}

/// "running (pid N)" or "stopped".
pub fn format_status(running: Option<&ProcessInfo>) -> String {
    running.map_or_else(
        || "stopped".to_string(),
        |info| format!("running (pid {})", info.pid),
    )
}

/// One log line as shown in a console.
///
/// Child output is printed as-is. Operator and system lines get a marker
/// so they stand out from the server's own output.
pub fn format_entry(entry: &LogEntry) -> String {
    match entry.source {
        LogSource::Stdout => entry.line.clone(),
        LogSource::Stderr => format!("[stderr] {}", entry.line),
        LogSource::Operator => format!("> {}", entry.line),
        LogSource::System => format!("[srvman] {}", entry.line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_entry_marks_non_output_lines() {
        let out = LogEntry::new("survival", LogSource::Stdout, "Done (3.2s)!");
        let err = LogEntry::new("survival", LogSource::Stderr, "WARN low memory");
        let cmd = LogEntry::new("survival", LogSource::Operator, "say hi");
        let sys = LogEntry::new("survival", LogSource::System, "Started survival (pid 7)");

        assert_eq!(format_entry(&out), "Done (3.2s)!");
        assert_eq!(format_entry(&err), "[stderr] WARN low memory");
        assert_eq!(format_entry(&cmd), "> say hi");
        assert_eq!(format_entry(&sys), "[srvman] Started survival (pid 7)");
    }

    #[test]
    fn test_format_status() {
        assert_eq!(format_status(None), "stopped");
        let info = ProcessInfo::new("survival", 4242);
        assert_eq!(format_status(Some(&info)), "running (pid 4242)");
    }
}
