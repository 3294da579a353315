//! Server lifecycle events.
//!
//! Emitted by the supervisor whenever a server changes state. Front ends use
//! them to notice crashes without polling.

use serde::{Deserialize, Serialize};

use super::types::ProcessExit;

/// Server lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Running,
    Stopping,
    /// Stopped on operator request
    Stopped,
    /// Exited without being asked to
    Exited,
}

/// Server lifecycle event payload.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerEvent {
    /// A new child process was spawned.
    Started { server: String, pid: u32 },

    /// A stop was requested.
    Stopping { server: String, pid: u32 },

    /// The child ended because the operator stopped it.
    Stopped {
        server: String,
        exit: Option<ProcessExit>,
        forced: bool,
    },

    /// The child ended on its own (crash, `stop` typed into the console).
    Exited { server: String, exit: ProcessExit },
}

impl ServerEvent {
    pub fn server(&self) -> &str {
        match self {
            Self::Started { server, .. }
            | Self::Stopping { server, .. }
            | Self::Stopped { server, .. }
            | Self::Exited { server, .. } => server,
        }
    }

    /// Status the server is in after this event.
    pub const fn status(&self) -> ServerStatus {
        match self {
            Self::Started { .. } => ServerStatus::Running,
            Self::Stopping { .. } => ServerStatus::Stopping,
            Self::Stopped { .. } => ServerStatus::Stopped,
            Self::Exited { .. } => ServerStatus::Exited,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_event_serialization() {
        let event = ServerEvent::Started {
            server: "survival".to_string(),
            pid: 4242,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"started\""));
        assert!(json.contains("\"server\":\"survival\""));
        assert!(json.contains("\"pid\":4242"));
    }

    #[test]
    fn test_exited_event_carries_exit() {
        let event = ServerEvent::Exited {
            server: "survival".to_string(),
            exit: ProcessExit::unknown("gone"),
        };
        assert_eq!(event.status(), ServerStatus::Exited);
        assert_eq!(event.server(), "survival");

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"exited\""));
        assert!(json.contains("\"description\":\"gone\""));
    }
}
