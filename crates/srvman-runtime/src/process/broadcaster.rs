//! Fan-out of server lifecycle events.

use super::events::ServerEvent;
use tokio::sync::broadcast;
use tracing::debug;

/// Broadcast channel capacity for server events
const CHANNEL_CAPACITY: usize = 64;

/// Broadcaster for server lifecycle events
pub struct ServerEventBroadcaster {
    sender: broadcast::Sender<ServerEvent>,
}

impl ServerEventBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Send an event to every current subscriber.
    pub fn broadcast(&self, event: ServerEvent) {
        debug!(?event, "Server event");
        if self.sender.receiver_count() > 0 {
            let _ = self.sender.send(event);
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ServerEventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_events() {
        let broadcaster = ServerEventBroadcaster::new();
        let mut rx = broadcaster.subscribe();
        assert_eq!(broadcaster.subscriber_count(), 1);

        broadcaster.broadcast(ServerEvent::Stopping {
            server: "survival".to_string(),
            pid: 1,
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.server(), "survival");
    }

    #[test]
    fn test_broadcast_without_subscribers_is_noop() {
        let broadcaster = ServerEventBroadcaster::new();
        broadcaster.broadcast(ServerEvent::Started {
            server: "survival".to_string(),
            pid: 1,
        });
        assert_eq!(broadcaster.subscriber_count(), 0);
    }
}
