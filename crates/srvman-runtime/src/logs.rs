//! Per-server log buffers.
//!
//! Every started run gets its own unbounded channel. Reader tasks push into
//! the channel through a [`LogSink`] that already knows the server name, and a
//! drain task moves entries into the [`LogStream`] buffers. Nothing is ever
//! attributed to "whatever server is selected right now".

use srvman_core::{LogEntry, LogSource};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Broadcast channel capacity for live log subscribers
const BROADCAST_CAPACITY: usize = 1024;

/// Receiving half of a run's log channel.
pub type LogReceiver = mpsc::UnboundedReceiver<LogEntry>;

/// Producer handle for one server's log channel.
///
/// Cheap to clone; every reader task of a run holds one. The channel closes
/// once all clones are dropped.
#[derive(Debug, Clone)]
pub struct LogSink {
    server: Arc<str>,
    tx: mpsc::UnboundedSender<LogEntry>,
}

impl LogSink {
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Queue a line. Returns `false` if the receiving side is gone.
    pub fn emit(&self, source: LogSource, line: impl Into<String>) -> bool {
        self.tx
            .send(LogEntry::new(self.server.as_ref(), source, line))
            .is_ok()
    }

    /// Queue a supervisor message.
    pub fn system(&self, line: impl Into<String>) -> bool {
        self.emit(LogSource::System, line)
    }
}

/// Entries for a single server, oldest first.
#[derive(Debug, Default)]
struct LogBuffer {
    lines: VecDeque<LogEntry>,
}

impl LogBuffer {
    fn push(&mut self, entry: LogEntry, cap: Option<usize>) {
        if let Some(cap) = cap {
            while self.lines.len() >= cap {
                self.lines.pop_front();
            }
        }
        self.lines.push_back(entry);
    }
}

/// Ordered log buffers for every server, plus a live broadcast of new entries.
pub struct LogStream {
    buffers: RwLock<HashMap<String, LogBuffer>>,
    broadcast_tx: broadcast::Sender<LogEntry>,
    max_lines: Option<usize>,
}

impl LogStream {
    /// Create a stream that keeps every line.
    pub fn new() -> Self {
        Self::with_max_lines(None)
    }

    /// Create a stream that keeps at most `max_lines` entries per server.
    pub fn with_max_lines(max_lines: Option<usize>) -> Self {
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            buffers: RwLock::new(HashMap::new()),
            broadcast_tx,
            max_lines,
        }
    }

    /// Open a fresh channel for one run of `server`.
    pub fn channel(server: &str) -> (LogSink, LogReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            LogSink {
                server: Arc::from(server),
                tx,
            },
            rx,
        )
    }

    /// Append an entry to its server's buffer and notify subscribers.
    pub fn append(&self, entry: LogEntry) {
        {
            let mut buffers = self
                .buffers
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            buffers
                .entry(entry.server.clone())
                .or_default()
                .push(entry.clone(), self.max_lines);
        }
        // No subscribers is fine
        let _ = self.broadcast_tx.send(entry);
    }

    /// Append a line produced outside any run channel.
    pub fn append_line(&self, server: &str, source: LogSource, line: impl Into<String>) {
        self.append(LogEntry::new(server, source, line));
    }

    /// Move every entry currently queued on `rx` into the buffers without
    /// waiting. Returns the number of entries moved.
    pub fn drain_pending(&self, rx: &mut LogReceiver) -> usize {
        let mut moved = 0;
        while let Ok(entry) = rx.try_recv() {
            self.append(entry);
            moved += 1;
        }
        moved
    }

    /// Drain `rx` in the background until the channel closes or `cancel`
    /// fires. On cancellation whatever is already queued is still appended.
    pub fn spawn_drain(
        self: &Arc<Self>,
        mut rx: LogReceiver,
        cancel: CancellationToken,
    ) -> JoinHandle<usize> {
        let stream = Arc::clone(self);
        tokio::spawn(async move {
            let mut moved = 0;
            loop {
                tokio::select! {
                    biased;
                    entry = rx.recv() => match entry {
                        Some(entry) => {
                            stream.append(entry);
                            moved += 1;
                        }
                        None => break,
                    },
                    () = cancel.cancelled() => {
                        moved += stream.drain_pending(&mut rx);
                        break;
                    }
                }
            }
            debug!(moved, "log drain task exiting");
            moved
        })
    }

    /// Snapshot of a server's entries, oldest first.
    pub fn history(&self, server: &str) -> Vec<LogEntry> {
        let buffers = self.buffers.read().unwrap_or_else(PoisonError::into_inner);
        buffers
            .get(server)
            .map(|b| b.lines.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// The last `count` entries for a server.
    pub fn tail(&self, server: &str, count: usize) -> Vec<LogEntry> {
        let buffers = self.buffers.read().unwrap_or_else(PoisonError::into_inner);
        buffers
            .get(server)
            .map(|b| {
                let skip = b.lines.len().saturating_sub(count);
                b.lines.iter().skip(skip).cloned().collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self, server: &str) -> usize {
        let buffers = self.buffers.read().unwrap_or_else(PoisonError::into_inner);
        buffers.get(server).map_or(0, |b| b.lines.len())
    }

    /// Forget a server's entries.
    pub fn clear(&self, server: &str) {
        let mut buffers = self
            .buffers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        buffers.remove(server);
    }

    /// Live feed of every appended entry, all servers.
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.broadcast_tx.subscribe()
    }
}

impl Default for LogStream {
    fn default() -> Self {
        Self::new()
    }
}
