//! Async pipe readers (non-UTF8-safe).
//!
//! Game servers and their plugins print whatever bytes they like. Using
//! `BufReader::lines()` would end the reader on the first invalid UTF-8
//! sequence, so lines are split on raw bytes and decoded lossily.

use srvman_core::LogSource;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tracing::trace;

use crate::logs::LogSink;

/// Forward every line of `stream` to `sink` until EOF.
///
/// Returns the number of lines forwarded.
pub(crate) fn spawn_stream_reader(
    stream: impl AsyncRead + Unpin + Send + 'static,
    source: LogSource,
    sink: LogSink,
) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf: Vec<u8> = Vec::with_capacity(1024);
        let mut forwarded = 0;

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    if buf.last() == Some(&b'\n') {
                        buf.pop();
                        if buf.last() == Some(&b'\r') {
                            buf.pop();
                        }
                    }

                    let line = String::from_utf8_lossy(&buf).into_owned();
                    trace!(server = sink.server(), %source, "{}", line);
                    if !sink.emit(source, line) {
                        // Log stream is gone, nobody will read further lines
                        break;
                    }
                    forwarded += 1;
                }
                Err(e) => {
                    sink.system(format!("{source} reader stopped: {e}"));
                    break;
                }
            }
        }

        trace!(server = sink.server(), %source, forwarded, "stream reader exiting");
        forwarded
    })
}
