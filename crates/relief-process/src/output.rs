//! Pipe readers that turn child output into supervisor events

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::session::{OutputChunk, OutputStream, SessionId, SupervisorEvent};

/// Forward `reader` to `events` one line at a time.
///
/// Lines keep their newline so that concatenating every chunk reproduces the
/// stream byte for byte (modulo invalid UTF-8, which is replaced).
pub(crate) fn spawn_reader<R>(
    reader: R,
    stream: OutputStream,
    session: SessionId,
    events: UnboundedSender<SupervisorEvent>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut line = Vec::with_capacity(256);
        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line).await {
                Ok(0) => break,
                Ok(_) => {
                    let chunk = OutputChunk {
                        stream,
                        text: String::from_utf8_lossy(&line).into_owned(),
                    };
                    if events.send(SupervisorEvent::Output { session, chunk }).is_err() {
                        debug!(%session, "Event receiver dropped, stopping reader");
                        break;
                    }
                }
                Err(e) => {
                    warn!(%session, ?stream, error = %e, "Error reading build output");
                    break;
                }
            }
        }
    })
}

/// Wait for all readers to hit EOF, aborting any still running after `timeout`.
///
/// A grandchild that escaped the process group can hold a pipe open forever;
/// the bound keeps the finished notification from hanging on it.
pub(crate) async fn drain_readers(readers: Vec<JoinHandle<()>>, timeout: Duration) {
    let deadline = tokio::time::Instant::now() + timeout;
    for mut reader in readers {
        if tokio::time::timeout_at(deadline, &mut reader).await.is_err() {
            warn!("Output reader still open after process exit, abandoning it");
            reader.abort();
        }
    }
}
