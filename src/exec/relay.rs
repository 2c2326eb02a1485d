// src/exec/relay.rs

//! Line-by-line forwarding of engine output.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::engine::{JobEvent, JobId};
use crate::logging::JobLog;

use super::{OutputLine, OutputStream, cancelled};

/// Last `capacity` engine lines of a job, both streams interleaved in
/// arrival order. Shown to the user when the engine fails.
#[derive(Debug, Clone)]
pub struct DiagnosticTail {
    lines: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl DiagnosticTail {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn push(&self, line: impl Into<String>) {
        let mut lines = self.lock();
        if lines.len() == self.capacity {
            lines.pop_front();
        }
        lines.push_back(line.into());
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.lock().iter().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.lines.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Where a relay delivers each line.
#[derive(Debug, Clone)]
pub struct RelaySinks {
    pub job: JobId,
    pub log: JobLog,
    pub tail: DiagnosticTail,
    pub events: mpsc::Sender<JobEvent>,
}

impl RelaySinks {
    async fn deliver(&self, stream: OutputStream, raw: &[u8]) {
        let text = String::from_utf8_lossy(strip_line_ending(raw)).into_owned();
        self.log.engine_line(stream, &text);
        self.tail.push(text.clone());
        let event = JobEvent::Output {
            job: self.job,
            line: OutputLine { stream, text },
        };
        if self.events.send(event).await.is_err() {
            debug!(job = self.job, %stream, "event receiver gone; line kept in job log only");
        }
    }
}

/// Spawn a relay task for one output stream.
///
/// Lines are delivered in the order they were written. After `cancel`
/// fires, lines already buffered in the pipe are still delivered until EOF
/// or until `drain_timeout` elapses. Resolves to the number of lines
/// delivered.
pub fn spawn_relay<R>(
    reader: R,
    stream: OutputStream,
    sinks: RelaySinks,
    mut cancel: watch::Receiver<bool>,
    drain_timeout: Duration,
) -> JoinHandle<usize>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        let mut delivered = 0usize;

        loop {
            let read = tokio::select! {
                biased;
                read = reader.read_until(b'\n', &mut buf) => read,
                _ = cancelled(&mut cancel) => {
                    debug!(job = sinks.job, %stream, "relay cancelled; draining");
                    break;
                }
            };

            match read {
                Ok(0) => {
                    debug!(job = sinks.job, %stream, delivered, "relay reached end of stream");
                    return delivered;
                }
                Ok(_) => {
                    sinks.deliver(stream, &buf).await;
                    delivered += 1;
                    buf.clear();
                }
                Err(e) => {
                    warn!(job = sinks.job, %stream, error = %e, "reading engine output failed");
                    return delivered;
                }
            }
        }

        // A read interrupted by the cancel may have left a partial line in
        // `buf`; keep appending to it.
        let deadline = Instant::now() + drain_timeout;
        loop {
            match tokio::time::timeout_at(deadline, reader.read_until(b'\n', &mut buf)).await {
                Ok(Ok(0)) => break,
                Ok(Ok(_)) => {
                    sinks.deliver(stream, &buf).await;
                    delivered += 1;
                    buf.clear();
                }
                Ok(Err(e)) => {
                    warn!(job = sinks.job, %stream, error = %e, "reading engine output failed");
                    break;
                }
                Err(_) => {
                    debug!(job = sinks.job, %stream, "drain deadline reached");
                    break;
                }
            }
        }

        if !buf.is_empty() {
            sinks.deliver(stream, &buf).await;
            delivered += 1;
        }

        delivered
    })
}

fn strip_line_ending(raw: &[u8]) -> &[u8] {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    raw.strip_suffix(b"\r").unwrap_or(raw)
}
