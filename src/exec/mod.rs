// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`supervisor`] spawns the analysis engine and owns the child process:
//!   waiting for it and terminating it (SIGTERM, grace period, SIGKILL).
//! - [`relay`] streams the child's stdout and stderr line by line to the
//!   job log, the diagnostic tail and the front-end.
//!
//! Cancellation reaches both through one `watch::Receiver<bool>` per job.

use std::fmt;

use tokio::sync::watch;

pub mod relay;
pub mod supervisor;

pub use relay::{DiagnosticTail, RelaySinks, spawn_relay};
pub use supervisor::{ProcessHandle, ProcessSupervisor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputStream::Stdout => f.write_str("stdout"),
            OutputStream::Stderr => f.write_str("stderr"),
        }
    }
}

/// One line of engine output, without its line terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub stream: OutputStream,
    pub text: String,
}

/// Resolve once the job is cancelled.
///
/// Never resolves if the sender is dropped without cancelling.
pub async fn cancelled(rx: &mut watch::Receiver<bool>) {
    let closed = rx.wait_for(|cancelled| *cancelled).await.is_err();
    if closed {
        std::future::pending::<()>().await;
    }
}
