// src/guard/mod.rs

//! Overwrite protection.
//!
//! Before a job spawns, every expected output is checked. If any exist, the
//! front-end receives a single [`JobEvent::OverwriteRequested`] listing all
//! of them and the worker waits for the answer. The decision covers the
//! whole set.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info};

use crate::engine::{JobEvent, JobId};
use crate::exec::cancelled;
use crate::fs::FileSystem;
use crate::job::ExpectedOutputSet;
use crate::workflow::WorkflowKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    Declined { conflicts: Vec<PathBuf> },
    /// The job was cancelled while waiting for an answer.
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct OverwriteGuard {
    fs: Arc<dyn FileSystem>,
    events: mpsc::Sender<JobEvent>,
}

impl OverwriteGuard {
    pub fn new(fs: Arc<dyn FileSystem>, events: mpsc::Sender<JobEvent>) -> Self {
        Self { fs, events }
    }

    /// Expected outputs that already exist, in set order.
    pub fn conflicts(&self, outputs: &ExpectedOutputSet) -> Vec<PathBuf> {
        outputs
            .paths()
            .filter(|path| self.fs.exists(path))
            .map(|path| path.to_path_buf())
            .collect()
    }

    /// Ask the front-end whether `conflicts` may be overwritten.
    ///
    /// A dropped reply or a closed event channel counts as a decline.
    pub async fn confirm(
        &self,
        job: JobId,
        workflow: WorkflowKind,
        conflicts: Vec<PathBuf>,
        cancel: &mut watch::Receiver<bool>,
    ) -> GuardDecision {
        if conflicts.is_empty() {
            return GuardDecision::Proceed;
        }

        info!(job, %workflow, count = conflicts.len(), "existing outputs found; asking before overwrite");

        let (reply_tx, reply_rx) = oneshot::channel();
        let event = JobEvent::OverwriteRequested {
            job,
            workflow,
            paths: conflicts.clone(),
            reply: reply_tx,
        };
        if self.events.send(event).await.is_err() {
            debug!(job, "event receiver gone; treating as decline");
            return GuardDecision::Declined { conflicts };
        }

        // A cancel wins over a reply dropped in the same instant.
        tokio::select! {
            biased;
            _ = cancelled(cancel) => GuardDecision::Cancelled,
            answer = reply_rx => match answer {
                Ok(true) => {
                    info!(job, %workflow, "overwrite confirmed");
                    GuardDecision::Proceed
                }
                Ok(false) => {
                    info!(job, %workflow, "overwrite declined");
                    GuardDecision::Declined { conflicts }
                }
                Err(_) => {
                    debug!(job, "overwrite reply dropped; treating as decline");
                    GuardDecision::Declined { conflicts }
                }
            },
        }
    }
}
