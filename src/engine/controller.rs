// src/engine/controller.rs

//! Front-end facing job controller.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::ConfigFile;
use crate::errors::{Result, TrajrunError};
use crate::fs::FileSystem;
use crate::job::{JobRequest, JobSpecBuilder};
use crate::postprocess::PostProcessDispatcher;
use crate::workflow::WorkflowKind;

use super::worker::{WorkerContext, run_job};
use super::{JobEvent, JobId, JobSummary};

/// Internal handle for a job whose worker has been started.
///
/// - `cancel` is flipped to `true` to request cancellation.
/// - `handle` is the Tokio task running the worker.
struct ActiveJob {
    job: JobId,
    cancel: watch::Sender<bool>,
    handle: JoinHandle<JobSummary>,
}

/// Starts workers and routes cancellation to them.
///
/// **Per workflow there is never more than one job running at the same
/// time**; a second submission is rejected until the first is terminal.
/// Jobs of different workflows run concurrently.
pub struct JobController {
    ctx: WorkerContext,
    active: HashMap<WorkflowKind, ActiveJob>,
    next_id: JobId,
}

impl JobController {
    pub fn new(
        config: &ConfigFile,
        fs: Arc<dyn FileSystem>,
        dispatcher: PostProcessDispatcher,
        events: mpsc::Sender<JobEvent>,
    ) -> Self {
        let builder = JobSpecBuilder::new(config, fs.clone());
        Self {
            ctx: WorkerContext {
                builder: Arc::new(builder),
                fs,
                dispatcher: Arc::new(dispatcher),
                engine: config.engine.clone(),
                events,
            },
            active: HashMap::new(),
            next_id: 1,
        }
    }

    /// Start a worker for `request`. Must be called inside a Tokio runtime.
    pub fn submit(&mut self, request: JobRequest) -> Result<JobId> {
        let workflow = request.workflow;
        if self.is_running(workflow) {
            debug!(%workflow, "submission rejected; job already running");
            return Err(TrajrunError::AlreadyRunning(workflow));
        }

        let job = self.next_id;
        self.next_id += 1;

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let ctx = self.ctx.clone();
        let handle = tokio::spawn(async move {
            let summary = run_job(job, request, ctx, cancel_rx).await;
            debug!(job, "worker finished");
            summary
        });

        info!(job, %workflow, "job started");
        self.active.insert(
            workflow,
            ActiveJob {
                job,
                cancel: cancel_tx,
                handle,
            },
        );
        Ok(job)
    }

    /// Request cancellation of the active job of `workflow`.
    ///
    /// Returns `false` when nothing is running.
    pub fn cancel(&self, workflow: WorkflowKind) -> bool {
        match self.active.get(&workflow) {
            Some(active) if !active.handle.is_finished() => {
                info!(job = active.job, %workflow, "cancellation requested");
                active.cancel.send_replace(true);
                true
            }
            _ => false,
        }
    }

    /// Cancel every running job. Returns how many were signalled.
    pub fn cancel_all(&self) -> usize {
        WorkflowKind::ALL
            .into_iter()
            .filter(|&workflow| self.cancel(workflow))
            .count()
    }

    pub fn is_running(&self, workflow: WorkflowKind) -> bool {
        self.active
            .get(&workflow)
            .is_some_and(|active| !active.handle.is_finished())
    }

    /// Wait for the job of `workflow` and return its summary.
    pub async fn join(&mut self, workflow: WorkflowKind) -> Option<JobSummary> {
        let active = self.active.remove(&workflow)?;
        match active.handle.await {
            Ok(summary) => Some(summary),
            Err(e) => {
                tracing::error!(job = active.job, error = %e, "worker task failed");
                None
            }
        }
    }
}
