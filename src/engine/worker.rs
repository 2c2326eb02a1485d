// src/engine/worker.rs

//! The per-job worker task.
//!
//! One worker runs one job from submission to its single
//! [`JobEvent::Finished`]. It is the IO shell around [`JobMachine`]:
//! every state the machine returns is published as
//! [`JobEvent::StateChanged`].

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::exec::{
    DiagnosticTail, OutputStream, ProcessHandle, ProcessSupervisor, RelaySinks, cancelled,
    spawn_relay,
};
use crate::fs::FileSystem;
use crate::guard::{GuardDecision, OverwriteGuard};
use crate::job::{JobRequest, JobSpec, JobSpecBuilder};
use crate::logging::JobLog;
use crate::postprocess::{PostProcessDispatcher, PostProcessReport};
use crate::workflow::WorkflowKind;

use super::core::{JobInput, JobMachine};
use super::{JobEvent, JobId, JobOutcome, JobState, JobSummary};

/// Everything a worker needs, cloned out of the controller at submit time.
#[derive(Debug, Clone)]
pub struct WorkerContext {
    pub builder: Arc<JobSpecBuilder>,
    pub fs: Arc<dyn FileSystem>,
    pub dispatcher: Arc<PostProcessDispatcher>,
    pub engine: EngineConfig,
    pub events: mpsc::Sender<JobEvent>,
}

/// How the engine process ended.
enum ProcessExit {
    Exited(i32),
    Cancelled { escalated: bool },
}

struct Worker {
    job: JobId,
    workflow: WorkflowKind,
    ctx: WorkerContext,
    machine: JobMachine,
    cancel: watch::Receiver<bool>,
}

/// Run one job to completion. Emits exactly one `Finished` event.
pub async fn run_job(
    job: JobId,
    request: JobRequest,
    ctx: WorkerContext,
    cancel: watch::Receiver<bool>,
) -> JobSummary {
    let mut worker = Worker {
        job,
        workflow: request.workflow,
        ctx,
        machine: JobMachine::new(),
        cancel,
    };

    let outcome = worker.run(request).await;
    let summary = JobSummary {
        job,
        workflow: worker.workflow,
        outcome,
    };

    if worker.machine.state().is_terminal() {
        worker.advance(JobInput::Reset).await;
    }

    worker.emit(JobEvent::Finished(summary.clone())).await;
    summary
}

impl Worker {
    async fn run(&mut self, request: JobRequest) -> JobOutcome {
        self.advance(JobInput::Submitted).await;
        info!(job = self.job, workflow = %self.workflow, "job submitted");

        if self.is_cancelled() {
            self.advance(JobInput::CancelRequested).await;
            return JobOutcome::Cancelled { escalated: false };
        }

        let spec = match self.ctx.builder.build(&request) {
            Ok(spec) => spec,
            Err(e) => {
                warn!(job = self.job, workflow = %self.workflow, error = %e, "job rejected");
                self.advance(JobInput::Rejected).await;
                return JobOutcome::Rejected(e);
            }
        };

        let guard = OverwriteGuard::new(self.ctx.fs.clone(), self.ctx.events.clone());
        let conflicts = guard.conflicts(spec.expected_outputs());
        if !conflicts.is_empty() {
            self.advance(JobInput::ConflictsFound).await;
            match guard
                .confirm(self.job, self.workflow, conflicts, &mut self.cancel)
                .await
            {
                GuardDecision::Proceed => {}
                GuardDecision::Declined { conflicts } => {
                    self.advance(JobInput::OverwriteDeclined).await;
                    return JobOutcome::Declined { conflicts };
                }
                GuardDecision::Cancelled => {
                    self.advance(JobInput::CancelRequested).await;
                    return JobOutcome::Cancelled { escalated: false };
                }
            }
        }

        if self.is_cancelled() {
            self.advance(JobInput::CancelRequested).await;
            return JobOutcome::Cancelled { escalated: false };
        }

        let log = match self.prepare_output(&spec) {
            Ok(log) => log,
            Err(message) => {
                error!(job = self.job, workflow = %self.workflow, %message, "job could not start");
                self.advance(JobInput::SpawnFailed).await;
                return JobOutcome::SpawnFailed(message);
            }
        };
        log.info(&format!("Starting {} job", self.workflow));
        log.info(&format!("Command: {}", spec.command_line()));
        log.info(&format!("Working directory: {}", spec.working_dir().display()));

        let mut handle = match ProcessSupervisor.spawn(&spec) {
            Ok(handle) => handle,
            Err(e) => {
                log.error(&e.to_string());
                self.advance(JobInput::SpawnFailed).await;
                return JobOutcome::SpawnFailed(e.to_string());
            }
        };
        self.advance(JobInput::Spawned).await;

        let tail = DiagnosticTail::new(self.ctx.engine.tail_lines);
        let relays = self.start_relays(&mut handle, &log, &tail);

        let exit = self.supervise(&mut handle).await;
        self.join_relays(relays).await;
        drop(handle);

        match exit {
            ProcessExit::Exited(code) => {
                let state = self.advance(JobInput::Exited { code }).await;
                if state == JobState::CompletedSuccess {
                    log.info("Job completed successfully");
                    let post = self.post_process(spec).await;
                    for warning in post.warnings() {
                        log.warn(&warning);
                    }
                    if let Some(report) = &post.report {
                        log.info(&format!("Report written to {}", report.display()));
                    }
                    JobOutcome::Succeeded { post }
                } else {
                    let tail = tail.snapshot();
                    log.error(&format!("Engine exited with code {code}"));
                    for line in &tail {
                        log.error(line);
                    }
                    JobOutcome::Failed {
                        exit_code: code,
                        tail,
                    }
                }
            }
            ProcessExit::Cancelled { escalated } => {
                self.advance(JobInput::ProcessDead).await;
                log.warn(if escalated {
                    "Job cancelled by user (killed after grace period)"
                } else {
                    "Job cancelled by user"
                });
                JobOutcome::Cancelled { escalated }
            }
        }
    }

    fn prepare_output(&self, spec: &JobSpec) -> Result<JobLog, String> {
        self.ctx
            .fs
            .create_dir_all(spec.output_dir())
            .map_err(|e| format!("{e:#}"))?;
        JobLog::open(spec.log_path())
            .map_err(|e| format!("opening job log {}: {e}", spec.log_path().display()))
    }

    fn start_relays(
        &self,
        handle: &mut ProcessHandle,
        log: &JobLog,
        tail: &DiagnosticTail,
    ) -> Vec<JoinHandle<usize>> {
        let sinks = RelaySinks {
            job: self.job,
            log: log.clone(),
            tail: tail.clone(),
            events: self.ctx.events.clone(),
        };
        let drain = self.ctx.engine.drain_timeout;

        let mut relays = Vec::with_capacity(2);
        if let Some(stdout) = handle.take_stdout() {
            relays.push(spawn_relay(
                stdout,
                OutputStream::Stdout,
                sinks.clone(),
                self.cancel.clone(),
                drain,
            ));
        }
        if let Some(stderr) = handle.take_stderr() {
            relays.push(spawn_relay(
                stderr,
                OutputStream::Stderr,
                sinks,
                self.cancel.clone(),
                drain,
            ));
        }
        relays
    }

    /// Wait for the engine, or terminate it when the job is cancelled.
    async fn supervise(&mut self, handle: &mut ProcessHandle) -> ProcessExit {
        let mut cancel = self.cancel.clone();
        let code = tokio::select! {
            code = handle.wait() => code,
            _ = cancelled(&mut cancel) => {
                info!(job = self.job, workflow = %self.workflow, pid = handle.pid(), "cancelling engine");
                self.advance(JobInput::CancelRequested).await;
                let escalated = match handle.cancel(self.ctx.engine.grace_period).await {
                    Ok(escalated) => escalated,
                    Err(e) => {
                        warn!(job = self.job, error = %e, "error while terminating engine");
                        true
                    }
                };
                return ProcessExit::Cancelled { escalated };
            }
        };

        match code {
            Ok(code) => {
                info!(job = self.job, workflow = %self.workflow, exit_code = code, "engine exited");
                ProcessExit::Exited(code)
            }
            Err(e) => {
                error!(job = self.job, error = %e, "waiting for engine failed");
                ProcessExit::Exited(-1)
            }
        }
    }

    /// Give the relays the drain timeout to reach EOF; a grandchild still
    /// holding the pipes open must not block the job forever.
    async fn join_relays(&self, relays: Vec<JoinHandle<usize>>) {
        let deadline = tokio::time::Instant::now() + self.ctx.engine.drain_timeout;
        for relay in relays {
            let abort = relay.abort_handle();
            match tokio::time::timeout_at(deadline, relay).await {
                Ok(Ok(lines)) => debug!(job = self.job, lines, "relay finished"),
                Ok(Err(e)) => warn!(job = self.job, error = %e, "relay task failed"),
                Err(_) => {
                    warn!(job = self.job, "relay did not finish in time; aborting");
                    abort.abort();
                }
            }
        }
    }

    async fn post_process(&self, spec: JobSpec) -> PostProcessReport {
        let dispatcher = self.ctx.dispatcher.clone();
        match tokio::task::spawn_blocking(move || dispatcher.dispatch(&spec)).await {
            Ok(report) => report,
            Err(e) => {
                error!(job = self.job, error = %e, "post-processing task failed");
                PostProcessReport::default()
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    async fn advance(&mut self, input: JobInput) -> JobState {
        match self.machine.step(input) {
            Ok(state) => {
                debug!(job = self.job, %state, ?input, "job state changed");
                self.emit(JobEvent::StateChanged {
                    job: self.job,
                    workflow: self.workflow,
                    state,
                })
                .await;
                state
            }
            Err(e) => {
                error!(job = self.job, error = %e, "ignoring invalid transition");
                self.machine.state()
            }
        }
    }

    async fn emit(&self, event: JobEvent) {
        if self.ctx.events.send(event).await.is_err() {
            debug!(job = self.job, "event receiver gone");
        }
    }
}

