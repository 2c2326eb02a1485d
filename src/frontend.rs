// src/frontend.rs

//! Terminal front-end for a single job.
//!
//! Engine output is echoed as it arrives and overwrite requests are resolved
//! by the [`OverwritePolicy`]. With [`OverwritePolicy::Ask`] the question
//! runs on a blocking thread while the loop keeps serving events and
//! interrupts, so Ctrl-C still cancels a job waiting at the prompt.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::engine::{JobController, JobEvent, JobId, JobSummary};
use crate::exec::OutputStream;
use crate::types::OverwritePolicy;
use crate::workflow::WorkflowKind;

/// Asks the user whether existing files may be overwritten.
pub trait Confirm: Send + Sync + 'static {
    /// Blocking.
    fn confirm(&self, workflow: WorkflowKind, paths: &[PathBuf]) -> std::io::Result<bool>;
}

/// Prompt on stderr, answer on stdin. Anything but `y`/`yes` declines.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&self, workflow: WorkflowKind, paths: &[PathBuf]) -> std::io::Result<bool> {
        let mut stderr = std::io::stderr().lock();
        writeln!(stderr, "The {workflow} job would overwrite:")?;
        for path in paths {
            writeln!(stderr, "  {}", path.display())?;
        }
        write!(stderr, "Overwrite these files? [y/N] ")?;
        stderr.flush()?;

        let mut answer = String::new();
        std::io::stdin().lock().read_line(&mut answer)?;
        Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
    }
}

/// A question on screen. Dropping it drops the reply, which declines.
struct PendingPrompt {
    job: JobId,
    workflow: WorkflowKind,
    reply: oneshot::Sender<bool>,
    answer: JoinHandle<std::io::Result<bool>>,
}

impl PendingPrompt {
    fn resolve(self, answer: bool) {
        info!(job = self.job, workflow = %self.workflow, overwrite = answer, "overwrite decision");
        // The worker may have been cancelled meanwhile.
        let _ = self.reply.send(answer);
    }
}

pub struct FrontEnd {
    policy: OverwritePolicy,
    confirm: Arc<dyn Confirm>,
}

impl FrontEnd {
    pub fn new(policy: OverwritePolicy, confirm: Arc<dyn Confirm>) -> Self {
        Self { policy, confirm }
    }

    /// Serve `events` until the `workflow` job finishes.
    ///
    /// Every message on `interrupts` cancels the job and abandons an open
    /// prompt. The thread blocked in [`Confirm::confirm`] stays parked until
    /// it returns on its own.
    pub async fn drive(
        &self,
        controller: &mut JobController,
        workflow: WorkflowKind,
        events: &mut mpsc::Receiver<JobEvent>,
        interrupts: &mut mpsc::Receiver<()>,
    ) -> Option<JobSummary> {
        let mut prompt: Option<PendingPrompt> = None;
        let mut interrupts_open = true;

        let summary = loop {
            tokio::select! {
                answer = prompt_answer(&mut prompt), if prompt.is_some() => {
                    if let Some(pending) = prompt.take() {
                        pending.resolve(answer);
                    }
                }
                event = events.recv() => {
                    let Some(event) = event else {
                        warn!("job event channel closed before the job finished");
                        break None;
                    };
                    if let Some(summary) = self.handle_event(event, &mut prompt) {
                        break Some(summary);
                    }
                }
                interrupt = interrupts.recv(), if interrupts_open => {
                    if interrupt.is_none() {
                        interrupts_open = false;
                        continue;
                    }
                    eprintln!("cancelling {workflow} job...");
                    controller.cancel(workflow);
                    if prompt.take().is_some() {
                        debug!(%workflow, "overwrite prompt abandoned");
                    }
                }
            }
        };

        // The worker has already reported; this only reaps its task.
        let joined = controller.join(workflow).await;
        summary.or(joined)
    }

    /// React to one job event. Returns the summary once the job is finished.
    fn handle_event(
        &self,
        event: JobEvent,
        prompt: &mut Option<PendingPrompt>,
    ) -> Option<JobSummary> {
        match event {
            JobEvent::StateChanged {
                job,
                workflow,
                state,
            } => {
                debug!(job, %workflow, %state, "job state");
                None
            }
            JobEvent::Output { line, .. } => {
                match line.stream {
                    OutputStream::Stdout => println!("{}", line.text),
                    OutputStream::Stderr => eprintln!("{}", line.text),
                }
                None
            }
            JobEvent::OverwriteRequested {
                job,
                workflow,
                paths,
                reply,
            } => {
                if matches!(self.policy, OverwritePolicy::Ask) {
                    let confirm = self.confirm.clone();
                    let answer =
                        tokio::task::spawn_blocking(move || confirm.confirm(workflow, &paths));
                    *prompt = Some(PendingPrompt {
                        job,
                        workflow,
                        reply,
                        answer,
                    });
                } else {
                    let answer = matches!(self.policy, OverwritePolicy::Always);
                    info!(job, %workflow, overwrite = answer, "overwrite decision");
                    let _ = reply.send(answer);
                }
                None
            }
            JobEvent::Finished(summary) => Some(summary),
        }
    }
}

async fn prompt_answer(prompt: &mut Option<PendingPrompt>) -> bool {
    let Some(pending) = prompt else {
        return std::future::pending().await;
    };
    match (&mut pending.answer).await {
        Ok(Ok(answer)) => answer,
        Ok(Err(e)) => {
            warn!(error = %e, "could not read overwrite confirmation; declining");
            false
        }
        Err(e) => {
            warn!(error = %e, "overwrite prompt failed; declining");
            false
        }
    }
}
