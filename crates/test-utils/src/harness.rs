#![allow(dead_code)]

//! Front-end stand-in for controller tests.
//!
//! [`EventRecorder`] drains the job event channel on its own task, keeps a
//! copy of everything it sees and answers overwrite prompts with a fixed
//! [`OverwriteAnswer`].

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use trajrun::config::ConfigFile;
use trajrun::engine::{JobController, JobEvent, JobState, JobSummary};
use trajrun::exec::{OutputLine, OutputStream};
use trajrun::fs::{FileSystem, RealFileSystem};
use trajrun::job::JobRequest;
use trajrun::postprocess::PostProcessDispatcher;
use trajrun::workflow::WorkflowKind;

use crate::fakes::{RecordingAssembler, RecordingRenderer};

#[derive(Debug, Clone)]
pub enum Recorded {
    State(JobState),
    Output(OutputLine),
    OverwriteRequested(Vec<PathBuf>),
    Finished(JobSummary),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwriteAnswer {
    Accept,
    Decline,
    /// Drop the reply without answering.
    Ignore,
}

#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<Recorded>>>,
}

impl EventRecorder {
    pub fn spawn(mut rx: mpsc::Receiver<JobEvent>, answer: OverwriteAnswer) -> (Self, JoinHandle<()>) {
        let recorder = Self::default();
        let events = recorder.events.clone();
        let handle = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let recorded = match event {
                    JobEvent::StateChanged { state, .. } => Recorded::State(state),
                    JobEvent::Output { line, .. } => Recorded::Output(line),
                    JobEvent::OverwriteRequested { paths, reply, .. } => {
                        match answer {
                            OverwriteAnswer::Accept => {
                                let _ = reply.send(true);
                            }
                            OverwriteAnswer::Decline => {
                                let _ = reply.send(false);
                            }
                            OverwriteAnswer::Ignore => drop(reply),
                        }
                        Recorded::OverwriteRequested(paths)
                    }
                    JobEvent::Finished(summary) => Recorded::Finished(summary),
                };
                events.lock().unwrap().push(recorded);
            }
        });
        (recorder, handle)
    }

    pub fn all(&self) -> Vec<Recorded> {
        self.events.lock().unwrap().clone()
    }

    pub fn states(&self) -> Vec<JobState> {
        self.all()
            .into_iter()
            .filter_map(|e| match e {
                Recorded::State(state) => Some(state),
                _ => None,
            })
            .collect()
    }

    pub fn lines(&self, stream: OutputStream) -> Vec<String> {
        self.all()
            .into_iter()
            .filter_map(|e| match e {
                Recorded::Output(line) if line.stream == stream => Some(line.text),
                _ => None,
            })
            .collect()
    }

    pub fn overwrite_requests(&self) -> Vec<Vec<PathBuf>> {
        self.all()
            .into_iter()
            .filter_map(|e| match e {
                Recorded::OverwriteRequested(paths) => Some(paths),
                _ => None,
            })
            .collect()
    }

    pub fn finished(&self) -> Vec<JobSummary> {
        self.all()
            .into_iter()
            .filter_map(|e| match e {
                Recorded::Finished(summary) => Some(summary),
                _ => None,
            })
            .collect()
    }

    /// Poll until some engine line equals `text`. Panics after 10 s.
    pub async fn wait_for_line(&self, text: &str) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
        loop {
            let seen = self.all().iter().any(|e| matches!(e, Recorded::Output(line) if line.text == text));
            if seen {
                return;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "engine never printed {text:?}"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

/// Controller on the real filesystem with recording post-processing fakes.
pub struct Harness {
    pub controller: JobController,
    pub events: EventRecorder,
    pub renderer: RecordingRenderer,
    pub assembler: RecordingAssembler,
    collector: JoinHandle<()>,
}

impl Harness {
    /// Must be called inside a Tokio runtime.
    pub fn new(config: &ConfigFile, answer: OverwriteAnswer) -> Self {
        Self::with_renderer(config, answer, RecordingRenderer::new())
    }

    pub fn with_renderer(
        config: &ConfigFile,
        answer: OverwriteAnswer,
        renderer: RecordingRenderer,
    ) -> Self {
        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        let assembler = RecordingAssembler::new();
        let dispatcher = PostProcessDispatcher::new(
            fs.clone(),
            Arc::new(renderer.clone()),
            Arc::new(assembler.clone()),
        );
        let (tx, rx) = mpsc::channel(1024);
        let controller = JobController::new(config, fs, dispatcher, tx);
        let (events, collector) = EventRecorder::spawn(rx, answer);
        Self {
            controller,
            events,
            renderer,
            assembler,
            collector,
        }
    }

    /// Submit `request` and wait for its summary.
    pub async fn run(&mut self, request: JobRequest) -> JobSummary {
        let workflow = request.workflow;
        self.controller.submit(request).expect("submit job");
        self.join(workflow).await
    }

    pub async fn join(&mut self, workflow: WorkflowKind) -> JobSummary {
        crate::with_timeout(self.controller.join(workflow))
            .await
            .expect("worker returned a summary")
    }

    /// Drop the controller and wait until every event has been recorded.
    pub async fn finish(self) -> EventRecorder {
        let Self {
            controller,
            events,
            collector,
            ..
        } = self;
        drop(controller);
        crate::with_timeout(collector).await.expect("collector task");
        events
    }
}
