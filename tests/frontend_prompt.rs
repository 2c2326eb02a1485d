#![cfg(unix)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use trajrun::engine::{JobController, JobEvent, JobOutcome};
use trajrun::frontend::{Confirm, FrontEnd};
use trajrun::fs::{FileSystem, RealFileSystem};
use trajrun::postprocess::PostProcessDispatcher;
use trajrun::types::OverwritePolicy;
use trajrun::workflow::WorkflowKind;
use trajrun_test_utils::builders::Project;
use trajrun_test_utils::engine::recording_engine;
use trajrun_test_utils::fakes::{RecordingAssembler, RecordingRenderer};
use trajrun_test_utils::{init_tracing, with_timeout};

/// Answers only when the test releases it, like a user staring at the prompt.
struct HeldConfirm {
    asked: Arc<AtomicBool>,
    release: Mutex<std::sync::mpsc::Receiver<bool>>,
}

impl Confirm for HeldConfirm {
    fn confirm(&self, _workflow: WorkflowKind, _paths: &[PathBuf]) -> std::io::Result<bool> {
        self.asked.store(true, Ordering::SeqCst);
        let release = self.release.lock().unwrap();
        Ok(release.recv().unwrap_or(false))
    }
}

struct Setup {
    project: Project,
    record: PathBuf,
    controller: JobController,
    events: mpsc::Receiver<JobEvent>,
}

/// Project whose RMSD data file already exists, so every run asks first.
fn setup() -> Setup {
    let project = Project::new();
    let out = project.output_dir(WorkflowKind::Analysis);
    std::fs::create_dir_all(&out).unwrap();
    std::fs::write(out.join("RMSD_A.dat"), "old").unwrap();

    let record = project.path().join("args.txt");
    let engine = recording_engine(project.path(), &record);
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let dispatcher = PostProcessDispatcher::new(
        fs.clone(),
        Arc::new(RecordingRenderer::new()),
        Arc::new(RecordingAssembler::new()),
    );
    let (tx, events) = mpsc::channel(256);
    let mut controller = JobController::new(&project.config(&engine), fs, dispatcher, tx);
    controller
        .submit(project.request(WorkflowKind::Analysis).kind("rmsd").sel(1, "A").build())
        .unwrap();

    Setup {
        project,
        record,
        controller,
        events,
    }
}

fn held_confirm() -> (Arc<HeldConfirm>, Arc<AtomicBool>, std::sync::mpsc::Sender<bool>) {
    let asked = Arc::new(AtomicBool::new(false));
    let (release_tx, release_rx) = std::sync::mpsc::channel();
    let confirm = Arc::new(HeldConfirm {
        asked: asked.clone(),
        release: Mutex::new(release_rx),
    });
    (confirm, asked, release_tx)
}

async fn wait_until_asked(asked: &AtomicBool) {
    while !asked.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn interrupt_cancels_a_job_waiting_at_the_prompt() {
    init_tracing();
    let mut s = setup();
    let (confirm, asked, release_tx) = held_confirm();
    let frontend = FrontEnd::new(OverwritePolicy::Ask, confirm);
    let (interrupt_tx, mut interrupts) = mpsc::channel(4);

    let drive = frontend.drive(
        &mut s.controller,
        WorkflowKind::Analysis,
        &mut s.events,
        &mut interrupts,
    );
    let press = async {
        wait_until_asked(&asked).await;
        interrupt_tx.send(()).await.unwrap();
    };
    let (summary, ()) = with_timeout(async { tokio::join!(drive, press) }).await;

    let summary = summary.expect("job summary");
    assert!(
        matches!(summary.outcome, JobOutcome::Cancelled { escalated: false }),
        "{:?}",
        summary.outcome
    );
    assert!(!s.record.exists(), "engine must not start");
    let out = s.project.output_dir(WorkflowKind::Analysis);
    assert_eq!(std::fs::read_to_string(out.join("RMSD_A.dat")).unwrap(), "old");

    // Let the parked prompt thread return; its answer goes nowhere.
    let _ = release_tx.send(true);
}

#[tokio::test]
async fn prompt_answer_reaches_the_waiting_job() {
    init_tracing();
    let mut s = setup();
    let (confirm, asked, release_tx) = held_confirm();
    let frontend = FrontEnd::new(OverwritePolicy::Ask, confirm);
    let (_interrupt_tx, mut interrupts) = mpsc::channel(4);

    let drive = frontend.drive(
        &mut s.controller,
        WorkflowKind::Analysis,
        &mut s.events,
        &mut interrupts,
    );
    let answer = async {
        wait_until_asked(&asked).await;
        release_tx.send(true).unwrap();
    };
    let (summary, ()) = with_timeout(async { tokio::join!(drive, answer) }).await;

    let summary = summary.expect("job summary");
    assert!(summary.outcome.is_success(), "{:?}", summary.outcome);
    assert!(s.record.exists());
}

#[tokio::test]
async fn never_policy_declines_without_asking() {
    init_tracing();
    let mut s = setup();
    let (confirm, asked, _release_tx) = held_confirm();
    let frontend = FrontEnd::new(OverwritePolicy::Never, confirm);
    let (_interrupt_tx, mut interrupts) = mpsc::channel(4);

    let summary = with_timeout(frontend.drive(
        &mut s.controller,
        WorkflowKind::Analysis,
        &mut s.events,
        &mut interrupts,
    ))
    .await
    .expect("job summary");

    assert!(matches!(summary.outcome, JobOutcome::Declined { .. }), "{:?}", summary.outcome);
    assert!(!asked.load(Ordering::SeqCst));
    assert!(!s.record.exists());
}
