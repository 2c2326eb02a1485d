use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use trajrun::config::ConfigFile;
use trajrun::engine::{JobEvent, JobOutcome, JobState};
use trajrun::fs::FileSystem;
use trajrun::fs::mock::MockFileSystem;
use trajrun::guard::{GuardDecision, OverwriteGuard};
use trajrun::job::JobSpecBuilder;
use trajrun::workflow::WorkflowKind;
use trajrun_test_utils::builders::{JobRequestBuilder, mock_project};
use trajrun_test_utils::{init_tracing, with_timeout};

fn root() -> PathBuf {
    PathBuf::from("/project")
}

fn spec_outputs(fs: &MockFileSystem) -> trajrun::job::ExpectedOutputSet {
    let shared: Arc<dyn FileSystem> = Arc::new(fs.clone());
    let request = JobRequestBuilder::new(WorkflowKind::Analysis, root())
        .topology("system.prmtop")
        .trajectory("traj.nc")
        .kind("rmsd")
        .kind("rgyr")
        .sel(1, "A")
        .build();
    JobSpecBuilder::new(&ConfigFile::default(), shared)
        .build(&request)
        .unwrap()
        .expected_outputs()
        .clone()
}

#[test]
fn conflicts_list_existing_outputs_in_set_order() {
    let fs = mock_project(&root());
    let out = root().join("Analysis");
    fs.add_file(out.join("RGYR_A.png"), "old");
    fs.add_file(out.join("RMSD_A.dat"), "old");

    let (tx, _rx) = mpsc::channel(1);
    let guard = OverwriteGuard::new(Arc::new(fs.clone()), tx);
    assert_eq!(
        guard.conflicts(&spec_outputs(&fs)),
        vec![out.join("RMSD_A.dat"), out.join("RGYR_A.png")]
    );
}

#[tokio::test]
async fn one_prompt_covers_every_conflict() {
    init_tracing();
    let fs = mock_project(&root());
    let (tx, mut rx) = mpsc::channel(4);
    let guard = OverwriteGuard::new(Arc::new(fs), tx);
    let (_cancel_tx, mut cancel) = watch::channel(false);

    let conflicts = vec![root().join("a.dat"), root().join("b.png")];
    let answer = tokio::spawn(async move {
        let Some(JobEvent::OverwriteRequested { job, paths, reply, .. }) = rx.recv().await else {
            panic!("expected an overwrite request");
        };
        assert_eq!(job, 7);
        assert_eq!(paths.len(), 2);
        reply.send(true).unwrap();
        rx.recv().await.is_none()
    });

    let decision = with_timeout(guard.confirm(7, WorkflowKind::Analysis, conflicts, &mut cancel)).await;
    assert_eq!(decision, GuardDecision::Proceed);
    drop(guard);
    assert!(answer.await.unwrap(), "only one request expected");
}

#[tokio::test]
async fn dropped_reply_or_closed_channel_declines() {
    init_tracing();
    let conflicts = vec![root().join("a.dat")];
    let (_cancel_tx, mut cancel) = watch::channel(false);

    let (tx, mut rx) = mpsc::channel(1);
    let guard = OverwriteGuard::new(Arc::new(MockFileSystem::new()), tx);
    tokio::spawn(async move {
        // Receive and drop the reply sender.
        rx.recv().await;
    });
    let decision = with_timeout(guard.confirm(1, WorkflowKind::Contacts, conflicts.clone(), &mut cancel)).await;
    assert_eq!(decision, GuardDecision::Declined { conflicts: conflicts.clone() });

    let (tx, rx) = mpsc::channel(1);
    drop(rx);
    let guard = OverwriteGuard::new(Arc::new(MockFileSystem::new()), tx);
    let decision = guard.confirm(1, WorkflowKind::Contacts, conflicts.clone(), &mut cancel).await;
    assert_eq!(decision, GuardDecision::Declined { conflicts });
}

#[tokio::test]
async fn cancel_while_waiting_for_answer() {
    init_tracing();
    let (tx, _rx) = mpsc::channel(1);
    let guard = OverwriteGuard::new(Arc::new(MockFileSystem::new()), tx);
    let (cancel_tx, mut cancel) = watch::channel(false);

    let waiter = tokio::spawn(async move {
        guard
            .confirm(1, WorkflowKind::Analysis, vec![root().join("a.dat")], &mut cancel)
            .await
    });
    tokio::task::yield_now().await;
    cancel_tx.send_replace(true);

    assert_eq!(with_timeout(waiter).await.unwrap(), GuardDecision::Cancelled);
}

#[tokio::test]
async fn no_conflicts_proceeds_without_asking() {
    let (tx, mut rx) = mpsc::channel(1);
    let guard = OverwriteGuard::new(Arc::new(MockFileSystem::new()), tx);
    let (_cancel_tx, mut cancel) = watch::channel(false);

    let decision = guard.confirm(1, WorkflowKind::Analysis, Vec::new(), &mut cancel).await;
    assert_eq!(decision, GuardDecision::Proceed);
    assert!(rx.try_recv().is_err());
}

#[cfg(unix)]
mod with_jobs {
    use super::*;
    use trajrun_test_utils::builders::Project;
    use trajrun_test_utils::engine::recording_engine;
    use trajrun_test_utils::harness::{Harness, OverwriteAnswer};

    fn existing_output(project: &Project) -> PathBuf {
        let out = project.output_dir(WorkflowKind::Analysis);
        std::fs::create_dir_all(&out).unwrap();
        let path = out.join("RMSD_A.dat");
        std::fs::write(&path, "previous results").unwrap();
        path
    }

    async fn run_with(answer: OverwriteAnswer) -> (Project, PathBuf, JobOutcome, Vec<JobState>) {
        let project = Project::new();
        let existing = existing_output(&project);
        let record = project.path().join("args.txt");
        let engine = recording_engine(project.path(), &record);
        let mut harness = Harness::new(&project.config(&engine), answer);

        let summary = harness
            .run(project.request(WorkflowKind::Analysis).kind("rmsd").sel(1, "A").build())
            .await;
        let events = harness.finish().await;
        assert_eq!(events.overwrite_requests(), vec![vec![existing.clone()]]);
        (project, record, summary.outcome, events.states())
    }

    #[tokio::test]
    async fn declined_overwrite_leaves_everything_untouched() {
        init_tracing();
        let (project, record, outcome, states) = run_with(OverwriteAnswer::Decline).await;

        assert!(matches!(outcome, JobOutcome::Declined { ref conflicts } if conflicts.len() == 1));
        assert_eq!(
            states,
            vec![
                JobState::Validating,
                JobState::AwaitingOverwriteDecision,
                JobState::Idle,
            ]
        );
        assert!(!record.exists(), "engine must not run");

        let out = project.output_dir(WorkflowKind::Analysis);
        let entries: Vec<_> = std::fs::read_dir(&out)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec!["RMSD_A.dat"]);
        assert_eq!(
            std::fs::read_to_string(out.join("RMSD_A.dat")).unwrap(),
            "previous results"
        );
    }

    #[tokio::test]
    async fn unanswered_prompt_declines() {
        init_tracing();
        let (_project, record, outcome, _) = run_with(OverwriteAnswer::Ignore).await;
        assert!(matches!(outcome, JobOutcome::Declined { .. }));
        assert!(!record.exists());
    }

    #[tokio::test]
    async fn accepted_overwrite_runs_the_engine() {
        init_tracing();
        let (_project, record, outcome, states) = run_with(OverwriteAnswer::Accept).await;
        assert!(outcome.is_success(), "{outcome:?}");
        assert!(record.exists());
        assert_eq!(
            &states[..3],
            &[
                JobState::Validating,
                JobState::AwaitingOverwriteDecision,
                JobState::Running,
            ]
        );
    }
}
