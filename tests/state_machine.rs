use trajrun::engine::{InvalidTransition, JobInput, JobMachine, JobState};

fn run(inputs: &[JobInput]) -> Vec<JobState> {
    let mut machine = JobMachine::new();
    inputs
        .iter()
        .map(|&input| machine.step(input).expect("valid transition"))
        .collect()
}

#[test]
fn successful_run_passes_through_running() {
    let states = run(&[
        JobInput::Submitted,
        JobInput::Spawned,
        JobInput::Exited { code: 0 },
        JobInput::Reset,
    ]);
    assert_eq!(
        states,
        vec![
            JobState::Validating,
            JobState::Running,
            JobState::CompletedSuccess,
            JobState::Idle,
        ]
    );
}

#[test]
fn non_zero_exit_fails_with_code() {
    let states = run(&[
        JobInput::Submitted,
        JobInput::Spawned,
        JobInput::Exited { code: 3 },
    ]);
    assert_eq!(states[2], JobState::Failed { exit_code: Some(3) });
    assert!(states[2].is_terminal());
}

#[test]
fn overwrite_prompt_can_be_accepted_or_declined() {
    let accepted = run(&[
        JobInput::Submitted,
        JobInput::ConflictsFound,
        JobInput::Spawned,
    ]);
    assert_eq!(
        accepted,
        vec![
            JobState::Validating,
            JobState::AwaitingOverwriteDecision,
            JobState::Running,
        ]
    );

    let declined = run(&[
        JobInput::Submitted,
        JobInput::ConflictsFound,
        JobInput::OverwriteDeclined,
    ]);
    assert_eq!(declined.last(), Some(&JobState::Idle));
}

#[test]
fn rejection_returns_to_idle() {
    let states = run(&[JobInput::Submitted, JobInput::Rejected]);
    assert_eq!(states, vec![JobState::Validating, JobState::Idle]);
}

#[test]
fn spawn_failure_has_no_exit_code() {
    let states = run(&[JobInput::Submitted, JobInput::SpawnFailed, JobInput::Reset]);
    assert_eq!(states[1], JobState::Failed { exit_code: None });
    assert_eq!(states[2], JobState::Idle);
}

#[test]
fn cancel_while_running_goes_through_cancelling() {
    let states = run(&[
        JobInput::Submitted,
        JobInput::Spawned,
        JobInput::CancelRequested,
        JobInput::CancelRequested,
        JobInput::ProcessDead,
    ]);
    assert_eq!(
        &states[2..],
        &[
            JobState::Cancelling,
            JobState::Cancelling,
            JobState::CompletedCancelled,
        ]
    );
}

#[test]
fn exit_code_is_ignored_once_cancelling() {
    let states = run(&[
        JobInput::Submitted,
        JobInput::Spawned,
        JobInput::CancelRequested,
        JobInput::Exited { code: 143 },
    ]);
    assert_eq!(states.last(), Some(&JobState::CompletedCancelled));
}

#[test]
fn cancel_before_spawn_completes_cancelled() {
    let states = run(&[JobInput::Submitted, JobInput::CancelRequested]);
    assert_eq!(states[1], JobState::CompletedCancelled);

    let states = run(&[
        JobInput::Submitted,
        JobInput::ConflictsFound,
        JobInput::CancelRequested,
    ]);
    assert_eq!(states[2], JobState::CompletedCancelled);
}

#[test]
fn late_cancel_is_a_no_op() {
    let mut machine = JobMachine::new();
    assert_eq!(machine.step(JobInput::CancelRequested), Ok(JobState::Idle));

    machine.step(JobInput::Submitted).unwrap();
    machine.step(JobInput::Spawned).unwrap();
    machine.step(JobInput::Exited { code: 0 }).unwrap();
    assert_eq!(
        machine.step(JobInput::CancelRequested),
        Ok(JobState::CompletedSuccess)
    );
}

#[test]
fn invalid_inputs_leave_state_unchanged() {
    let mut machine = JobMachine::new();
    assert_eq!(
        machine.step(JobInput::Exited { code: 0 }),
        Err(InvalidTransition {
            from: JobState::Idle,
            input: JobInput::Exited { code: 0 },
        })
    );
    assert_eq!(machine.state(), JobState::Idle);

    machine.step(JobInput::Submitted).unwrap();
    machine.step(JobInput::Spawned).unwrap();
    assert!(machine.step(JobInput::Submitted).is_err());
    assert!(machine.step(JobInput::Reset).is_err());
    assert_eq!(machine.state(), JobState::Running);
}

#[test]
fn only_terminal_states_reset() {
    for terminal in [
        vec![JobInput::Submitted, JobInput::SpawnFailed],
        vec![JobInput::Submitted, JobInput::CancelRequested],
        vec![JobInput::Submitted, JobInput::Spawned, JobInput::Exited { code: 1 }],
    ] {
        let mut machine = JobMachine::new();
        for input in terminal {
            machine.step(input).unwrap();
        }
        assert!(machine.state().is_terminal());
        assert_eq!(machine.step(JobInput::Reset), Ok(JobState::Idle));
    }

    let mut machine = JobMachine::new();
    machine.step(JobInput::Submitted).unwrap();
    assert!(machine.step(JobInput::Reset).is_err());
}

#[test]
fn state_display_is_human_readable() {
    assert_eq!(JobState::Failed { exit_code: Some(2) }.to_string(), "failed (exit code 2)");
    assert_eq!(JobState::Failed { exit_code: None }.to_string(), "failed (not started)");
    assert_eq!(JobState::AwaitingOverwriteDecision.to_string(), "awaiting overwrite decision");
}
