// src/exec/supervisor.rs

//! Engine process lifecycle.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::{debug, info, warn};

use crate::errors::SpawnError;
use crate::job::JobSpec;

/// Launches the engine described by a [`JobSpec`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessSupervisor;

impl ProcessSupervisor {
    /// Spawn exactly one engine process.
    ///
    /// stdin is closed, stdout and stderr are piped. On Unix the child leads
    /// its own process group so a cancel also reaches anything it forks.
    pub fn spawn(&self, spec: &JobSpec) -> Result<ProcessHandle, SpawnError> {
        let mut cmd = Command::new(spec.engine_path());
        cmd.args(spec.positional_args())
            .current_dir(spec.working_dir())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn().map_err(|source| SpawnError {
            program: spec.engine_path().to_path_buf(),
            source,
        })?;

        let pid = child.id();
        info!(
            workflow = %spec.workflow(),
            pid,
            program = %spec.engine_path().display(),
            "engine process started"
        );

        Ok(ProcessHandle {
            stdout: child.stdout.take(),
            stderr: child.stderr.take(),
            child,
            pid,
        })
    }
}

/// Exclusive owner of a running engine process and its output pipes.
#[derive(Debug)]
pub struct ProcessHandle {
    child: Child,
    pid: Option<u32>,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
}

impl ProcessHandle {
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.stdout.take()
    }

    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.stderr.take()
    }

    /// Wait for the process to exit. A signal death reports `-1`.
    pub async fn wait(&mut self) -> io::Result<i32> {
        let status = self.child.wait().await?;
        Ok(exit_code(status))
    }

    /// Terminate the process: SIGTERM, then SIGKILL once `grace` elapses.
    ///
    /// Returns `true` when the kill had to be escalated.
    pub async fn cancel(&mut self, grace: Duration) -> io::Result<bool> {
        if let Some(status) = self.child.try_wait()? {
            debug!(pid = self.pid, code = exit_code(status), "process already exited before cancel");
            return Ok(false);
        }

        self.terminate();

        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(status) => {
                let status = status?;
                info!(pid = self.pid, code = exit_code(status), "engine terminated after SIGTERM");
                Ok(false)
            }
            Err(_) => {
                warn!(
                    pid = self.pid,
                    grace_ms = grace.as_millis() as u64,
                    "engine ignored SIGTERM; killing"
                );
                self.kill();
                self.child.wait().await?;
                Ok(true)
            }
        }
    }

    #[cfg(unix)]
    fn terminate(&mut self) {
        self.signal_group(libc::SIGTERM);
    }

    #[cfg(not(unix))]
    fn terminate(&mut self) {
        if let Err(e) = self.child.start_kill() {
            warn!(pid = self.pid, error = %e, "failed to stop engine process");
        }
    }

    fn kill(&mut self) {
        #[cfg(unix)]
        self.signal_group(libc::SIGKILL);

        if let Err(e) = self.child.start_kill() {
            debug!(pid = self.pid, error = %e, "start_kill after group kill");
        }
    }

    #[cfg(unix)]
    fn signal_group(&self, signal: libc::c_int) {
        let Some(pid) = self.pid.and_then(|pid| libc::pid_t::try_from(pid).ok()) else {
            return;
        };
        // SAFETY: `kill` has no memory-safety preconditions. A negative pid
        // addresses the process group created at spawn.
        let rc = unsafe { libc::kill(-pid, signal) };
        if rc != 0 {
            debug!(
                pid,
                signal,
                error = %io::Error::last_os_error(),
                "signalling process group failed"
            );
        }
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}
