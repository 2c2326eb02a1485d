#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;
use trajrun::config::ConfigFile;
use trajrun::fs::mock::MockFileSystem;
use trajrun::job::JobRequest;
use trajrun::workflow::WorkflowKind;

pub const TOPOLOGY: &str = "system.prmtop";
pub const TRAJECTORY: &str = "traj.nc";
pub const SCRIPT_DIR: &str = "TCL";

/// Scratch project directory with a topology, a trajectory and every engine
/// script in `TCL/`.
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp project");
        std::fs::write(dir.path().join(TOPOLOGY), "topology").expect("write topology");
        std::fs::write(dir.path().join(TRAJECTORY), "trajectory").expect("write trajectory");
        let scripts = dir.path().join(SCRIPT_DIR);
        std::fs::create_dir_all(&scripts).expect("create script dir");
        for kind in WorkflowKind::ALL {
            std::fs::write(scripts.join(kind.descriptor().script), "# engine script\n")
                .expect("write engine script");
        }
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn output_dir(&self, workflow: WorkflowKind) -> PathBuf {
        self.path().join(workflow.descriptor().output_subdir)
    }

    /// Request with topology and trajectory already filled in.
    pub fn request(&self, workflow: WorkflowKind) -> JobRequestBuilder {
        JobRequestBuilder::new(workflow, self.path())
            .topology(TOPOLOGY)
            .trajectory(TRAJECTORY)
    }

    /// Config running `engine` directly with the workflow arguments only
    /// (no dispatch flags, script flag or args marker), short timeouts.
    pub fn config(&self, engine: &Path) -> ConfigFile {
        let mut cfg = ConfigFile::default();
        cfg.engine.program = engine.to_path_buf();
        cfg.engine.dispatch_args = Vec::new();
        cfg.engine.script_flag = String::new();
        cfg.engine.args_marker = String::new();
        cfg.engine.grace_period = Duration::from_millis(500);
        cfg.engine.drain_timeout = Duration::from_secs(1);
        cfg
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

/// Mock filesystem rooted at `root` with the same layout as [`Project`].
pub fn mock_project(root: &Path) -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_file(root.join(TOPOLOGY), "topology");
    fs.add_file(root.join(TRAJECTORY), "trajectory");
    for kind in WorkflowKind::ALL {
        fs.add_file(
            root.join(SCRIPT_DIR).join(kind.descriptor().script),
            "# engine script\n",
        );
    }
    fs
}

/// Builder for `JobRequest` to simplify test setup.
pub struct JobRequestBuilder {
    request: JobRequest,
}

impl JobRequestBuilder {
    pub fn new(workflow: WorkflowKind, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            request: JobRequest::new(workflow, working_dir),
        }
    }

    pub fn kind(mut self, id: &str) -> Self {
        self.request.kinds.push(id.to_string());
        self
    }

    /// Set selection slot `slot` (1-based).
    pub fn sel(mut self, slot: usize, selection: &str) -> Self {
        self.request.selections[slot - 1] = selection.to_string();
        self
    }

    pub fn param(mut self, name: &str, value: &str) -> Self {
        self.request
            .params
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn flag(mut self, name: &str) -> Self {
        self.request.flags.insert(name.to_string());
        self
    }

    pub fn topology(mut self, path: impl Into<PathBuf>) -> Self {
        self.request.topology = Some(path.into());
        self
    }

    pub fn trajectory(mut self, path: impl Into<PathBuf>) -> Self {
        self.request.trajectory = Some(path.into());
        self
    }

    pub fn reference(mut self, path: impl Into<PathBuf>) -> Self {
        self.request.reference = Some(path.into());
        self
    }

    pub fn no_topology(mut self) -> Self {
        self.request.topology = None;
        self
    }

    pub fn build(self) -> JobRequest {
        self.request
    }
}
