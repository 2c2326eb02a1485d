// src/job/request.rs

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::workflow::WorkflowKind;

/// Raw, unvalidated field values for one run, as entered by the user.
///
/// Nothing here is checked; [`crate::job::JobSpecBuilder`] turns it into an
/// immutable [`crate::job::JobSpec`] or a `ValidationError`.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub workflow: WorkflowKind,
    /// Requested kind ids (`"rmsd"`, `"sasa"`, ...). Implied kinds need not
    /// be listed.
    pub kinds: Vec<String>,
    /// Selection slots 1..=3, untrimmed.
    pub selections: [String; 3],
    pub params: BTreeMap<String, String>,
    pub flags: BTreeSet<String>,
    pub topology: Option<PathBuf>,
    pub trajectory: Option<PathBuf>,
    pub reference: Option<PathBuf>,
    pub working_dir: PathBuf,
}

impl JobRequest {
    pub fn new(workflow: WorkflowKind, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            workflow,
            kinds: Vec::new(),
            selections: Default::default(),
            params: BTreeMap::new(),
            flags: BTreeSet::new(),
            topology: None,
            trajectory: None,
            reference: None,
            working_dir: working_dir.into(),
        }
    }
}
