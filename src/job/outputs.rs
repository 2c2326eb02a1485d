// src/job/outputs.rs

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::analysis::{AnalysisBitmask, OutputRole};
use crate::workflow::Workflow;

/// What causes a file to be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputOwner {
    Kind(&'static str),
    Flag(&'static str),
    Report,
}

impl fmt::Display for OutputOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputOwner::Kind(id) => write!(f, "kind {id}"),
            OutputOwner::Flag(name) => write!(f, "flag {name}"),
            OutputOwner::Report => f.write_str("report"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedOutput {
    pub owner: OutputOwner,
    pub role: OutputRole,
    pub path: PathBuf,
}

/// Every file a job will produce, derived before it runs.
///
/// Ordered by kind bit, then output-producing flags, then the report. The
/// set never changes once computed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectedOutputSet {
    entries: Vec<ExpectedOutput>,
}

impl ExpectedOutputSet {
    pub(crate) fn derive(
        workflow: &Workflow,
        bitmask: AnalysisBitmask,
        selections: &[String; 3],
        params: &BTreeMap<String, String>,
        flags: &BTreeSet<String>,
        output_dir: &Path,
        report: Option<&Path>,
    ) -> Self {
        let spaces = workflow.selection_spaces;
        let mut entries = Vec::new();

        for bit in bitmask.iter() {
            let Some(kind) = workflow.kind_by_bit(bit) else {
                continue;
            };
            for template in kind.outputs {
                if let Some(name) = template.file_name(selections, params, spaces) {
                    entries.push(ExpectedOutput {
                        owner: OutputOwner::Kind(kind.id),
                        role: template.role,
                        path: output_dir.join(name),
                    });
                }
            }
        }

        for flag in workflow.flags.iter().filter(|f| flags.contains(f.name)) {
            for template in flag.outputs {
                if let Some(name) = template.file_name(selections, params, spaces) {
                    entries.push(ExpectedOutput {
                        owner: OutputOwner::Flag(flag.name),
                        role: template.role,
                        path: output_dir.join(name),
                    });
                }
            }
        }

        if let Some(path) = report {
            entries.push(ExpectedOutput {
                owner: OutputOwner::Report,
                role: OutputRole::Artifact,
                path: path.to_path_buf(),
            });
        }

        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExpectedOutput> {
        self.entries.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|e| e.path.as_path())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
