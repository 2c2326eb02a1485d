// src/analysis/kinds.rs

//! Static description of analysis kinds.
//!
//! Every workflow declares its kinds as `const` tables built from these
//! types. Nothing here performs IO; resolving a template into a path needs
//! only the (already validated) selections and parameters of a job.

use std::collections::BTreeMap;

use super::naming::{clean_selection, output_file_name};

/// Which selection slots an analysis kind reads.
///
/// Slots are 0-based indices into the three selection strings of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionScope {
    /// Slot 0 only (RMSD, RMSF, secondary structure, ...).
    Primary,
    /// Slots 1 and 2; slot 2 may be left empty and falls back to slot 1.
    Pair,
    /// Slots 0 and 1, both mandatory (contacts).
    StrictPair,
    /// No selection at all (backmapping).
    Unscoped,
}

impl SelectionScope {
    /// Slots embedded into output file names.
    pub const fn name_slots(self) -> &'static [usize] {
        match self {
            SelectionScope::Primary => &[0],
            SelectionScope::Pair => &[1, 2],
            SelectionScope::StrictPair => &[0, 1],
            SelectionScope::Unscoped => &[],
        }
    }

    /// Slots that must be non-empty in the request.
    pub const fn required_slots(self) -> &'static [usize] {
        match self {
            SelectionScope::Primary => &[0],
            SelectionScope::Pair => &[1],
            SelectionScope::StrictPair => &[0, 1],
            SelectionScope::Unscoped => &[],
        }
    }

    /// Label used in plot titles, e.g. `"A & B"`. Selections are cleaned
    /// the same way as in file names.
    pub fn label(self, selections: &[String; 3], spaces: &str) -> String {
        self.name_slots()
            .iter()
            .map(|&slot| clean_selection(&selections[slot], spaces))
            .collect::<Vec<_>>()
            .join(" & ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputRole {
    /// Raw result written by the engine and read back by the plotter.
    Data,
    /// Image produced during post-processing.
    Image,
    /// Any other engine product (structures, topologies, ...).
    Artifact,
}

/// How an output file name is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStem {
    /// `prefix` + selections of `scope` + `suffix` + `.ext`.
    Selection {
        prefix: &'static str,
        scope: SelectionScope,
        suffix: &'static str,
        ext: &'static str,
    },
    /// Value of a job parameter, with `.ext` appended unless `ext` is empty.
    Param {
        name: &'static str,
        ext: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputTemplate {
    pub role: OutputRole,
    pub stem: FileStem,
}

impl OutputTemplate {
    pub const fn new(
        role: OutputRole,
        prefix: &'static str,
        scope: SelectionScope,
        suffix: &'static str,
        ext: &'static str,
    ) -> Self {
        Self {
            role,
            stem: FileStem::Selection {
                prefix,
                scope,
                suffix,
                ext,
            },
        }
    }

    pub const fn data(prefix: &'static str, scope: SelectionScope) -> Self {
        Self::new(OutputRole::Data, prefix, scope, "", "dat")
    }

    pub const fn image(prefix: &'static str, scope: SelectionScope, suffix: &'static str) -> Self {
        Self::new(OutputRole::Image, prefix, scope, suffix, "png")
    }

    pub const fn param(role: OutputRole, name: &'static str, ext: &'static str) -> Self {
        Self {
            role,
            stem: FileStem::Param { name, ext },
        }
    }

    /// Resolve the file name for a job. `spaces` replaces whitespace inside
    /// selections.
    ///
    /// Returns `None` when the template names a parameter whose value is
    /// empty (an optional output that was switched off).
    pub fn file_name(
        &self,
        selections: &[String; 3],
        params: &BTreeMap<String, String>,
        spaces: &str,
    ) -> Option<String> {
        match self.stem {
            FileStem::Selection {
                prefix,
                scope,
                suffix,
                ext,
            } => {
                let sels: Vec<&str> = scope
                    .name_slots()
                    .iter()
                    .map(|&slot| selections[slot].as_str())
                    .collect();
                Some(output_file_name(prefix, &sels, spaces, suffix, ext))
            }
            FileStem::Param { name, ext } => {
                let value = params.get(name).map(|v| v.trim()).unwrap_or("");
                if value.is_empty() {
                    None
                } else {
                    Some(output_file_name(value, &[], spaces, "", ext))
                }
            }
        }
    }
}

/// One figure of a plot: which output is the data, which is the image.
///
/// `data` and `image` index into the owning kind's `outputs`. A `{sel}`
/// placeholder in `title` is replaced by the kind's selection label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FigureTemplate {
    pub data: usize,
    pub image: usize,
    pub title: &'static str,
    pub x_label: &'static str,
    pub y_label: &'static str,
    /// X values are frame indices to be converted to microseconds.
    pub time_axis: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisKind {
    pub id: &'static str,
    pub label: &'static str,
    pub bit: u32,
    pub scope: SelectionScope,
    pub outputs: &'static [OutputTemplate],
    pub figures: &'static [FigureTemplate],
}

impl AnalysisKind {
    pub fn title_for(
        &self,
        figure: &FigureTemplate,
        selections: &[String; 3],
        spaces: &str,
    ) -> String {
        figure.title.replace("{sel}", &self.scope.label(selections, spaces))
    }
}
