// src/analysis/mod.rs

//! Analysis catalogue primitives shared by every workflow.
//!
//! - [`bitmask`] holds the `AnalysisBitmask` passed to the engine.
//! - [`kinds`] describes analysis kinds, their output files and plots.
//! - [`naming`] is the single function deriving output file names from
//!   selections. The builder, the overwrite guard and the post-processing
//!   dispatcher all go through it.

pub mod bitmask;
pub mod kinds;
pub mod naming;

pub use bitmask::AnalysisBitmask;
pub use kinds::{
    AnalysisKind, FigureTemplate, FileStem, OutputRole, OutputTemplate, SelectionScope,
};
pub use naming::{clean_selection, output_file_name};
