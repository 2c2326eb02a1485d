// src/postprocess/mod.rs

//! Post-processing after a successful engine run.
//!
//! - [`dispatcher`] walks the requested kinds and drives the collaborators.
//! - [`render`] is the plot renderer boundary.
//! - [`report`] is the report assembler boundary.
//!
//! Which collaborators are used is decided by the `[render]` config section;
//! see [`from_config`].

use std::sync::Arc;

use crate::config::RenderSection;
use crate::fs::FileSystem;

pub mod dispatcher;
pub mod render;
pub mod report;

pub use dispatcher::{PostProcessDispatcher, PostProcessReport};
pub use render::{CommandPlotRenderer, DisabledPlotRenderer, Figure, PlotRenderer, PlotRequest};
pub use report::{
    CommandReportAssembler, HtmlReportAssembler, ReportAssembler, ReportPage, ReportRequest,
};

/// Dispatcher wired to the configured renderer and assembler.
pub fn from_config(render: &RenderSection, fs: Arc<dyn FileSystem>) -> PostProcessDispatcher {
    let renderer: Arc<dyn PlotRenderer> = match CommandPlotRenderer::from_command(&render.plot_command) {
        Some(renderer) => Arc::new(renderer),
        None => Arc::new(DisabledPlotRenderer),
    };
    let assembler: Arc<dyn ReportAssembler> =
        match CommandReportAssembler::from_command(&render.report_command) {
            Some(assembler) => Arc::new(assembler),
            None => Arc::new(HtmlReportAssembler::new(fs.clone())),
        };
    PostProcessDispatcher::new(fs, renderer, assembler)
}
