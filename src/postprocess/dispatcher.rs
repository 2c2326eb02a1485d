// src/postprocess/dispatcher.rs

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::analysis::AnalysisKind;
use crate::errors::PostProcessingError;
use crate::fs::FileSystem;
use crate::job::JobSpec;

use super::render::{Figure, PlotRenderer, PlotRequest};
use super::report::{ReportAssembler, ReportPage, ReportRequest};

/// What post-processing produced for one successful job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostProcessReport {
    /// Kinds whose plots were rendered.
    pub plotted: Vec<String>,
    /// Kinds skipped because the engine wrote none of their data files.
    pub skipped: Vec<String>,
    pub failed: Vec<PostProcessingError>,
    pub report: Option<PathBuf>,
}

impl PostProcessReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.failed.is_empty()
    }

    /// Human-readable warnings, one per skipped kind or failure.
    pub fn warnings(&self) -> Vec<String> {
        self.skipped
            .iter()
            .map(|kind| format!("no data files found for '{kind}'; plots skipped"))
            .chain(self.failed.iter().map(|e| e.to_string()))
            .collect()
    }
}

/// Turns a successful job's data files into plots and, when requested, a
/// report.
///
/// Kinds are handled one after another in ascending bit order. A failure or
/// panic while plotting one kind is recorded and the next kind proceeds.
/// The report is assembled last and only pages kinds plotted by this run, so
/// images left over from an earlier run never reach it.
#[derive(Debug, Clone)]
pub struct PostProcessDispatcher {
    fs: Arc<dyn FileSystem>,
    renderer: Arc<dyn PlotRenderer>,
    assembler: Arc<dyn ReportAssembler>,
}

impl PostProcessDispatcher {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        renderer: Arc<dyn PlotRenderer>,
        assembler: Arc<dyn ReportAssembler>,
    ) -> Self {
        Self {
            fs,
            renderer,
            assembler,
        }
    }

    /// Blocking; run it on a blocking thread.
    pub fn dispatch(&self, spec: &JobSpec) -> PostProcessReport {
        let mut report = PostProcessReport::default();

        for kind in spec.requested_kinds() {
            if kind.figures.is_empty() {
                continue;
            }

            let figures = self.figures_for(spec, kind);
            if figures.is_empty() {
                warn!(
                    workflow = %spec.workflow(),
                    kind = kind.id,
                    "no data files found; skipping plots"
                );
                report.skipped.push(kind.id.to_string());
                continue;
            }

            let request = PlotRequest {
                kind: kind.id.to_string(),
                figures,
            };
            debug!(kind = kind.id, figures = request.figures.len(), "rendering plots");

            match catch_unwind(AssertUnwindSafe(|| self.renderer.render(&request))) {
                Ok(Ok(())) => {
                    info!(workflow = %spec.workflow(), kind = kind.id, "plots rendered");
                    report.plotted.push(kind.id.to_string());
                }
                Ok(Err(e)) => {
                    warn!(workflow = %spec.workflow(), kind = kind.id, error = %e, "plotting failed");
                    report.failed.push(e);
                }
                Err(payload) => {
                    let e = PostProcessingError::PlotPanicked {
                        kind: kind.id.to_string(),
                        message: panic_message(payload.as_ref()),
                    };
                    warn!(workflow = %spec.workflow(), kind = kind.id, error = %e, "plotting panicked");
                    report.failed.push(e);
                }
            }
        }

        if let Some(output) = spec.report_path() {
            match self.assemble_report(spec, output.to_path_buf(), &report.plotted) {
                Ok(path) => report.report = Some(path),
                Err(e) => {
                    warn!(workflow = %spec.workflow(), error = %e, "report not assembled");
                    report.failed.push(e);
                }
            }
        }

        report
    }

    fn figures_for(&self, spec: &JobSpec, kind: &AnalysisKind) -> Vec<Figure> {
        let spaces = spec.descriptor().selection_spaces;
        let mut figures = Vec::new();
        for template in kind.figures {
            let (Some(data), Some(image)) = (
                self.output_path(spec, kind, template.data),
                self.output_path(spec, kind, template.image),
            ) else {
                continue;
            };
            if !self.fs.is_file(&data) {
                debug!(kind = kind.id, data = %data.display(), "data file missing");
                continue;
            }
            figures.push(Figure {
                data,
                image,
                title: kind.title_for(template, spec.selections(), spaces),
                x_label: template.x_label.to_string(),
                y_label: template.y_label.to_string(),
                time_factor: if template.time_axis {
                    spec.time_factor()
                } else {
                    None
                },
            });
        }
        figures
    }

    fn output_path(&self, spec: &JobSpec, kind: &AnalysisKind, index: usize) -> Option<PathBuf> {
        let template = kind.outputs.get(index)?;
        let name = template.file_name(
            spec.selections(),
            spec.params(),
            spec.descriptor().selection_spaces,
        )?;
        Some(spec.output_dir().join(name))
    }

    fn assemble_report(
        &self,
        spec: &JobSpec,
        output: PathBuf,
        plotted: &[String],
    ) -> Result<PathBuf, PostProcessingError> {
        let spaces = spec.descriptor().selection_spaces;
        let mut pages = Vec::new();
        for kind in spec.requested_kinds() {
            if kind.figures.is_empty() {
                continue;
            }
            if !plotted.iter().any(|id| id == kind.id) {
                debug!(kind = kind.id, "not plotted by this run; no report page");
                continue;
            }
            for template in kind.figures {
                let Some(image) = self.output_path(spec, kind, template.image) else {
                    continue;
                };
                if self.fs.is_file(&image) {
                    pages.push(ReportPage {
                        heading: kind.title_for(template, spec.selections(), spaces),
                        image,
                    });
                } else {
                    warn!(
                        kind = kind.id,
                        image = %image.display(),
                        "image missing; page dropped from report"
                    );
                }
            }
        }

        if pages.is_empty() {
            return Err(PostProcessingError::ReportFailed {
                path: output,
                message: "no images to include".to_string(),
            });
        }

        let title = spec
            .descriptor()
            .report
            .map(|r| r.title.replace("{sel}", &r.scope.label(spec.selections(), spaces)))
            .unwrap_or_default();
        let request = ReportRequest {
            title,
            output: output.clone(),
            pages,
        };

        match catch_unwind(AssertUnwindSafe(|| self.assembler.assemble(&request))) {
            Ok(Ok(())) => {
                info!(report = %output.display(), pages = request.pages.len(), "report assembled");
                Ok(output)
            }
            Ok(Err(e)) => Err(e),
            Err(payload) => Err(PostProcessingError::ReportFailed {
                path: output,
                message: format!("assembler panicked: {}", panic_message(payload.as_ref())),
            }),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
