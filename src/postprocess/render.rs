// src/postprocess/render.rs

//! Plot renderer boundary.

use std::fmt::Debug;
use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

use crate::errors::PostProcessingError;

/// One image to draw from one data file.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub data: PathBuf,
    pub image: PathBuf,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Multiply x values by this to get microseconds.
    pub time_factor: Option<f64>,
}

/// All figures of one analysis kind. Rendered in a single call.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotRequest {
    pub kind: String,
    pub figures: Vec<Figure>,
}

/// Draws the figures of a [`PlotRequest`].
///
/// Called from a blocking thread, sequentially, once per analysis kind.
pub trait PlotRenderer: Send + Sync + Debug {
    fn render(&self, request: &PlotRequest) -> Result<(), PostProcessingError>;
}

/// Runs an external command once per figure:
/// `program args... --data D --output O --title T --xlabel X --ylabel Y [--time-factor F]`.
#[derive(Debug, Clone)]
pub struct CommandPlotRenderer {
    program: String,
    args: Vec<String>,
}

impl CommandPlotRenderer {
    /// `None` when `command` is empty.
    pub fn from_command(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl PlotRenderer for CommandPlotRenderer {
    fn render(&self, request: &PlotRequest) -> Result<(), PostProcessingError> {
        for figure in &request.figures {
            let mut cmd = Command::new(&self.program);
            cmd.args(&self.args)
                .arg("--data")
                .arg(&figure.data)
                .arg("--output")
                .arg(&figure.image)
                .arg("--title")
                .arg(&figure.title)
                .arg("--xlabel")
                .arg(&figure.x_label)
                .arg("--ylabel")
                .arg(&figure.y_label);
            if let Some(factor) = figure.time_factor {
                cmd.arg("--time-factor").arg(factor.to_string());
            }

            debug!(kind = %request.kind, image = %figure.image.display(), "running plot command");
            let output = cmd.output().map_err(|e| PostProcessingError::PlotFailed {
                kind: request.kind.clone(),
                message: format!("could not run '{}': {e}", self.program),
            })?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let last = stderr.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("");
                return Err(PostProcessingError::PlotFailed {
                    kind: request.kind.clone(),
                    message: format!(
                        "'{}' exited with {} for {}: {last}",
                        self.program,
                        output.status.code().unwrap_or(-1),
                        figure.image.display()
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Used when no plot command is configured. Every kind is reported as a
/// warning and the job still succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledPlotRenderer;

impl PlotRenderer for DisabledPlotRenderer {
    fn render(&self, request: &PlotRequest) -> Result<(), PostProcessingError> {
        Err(PostProcessingError::RendererUnavailable {
            kind: request.kind.clone(),
        })
    }
}
