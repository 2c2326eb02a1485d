// src/job/builder.rs

//! Request validation and argument-vector construction.
//!
//! Checks run in a fixed order and stop at the first failure:
//! 1. kinds, flags and parameters are known to the workflow,
//! 2. at least one analysis is requested and no exclusive pair is,
//! 3. every active kind has the selections it needs,
//! 4. parameters parse according to their class,
//! 5. input files and the engine script exist.
//!
//! The builder only reads the filesystem.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::analysis::{AnalysisBitmask, SelectionScope, output_file_name};
use crate::config::{ConfigFile, EngineConfig};
use crate::errors::ValidationError;
use crate::fs::FileSystem;
use crate::job::outputs::ExpectedOutputSet;
use crate::job::request::JobRequest;
use crate::job::spec::JobSpec;
use crate::workflow::{ArgSlot, ParamClass, RunDir, Workflow};

type Result<T> = std::result::Result<T, ValidationError>;

#[derive(Debug, Clone)]
pub struct JobSpecBuilder {
    engine: EngineConfig,
    report_extension: String,
    fs: Arc<dyn FileSystem>,
}

impl JobSpecBuilder {
    pub fn new(config: &ConfigFile, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            engine: config.engine.clone(),
            report_extension: config.render.report_extension.trim().to_string(),
            fs,
        }
    }

    pub fn build(&self, request: &JobRequest) -> Result<JobSpec> {
        let workflow = request.workflow.descriptor();

        check_known_names(workflow, request)?;
        let bitmask = resolve_bitmask(workflow, &request.kinds)?;
        let selections = resolve_selections(workflow, bitmask, &request.selections)?;
        let params = resolve_params(workflow, &request.params)?;
        let flags: BTreeSet<String> = request
            .flags
            .iter()
            .map(|f| f.trim().to_lowercase())
            .collect();

        let inputs = self.resolve_inputs(workflow, request)?;

        let output_dir = request.working_dir.join(workflow.output_subdir);
        let working_dir = match workflow.run_in {
            RunDir::Project => request.working_dir.clone(),
            RunDir::Output => output_dir.clone(),
        };

        let report_path = workflow
            .report
            .filter(|report| flags.contains(report.flag))
            .map(|report| {
                let sels: Vec<&str> = report
                    .scope
                    .name_slots()
                    .iter()
                    .map(|&slot| selections[slot].as_str())
                    .collect();
                output_dir.join(output_file_name(
                    report.prefix,
                    &sels,
                    workflow.selection_spaces,
                    "",
                    &self.report_extension,
                ))
            });

        let positional_args = self.render_args(
            workflow,
            &ArgContext {
                bitmask,
                selections: &selections,
                params: &params,
                flags: &flags,
                inputs: &inputs,
                output_dir: &output_dir,
            },
        );

        let expected_outputs = ExpectedOutputSet::derive(
            workflow,
            bitmask,
            &selections,
            &params,
            &flags,
            &output_dir,
            report_path.as_deref(),
        );

        debug!(
            workflow = %workflow.kind,
            bitmask = %bitmask,
            outputs = expected_outputs.len(),
            "job spec built"
        );

        Ok(JobSpec {
            workflow: workflow.kind,
            engine_path: self.engine.program.clone(),
            script_path: inputs.script,
            positional_args,
            working_dir,
            output_dir,
            analysis_bitmask: bitmask,
            selections,
            params,
            report_path,
            expected_outputs,
        })
    }

    fn resolve_inputs(&self, workflow: &Workflow, request: &JobRequest) -> Result<Inputs> {
        let base = &request.working_dir;

        let topology = self.required_file("topology", request.topology.as_deref(), base)?;
        let trajectory = self.required_file("trajectory", request.trajectory.as_deref(), base)?;

        let reference = match request.reference.as_deref() {
            Some(path) => {
                let path = absolutize(base, path);
                if !self.fs.exists(&path) {
                    return Err(ValidationError::InputNotFound {
                        what: "reference structure",
                        path,
                    });
                }
                Some(path)
            }
            None => None,
        };

        let script_dir = absolutize(base, &self.engine.script_dir);
        let script = script_dir.join(workflow.script);
        if !self.fs.is_file(&script) {
            return Err(ValidationError::InputNotFound {
                what: "engine script",
                path: script,
            });
        }

        Ok(Inputs {
            topology,
            trajectory,
            reference,
            script_dir,
            script,
        })
    }

    fn required_file(
        &self,
        what: &'static str,
        path: Option<&Path>,
        base: &Path,
    ) -> Result<PathBuf> {
        let path = path
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(ValidationError::MissingInput { what })?;
        let path = absolutize(base, path);
        if !self.fs.is_file(&path) {
            return Err(ValidationError::InputNotFound { what, path });
        }
        Ok(path)
    }

    fn render_args(&self, workflow: &Workflow, ctx: &ArgContext<'_>) -> Vec<String> {
        let mut args = Vec::with_capacity(workflow.template.len() + 4);
        let param = |name: &str| ctx.params.get(name).cloned().unwrap_or_default();
        let switch = |on: bool| if on { "1" } else { "0" }.to_string();

        for arg in workflow.template {
            match *arg {
                ArgSlot::DispatchArgs => args.extend(self.engine.dispatch_args.iter().cloned()),
                ArgSlot::ScriptFlag => {
                    if !self.engine.script_flag.is_empty() {
                        args.push(self.engine.script_flag.clone());
                    }
                }
                ArgSlot::Script => args.push(path_arg(&ctx.inputs.script)),
                ArgSlot::ArgsMarker => {
                    if !self.engine.args_marker.is_empty() {
                        args.push(self.engine.args_marker.clone());
                    }
                }
                ArgSlot::Topology => args.push(path_arg(&ctx.inputs.topology)),
                ArgSlot::Trajectory => args.push(path_arg(&ctx.inputs.trajectory)),
                ArgSlot::Selection(slot) => args.push(ctx.selections[slot].clone()),
                ArgSlot::Bitmask => args.push(ctx.bitmask.to_string()),
                ArgSlot::ScriptDir => args.push(path_arg(&ctx.inputs.script_dir)),
                ArgSlot::SupportFile(name) => args.push(path_arg(&ctx.inputs.script_dir.join(name))),
                ArgSlot::OutputDir => args.push(path_arg(ctx.output_dir)),
                ArgSlot::OutputPath(name) => args.push(path_arg(&ctx.output_dir.join(param(name)))),
                ArgSlot::Reference => args.push(
                    ctx.inputs
                        .reference
                        .as_deref()
                        .map(path_arg)
                        .unwrap_or_else(|| "None".to_string()),
                ),
                ArgSlot::Param(name) => args.push(param(name)),
                ArgSlot::ParamIfBit(name, bit) => {
                    if ctx.bitmask.contains(bit) {
                        args.push(param(name));
                    } else {
                        args.push(String::new());
                    }
                }
                ArgSlot::BitSwitch(bit) => args.push(switch(ctx.bitmask.contains(bit))),
                ArgSlot::FlagSwitch(name) => args.push(switch(ctx.flags.contains(name))),
            }
        }

        args
    }
}

struct Inputs {
    topology: PathBuf,
    trajectory: PathBuf,
    reference: Option<PathBuf>,
    script_dir: PathBuf,
    script: PathBuf,
}

struct ArgContext<'a> {
    bitmask: AnalysisBitmask,
    selections: &'a [String; 3],
    params: &'a BTreeMap<String, String>,
    flags: &'a BTreeSet<String>,
    inputs: &'a Inputs,
    output_dir: &'a Path,
}

fn check_known_names(workflow: &Workflow, request: &JobRequest) -> Result<()> {
    for kind in &request.kinds {
        if workflow.kind_by_id(kind).is_none() {
            return Err(ValidationError::UnknownKind {
                workflow: workflow.kind,
                kind: kind.clone(),
            });
        }
    }
    for flag in &request.flags {
        if workflow.flag(&flag.trim().to_lowercase()).is_none() {
            return Err(ValidationError::UnknownFlag {
                workflow: workflow.kind,
                flag: flag.clone(),
            });
        }
    }
    for param in request.params.keys() {
        if workflow.param(param.trim()).is_none() {
            return Err(ValidationError::UnknownParameter {
                workflow: workflow.kind,
                param: param.clone(),
            });
        }
    }
    Ok(())
}

fn resolve_bitmask(workflow: &Workflow, kinds: &[String]) -> Result<AnalysisBitmask> {
    let mut bitmask = AnalysisBitmask::from_bits(workflow.implied_bits);
    for id in kinds {
        if let Some(kind) = workflow.kind_by_id(id) {
            bitmask.insert(kind.bit);
        }
    }

    if bitmask.is_empty() {
        return Err(ValidationError::NoAnalysisSelected);
    }

    for &(first, second) in workflow.exclusive {
        let requested = |id: &str| {
            workflow
                .kind_by_id(id)
                .is_some_and(|kind| bitmask.contains(kind.bit))
        };
        if requested(first) && requested(second) {
            return Err(ValidationError::ConflictingKinds {
                first: first.to_string(),
                second: second.to_string(),
            });
        }
    }

    Ok(bitmask)
}

/// Check required slots, then apply the fallback rule:
/// - only `Primary` kinds: slot 1 fills empty slots 2 and 3,
/// - only `Pair` kinds: slot 2 fills an empty slot 1,
/// - an empty slot 3 always takes slot 2.
fn resolve_selections(
    workflow: &Workflow,
    bitmask: AnalysisBitmask,
    raw: &[String; 3],
) -> Result<[String; 3]> {
    let mut selections: [String; 3] = raw.clone().map(|s| s.trim().to_string());

    let mut primary = false;
    let mut pair = false;
    for bit in bitmask.iter() {
        let Some(kind) = workflow.kind_by_bit(bit) else {
            continue;
        };
        for &slot in kind.scope.required_slots() {
            if selections[slot].is_empty() {
                return Err(ValidationError::MissingSelection {
                    slot: slot + 1,
                    kind: kind.id.to_string(),
                });
            }
        }
        match kind.scope {
            SelectionScope::Primary => primary = true,
            SelectionScope::Pair => pair = true,
            SelectionScope::StrictPair | SelectionScope::Unscoped => {}
        }
    }

    if primary && !pair {
        for slot in 1..3 {
            if selections[slot].is_empty() {
                selections[slot] = selections[0].clone();
            }
        }
    } else if pair && !primary && selections[0].is_empty() {
        selections[0] = selections[1].clone();
    }
    if selections[2].is_empty() {
        selections[2] = selections[1].clone();
    }

    Ok(selections)
}

fn resolve_params(
    workflow: &Workflow,
    raw: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, String>> {
    let given: BTreeMap<&str, &str> = raw
        .iter()
        .map(|(k, v)| (k.trim(), v.trim()))
        .collect();

    let mut params = BTreeMap::new();
    for spec in workflow.params {
        let value = match given.get(spec.name).copied().filter(|v| !v.is_empty()) {
            Some(v) => v,
            None => spec.default.ok_or_else(|| ValidationError::MissingParameter {
                param: spec.name.to_string(),
            })?,
        };

        let valid = match spec.class {
            ParamClass::PositiveNumber => value
                .parse::<f64>()
                .is_ok_and(|n| n.is_finite() && n > 0.0),
            ParamClass::PositiveInteger => value.parse::<u64>().is_ok_and(|n| n > 0),
            ParamClass::Integer => value.parse::<i64>().is_ok(),
            ParamClass::Text => true,
        };
        if !valid {
            return Err(ValidationError::InvalidNumber {
                param: spec.name.to_string(),
                value: value.to_string(),
                expected: spec.class.expected(),
            });
        }

        params.insert(spec.name.to_string(), value.to_string());
    }

    Ok(params)
}

fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
