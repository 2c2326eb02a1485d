// src/config/validate.rs

use crate::config::model::{ConfigFile, EngineConfig, RawConfigFile, RawEngineSection};
use crate::errors::{Result, TrajrunError};
use crate::types::parse_duration;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::TrajrunError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let engine = validate_engine(raw.engine)?;
        validate_render(&raw.render)?;
        Ok(ConfigFile::new_unchecked(engine, raw.render, raw.overwrite))
    }
}

fn validate_engine(raw: RawEngineSection) -> Result<EngineConfig> {
    if raw.program.as_os_str().is_empty() {
        return Err(TrajrunError::ConfigError(
            "[engine].program must not be empty".to_string(),
        ));
    }

    if raw.tail_lines == 0 {
        return Err(TrajrunError::ConfigError(
            "[engine].tail_lines must be >= 1 (got 0)".to_string(),
        ));
    }

    let grace_period = parse_duration(&raw.grace_period).map_err(|e| {
        TrajrunError::ConfigError(format!("[engine].grace_period: {e}"))
    })?;
    let drain_timeout = parse_duration(&raw.drain_timeout).map_err(|e| {
        TrajrunError::ConfigError(format!("[engine].drain_timeout: {e}"))
    })?;

    Ok(EngineConfig {
        program: raw.program,
        dispatch_args: raw.dispatch_args,
        script_flag: raw.script_flag,
        args_marker: raw.args_marker,
        script_dir: raw.script_dir,
        grace_period,
        drain_timeout,
        tail_lines: raw.tail_lines,
    })
}

fn validate_render(render: &crate::config::model::RenderSection) -> Result<()> {
    let ext = render.report_extension.trim();
    if ext.is_empty() || ext.contains('.') || ext.contains('/') {
        return Err(TrajrunError::ConfigError(format!(
            "[render].report_extension must be a bare extension like \"html\" (got {:?})",
            render.report_extension
        )));
    }
    Ok(())
}
