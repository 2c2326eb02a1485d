// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; durations and other values are
/// checked by [`load_and_validate`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
///
/// A missing file is not an error: every section has defaults, so the
/// built-in configuration is validated and returned instead.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let raw_config = if path.exists() {
        load_from_path(path)?
    } else {
        debug!(path = %path.display(), "config file not found, using defaults");
        RawConfigFile::default()
    };
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}
