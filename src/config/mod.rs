// src/config/mod.rs

//! Configuration loading and validation for trajrun.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk, falling back to defaults (`loader.rs`).
//! - Validate durations and other values (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{ConfigFile, EngineConfig, OverwriteSection, RawConfigFile, RenderSection};
