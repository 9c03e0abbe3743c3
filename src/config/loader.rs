// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::model::ConfigFile;
use crate::config::validate::validate_config;

/// Load a build description from a path and return the raw `ConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform
/// semantic validation (reference checks, acyclicity, option ranges).
/// Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading build description at {:?}", path))?;

    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("parsing TOML build description from {:?}", path))?;

    Ok(config)
}

/// Load a build description and run semantic validation. The recommended
/// entry point for the rest of the application.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let config = load_from_path(&path)?;
    validate_config(&config)?;
    Ok(config)
}

/// Default config path: `Pipeforge.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Pipeforge.toml")
}
