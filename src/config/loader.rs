// src/config/loader.rs

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{BuildConfig, RawBuildConfig};
use crate::errors::{AssetflowError, Result};

/// Load a configuration file from a given path and return the raw `RawBuildConfig`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawBuildConfig> {
    let path = path.as_ref();
    let contents =
        std::fs::read_to_string(path).map_err(|e| AssetflowError::io(path, e))?;

    let config: RawBuildConfig = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<BuildConfig> {
    let raw_config = load_from_path(&path)?;
    let config = BuildConfig::try_from(raw_config)?;
    Ok(config)
}

/// Resolve the configuration used for a run.
///
/// - An explicitly requested file must exist.
/// - The default file (`Assetflow.toml`) is optional; when it is absent the
///   standard layout is used.
pub fn load_or_default(path: impl AsRef<Path>, explicit: bool) -> Result<BuildConfig> {
    let path = path.as_ref();
    if !explicit && !path.exists() {
        debug!(?path, "no config file found; using defaults");
        return Ok(BuildConfig::default());
    }
    load_and_validate(path)
}

/// Helper to resolve a default config path.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Assetflow.toml")
}
