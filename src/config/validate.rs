// src/config/validate.rs

use std::path::{Component, Path};

use crate::config::model::{BuildConfig, RawBuildConfig};
use crate::errors::{AssetflowError, Result};
use crate::lint::css_rules::RULE_IDS;
use crate::transform::css::css_targets;
use crate::transform::js::transform_options;

impl TryFrom<RawBuildConfig> for BuildConfig {
    type Error = AssetflowError;

    fn try_from(raw: RawBuildConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(BuildConfig::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawBuildConfig) -> Result<()> {
    validate_paths(cfg)?;
    validate_build(cfg)?;
    validate_entries(cfg)?;
    validate_targets(cfg)?;
    validate_lint_rules(cfg)?;
    Ok(())
}

fn validate_paths(cfg: &RawBuildConfig) -> Result<()> {
    if cfg.paths.source.as_os_str().is_empty() {
        return Err(AssetflowError::config("[paths].source must not be empty"));
    }
    if cfg.paths.dest.as_os_str().is_empty() {
        return Err(AssetflowError::config("[paths].dest must not be empty"));
    }
    let source = normalize(&cfg.paths.source);
    let dest = normalize(&cfg.paths.dest);
    if source == dest {
        return Err(AssetflowError::config(format!(
            "[paths].source and [paths].dest must differ (both are {:?})",
            cfg.paths.source
        )));
    }
    if dest.starts_with(&source) {
        return Err(AssetflowError::config(format!(
            "[paths].dest {:?} must not be inside [paths].source {:?}",
            cfg.paths.dest, cfg.paths.source
        )));
    }
    if source.starts_with(&dest) {
        return Err(AssetflowError::config(format!(
            "[paths].source {:?} must not be inside [paths].dest {:?}",
            cfg.paths.source, cfg.paths.dest
        )));
    }
    Ok(())
}

fn validate_build(cfg: &RawBuildConfig) -> Result<()> {
    if cfg.build.jobs == 0 {
        return Err(AssetflowError::config("[build].jobs must be >= 1 (got 0)"));
    }
    Ok(())
}

fn validate_entries(cfg: &RawBuildConfig) -> Result<()> {
    let entries = [
        ("[css].entry", &cfg.css.entry),
        ("[js].entry", &cfg.js.entry),
        ("[js].output", &cfg.js.output),
    ];

    for (key, path) in entries {
        if path.as_os_str().is_empty() {
            return Err(AssetflowError::config(format!("{key} must not be empty")));
        }
        if path.is_absolute() {
            return Err(AssetflowError::config(format!(
                "{key} must be relative to its root (got {:?})",
                path
            )));
        }
        if path.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(AssetflowError::config(format!(
                "{key} must not leave its root (got {:?})",
                path
            )));
        }
    }
    Ok(())
}

fn validate_targets(cfg: &RawBuildConfig) -> Result<()> {
    css_targets(&cfg.css.browsers)?;
    transform_options(&cfg.js.target)?;
    Ok(())
}

fn validate_lint_rules(cfg: &RawBuildConfig) -> Result<()> {
    for id in cfg.lint.css.rules.keys() {
        if !RULE_IDS.contains(&id.as_str()) {
            return Err(AssetflowError::config(format!(
                "unknown css lint rule '{}' in [lint.css.rules] (known: {})",
                id,
                RULE_IDS.join(", ")
            )));
        }
    }
    Ok(())
}

/// Lexical normalisation used to compare the two roots (`./docs` == `docs`).
fn normalize(path: &Path) -> Vec<Component<'_>> {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
