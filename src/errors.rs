// src/errors.rs

//! Crate-wide error taxonomy.
//!
//! - `Parse`: malformed input for a given stage (isolated per file, except for
//!   the JS bundle where the whole module graph is one unit).
//! - `TaskNotFound`: a requested task name is not registered.
//! - `Config`: invalid configuration, cyclic prerequisites, missing source root.
//! - `Io`: unreadable / unwritable path.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetflowError {
    #[error("Parse error in {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Task not found: '{name}' (available tasks: {})", available.join(", "))]
    TaskNotFound { name: String, available: Vec<String> },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AssetflowError {
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        AssetflowError::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AssetflowError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        AssetflowError::Config(message.into())
    }

    /// Whether this error only invalidates the file it was raised for.
    pub fn is_parse(&self) -> bool {
        matches!(self, AssetflowError::Parse { .. })
    }
}

pub type Result<T> = std::result::Result<T, AssetflowError>;
