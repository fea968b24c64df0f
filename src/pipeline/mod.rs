// src/pipeline/mod.rs

//! Transform pipelines.
//!
//! A pipeline materialises a set of files from the source tree, pushes each
//! one through an ordered list of [`Stage`]s, and writes whatever comes out
//! beneath the destination tree at the same relative path.
//!
//! - [`sources`] turns glob patterns into a concrete file list.
//! - [`file_pipeline`] runs stages per matched file, isolating failures.
//! - [`bundle_pipeline`] treats a whole JS module graph as one unit.
//! - [`sourcemap`] requests and writes the maps compilers produce.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::{AssetflowError, Result};
use crate::fs::{FileSystem, normalize_path};
use crate::lint::LintViolation;
use crate::pipeline::sourcemap::SourceMap;

pub mod bundle_pipeline;
pub mod file_pipeline;
pub mod sourcemap;
pub mod sources;

pub use bundle_pipeline::BundlePipeline;
pub use file_pipeline::FilePipeline;
pub use sources::SourceSet;

/// Roots and filesystem shared by every pipeline in a run.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub fs: Arc<dyn FileSystem>,
    pub source_root: PathBuf,
    pub dest_root: PathBuf,
}

impl BuildContext {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        source_root: impl Into<PathBuf>,
        dest_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fs,
            source_root: source_root.into(),
            dest_root: dest_root.into(),
        }
    }

    pub fn source_path(&self, rel: &Path) -> PathBuf {
        self.source_root.join(rel)
    }

    pub fn dest_path(&self, rel: &Path) -> PathBuf {
        self.dest_root.join(rel)
    }

    /// Path relative to the source root, with forward slashes.
    ///
    /// Falls back to the full path for files outside the root.
    pub fn display_rel(&self, path: &Path) -> String {
        let root = normalize_path(&self.source_root).unwrap_or_else(|| self.source_root.clone());
        let path = normalize_path(path).unwrap_or_else(|| path.to_path_buf());
        path.strip_prefix(&root)
            .unwrap_or(&path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

/// A file flowing through a pipeline.
#[derive(Debug, Clone)]
pub struct AssetFile {
    /// Path relative to the source root on the way in, and relative to the
    /// destination root on the way out.
    pub path: PathBuf,
    pub contents: Vec<u8>,
    /// Set by [`sourcemap::InitSourceMap`]; compilers emit a map when true.
    pub track_source_map: bool,
    /// Finished map waiting to be written.
    pub source_map: Option<SourceMap>,
}

impl AssetFile {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
            track_source_map: false,
            source_map: None,
        }
    }

    /// Contents as UTF-8, or a parse error naming this file.
    pub fn text(&self) -> Result<&str> {
        std::str::from_utf8(&self.contents)
            .map_err(|e| AssetflowError::parse(&self.path, format!("invalid UTF-8: {e}")))
    }

    pub fn rel_str(&self) -> String {
        self.path.to_string_lossy().replace('\\', "/")
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// One opaque transform step.
///
/// Stages are pure with respect to the destination tree: they map one input
/// file to zero or more output files (e.g. a minified file plus its map).
/// Reading other source files (import resolution) goes through `ctx.fs`.
pub trait Stage: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn apply(&self, file: AssetFile, ctx: &BuildContext) -> Result<Vec<AssetFile>>;
}

/// Something a task can execute.
pub trait TaskPipeline: Send + Sync + fmt::Debug {
    /// Short human-readable description for `--dry-run`.
    fn describe(&self) -> String;

    fn run(&self, ctx: &BuildContext) -> Result<PipelineReport>;
}

/// What a pipeline invocation did.
#[derive(Debug, Default)]
pub struct PipelineReport {
    /// Number of source files matched.
    pub matched: usize,
    /// Destination paths written.
    pub written: Vec<PathBuf>,
    /// Per-file failures; the batch continued past each of these.
    pub failures: Vec<AssetflowError>,
    /// Lint findings (never affect `written`).
    pub violations: Vec<LintViolation>,
}

impl PipelineReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Convert into a task result: the first per-file failure, if any.
    pub fn into_result(mut self) -> Result<PipelineReport> {
        if self.failures.is_empty() {
            Ok(self)
        } else {
            Err(self.failures.remove(0))
        }
    }
}

/// Run `stages` in order over a single file.
pub fn apply_stages(
    stages: &[Arc<dyn Stage>],
    file: AssetFile,
    ctx: &BuildContext,
) -> Result<Vec<AssetFile>> {
    let mut current = vec![file];
    for stage in stages {
        let mut next = Vec::with_capacity(current.len());
        for f in current {
            next.extend(stage.apply(f, ctx)?);
        }
        current = next;
    }
    Ok(current)
}

/// Write pipeline outputs beneath the destination root.
pub fn write_outputs(
    ctx: &BuildContext,
    outputs: Vec<AssetFile>,
    report: &mut PipelineReport,
) -> Result<()> {
    for out in outputs {
        let dest = ctx.dest_path(&out.path);
        ctx.fs.write(&dest, &out.contents)?;
        report.written.push(dest);
    }
    Ok(())
}
