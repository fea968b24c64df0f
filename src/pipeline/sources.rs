// src/pipeline/sources.rs

use std::fmt;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::debug;

use crate::errors::{AssetflowError, Result};
use crate::fs::FileSystem;

/// Compiled glob patterns, relative to the source root.
///
/// `*` never crosses a `/`; use `**` for recursive matches
/// (`**/*.html` also matches `index.html` at the root).
#[derive(Clone)]
pub struct SourceSet {
    patterns: Vec<String>,
    set: GlobSet,
}

impl fmt::Debug for SourceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceSet")
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl SourceSet {
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        let set = build_globset(&patterns)?;
        Ok(Self { patterns, set })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Whether a path (relative to the source root, forward slashes) matches.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.set.is_match(rel_path)
    }

    /// Materialise every matching file under `root`.
    ///
    /// Returned paths are relative to `root` and sorted.
    pub fn collect(&self, fs: &dyn FileSystem, root: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut stack = vec![root.to_path_buf()];

        while let Some(dir) = stack.pop() {
            for path in fs.read_dir(&dir)? {
                if fs.is_dir(&path) {
                    stack.push(path);
                } else if fs.is_file(&path) {
                    if let Ok(rel) = path.strip_prefix(root) {
                        let rel_str = rel.to_string_lossy().replace('\\', "/");
                        if self.matches(&rel_str) {
                            files.push(rel.to_path_buf());
                        }
                    }
                }
            }
        }

        files.sort();
        debug!(patterns = ?self.patterns, matched = files.len(), "collected source files");
        Ok(files)
    }
}

/// Compile one glob with the separator-aware semantics used everywhere in
/// the crate.
pub fn compile_glob(pattern: &str) -> Result<globset::Glob> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| AssetflowError::config(format!("invalid glob pattern '{pattern}': {e}")))
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(compile_glob(pat)?);
    }
    builder
        .build()
        .map_err(|e| AssetflowError::config(format!("building glob set: {e}")))
}
