// src/pipeline/sourcemap.rs

//! Debug maps emitted alongside compiled CSS and JS.
//!
//! [`InitSourceMap`] marks a file so the compiler stage that follows it
//! produces a [`SourceMap`]; [`WriteSourceMap`] writes that map beside the
//! output file and links it from the output.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{AssetflowError, Result};
use crate::pipeline::{AssetFile, BuildContext, Stage};

/// Source Map revision 3.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u8,
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub sources_content: Vec<String>,
    #[serde(default)]
    pub names: Vec<String>,
    pub mappings: String,
}

impl SourceMap {
    /// Read a map serialized by a compiler, naming it after `file`.
    pub fn from_json(file: &str, json: &str) -> Result<Self> {
        let mut map: SourceMap = serde_json::from_str(json)
            .map_err(|e| AssetflowError::Other(anyhow::anyhow!("reading source map: {e}")))?;
        map.file = file.to_string();
        Ok(map)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| AssetflowError::Other(anyhow::anyhow!("serializing source map: {e}")))
    }
}

/// Request a map from the compiler stages that follow (`sourcemaps.init()`).
#[derive(Debug, Clone, Default)]
pub struct InitSourceMap;

impl Stage for InitSourceMap {
    fn name(&self) -> &'static str {
        "sourcemap-init"
    }

    fn apply(&self, mut file: AssetFile, _ctx: &BuildContext) -> Result<Vec<AssetFile>> {
        file.track_source_map = true;
        Ok(vec![file])
    }
}

/// Write the attached map as `<file>.map` in `dir` (relative to the output
/// file's directory) and point the output at it.
#[derive(Debug, Clone)]
pub struct WriteSourceMap {
    dir: PathBuf,
}

impl WriteSourceMap {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Default for WriteSourceMap {
    fn default() -> Self {
        Self::new(".")
    }
}

impl Stage for WriteSourceMap {
    fn name(&self) -> &'static str {
        "sourcemap-write"
    }

    fn apply(&self, mut file: AssetFile, _ctx: &BuildContext) -> Result<Vec<AssetFile>> {
        let Some(map) = file.source_map.take() else {
            return Ok(vec![file]);
        };

        let file_name = file
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| AssetflowError::parse(&file.path, "output has no file name"))?;
        let map_name = format!("{file_name}.map");

        let rel_map = self.dir.join(&map_name);
        let map_url = url_path(&rel_map);
        let map_path = match file.path.parent() {
            Some(parent) => parent.join(&rel_map),
            None => rel_map.clone(),
        };

        let comment = if is_css(&file.path) {
            format!("\n/*# sourceMappingURL={map_url} */")
        } else {
            format!("\n//# sourceMappingURL={map_url}")
        };
        file.contents.extend_from_slice(comment.as_bytes());

        let map_file = AssetFile::new(normalize_rel(&map_path), map.to_json()?.into_bytes());
        Ok(vec![file, map_file])
    }
}

fn is_css(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("css"))
}

fn url_path(path: &Path) -> String {
    normalize_rel(path).to_string_lossy().replace('\\', "/")
}

/// Drop `.` components so `assets/css/./style.css.map` becomes
/// `assets/css/style.css.map`.
fn normalize_rel(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, std::path::Component::CurDir))
        .collect()
}
