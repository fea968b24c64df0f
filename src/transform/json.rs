// src/transform/json.rs

use serde_json::Value;

use crate::errors::{AssetflowError, Result};
use crate::pipeline::{AssetFile, BuildContext, Stage};

/// Re-serialize a JSON document without insignificant whitespace.
///
/// `serde_json` is built with `preserve_order` and `arbitrary_precision`, so
/// key order and number literals survive the round trip.
#[derive(Debug, Clone, Default)]
pub struct MinifyJson;

impl Stage for MinifyJson {
    fn name(&self) -> &'static str {
        "json-minify"
    }

    fn apply(&self, mut file: AssetFile, _ctx: &BuildContext) -> Result<Vec<AssetFile>> {
        let minified = minify_json(file.text()?)
            .map_err(|message| AssetflowError::parse(&file.path, message))?;
        file.contents = minified.into_bytes();
        Ok(vec![file])
    }
}

/// Minify a JSON document, returning a message on invalid input.
pub fn minify_json(input: &str) -> std::result::Result<String, String> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let value: Value = serde_json::from_str(input).map_err(|e| format!("invalid JSON: {e}"))?;
    serde_json::to_string(&value).map_err(|e| format!("serializing JSON: {e}"))
}
