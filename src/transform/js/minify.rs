// src/transform/js/minify.rs

use std::path::Path;

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions};
use oxc::minifier::{Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

use crate::errors::{AssetflowError, Result};
use crate::pipeline::sourcemap::SourceMap;
use crate::pipeline::{AssetFile, BuildContext, Stage};

/// Compress and mangle a script with the oxc minifier.
///
/// With a map requested, the map points back at the unminified bundle,
/// which is embedded as its source content.
#[derive(Debug, Clone, Default)]
pub struct MinifyJs;

impl Stage for MinifyJs {
    fn name(&self) -> &'static str {
        "js-minify"
    }

    fn apply(&self, mut file: AssetFile, _ctx: &BuildContext) -> Result<Vec<AssetFile>> {
        let map_path = file.track_source_map.then_some(file.path.as_path());
        let minified = minify_script(file.text()?, map_path)
            .map_err(|message| AssetflowError::parse(&file.path, message))?;

        if let Some(map) = &minified.map {
            file.source_map = Some(SourceMap::from_json(&file.file_name(), map)?);
        }
        file.contents = minified.code.into_bytes();
        Ok(vec![file])
    }
}

#[derive(Debug, Clone)]
pub struct MinifiedScript {
    pub code: String,
    /// Serialized map, when one was requested.
    pub map: Option<String>,
}

/// Minify a classic script, naming `map_path` as the map's source.
pub fn minify_script(
    source: &str,
    map_path: Option<&Path>,
) -> std::result::Result<MinifiedScript, String> {
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, source, SourceType::cjs()).parse();
    if let Some(err) = parsed.errors.first() {
        return Err(err.to_string());
    }
    let mut program = parsed.program;

    let minified = Minifier::new(MinifierOptions::default()).build(&allocator, &mut program);

    let options = CodegenOptions {
        source_map_path: map_path.map(Path::to_path_buf),
        ..CodegenOptions::minify()
    };
    let printed = Codegen::new()
        .with_options(options)
        .with_scoping(minified.scoping)
        .build(&program);

    Ok(MinifiedScript {
        code: printed.code,
        map: printed.map.map(|map| map.to_json_string()),
    })
}
