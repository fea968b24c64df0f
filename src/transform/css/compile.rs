// src/transform/css/compile.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use elsa::sync::FrozenMap;
use lightningcss::bundler::{Bundler, ResolveResult, SourceProvider};
use lightningcss::error::Error as CssError;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions};
use lightningcss::targets::{Browsers, Targets};
use parcel_sourcemap::SourceMap as CssSourceMap;
use tracing::debug;

use crate::errors::{AssetflowError, Result};
use crate::fs::{FileSystem, normalize_path};
use crate::pipeline::sourcemap::SourceMap;
use crate::pipeline::{AssetFile, BuildContext, Stage};

/// Browser targets for a list of browserslist queries.
///
/// An empty list means no lowering at all.
pub fn css_targets(queries: &[String]) -> Result<Targets> {
    if queries.is_empty() {
        return Ok(Targets::default());
    }
    let browsers = Browsers::from_browserslist(queries.iter().map(String::as_str)).map_err(|e| {
        AssetflowError::config(format!("invalid browserslist query in [css].browsers: {e}"))
    })?;
    Ok(Targets {
        browsers,
        ..Targets::default()
    })
}

/// Bundle, lower and minify a stylesheet with lightningcss.
///
/// Local `@import`s are inlined, including several on one line; imports of
/// `http:`, `https:` and `//` URLs stay in place. Syntax is lowered for
/// `targets` and the result is minified. With a map requested, every
/// inlined file appears among its sources.
#[derive(Debug, Clone, Default)]
pub struct CompileCss {
    targets: Targets,
}

impl CompileCss {
    pub fn new(targets: Targets) -> Self {
        Self { targets }
    }
}

impl Stage for CompileCss {
    fn name(&self) -> &'static str {
        "css-compile"
    }

    fn apply(&self, mut file: AssetFile, ctx: &BuildContext) -> Result<Vec<AssetFile>> {
        let text = file.text()?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text).to_string();

        let full = ctx.source_path(&file.path);
        let entry = normalize_path(&full).unwrap_or(full);

        let provider = TreeProvider::new(ctx.fs.clone(), ctx.source_root.clone());
        provider.files.insert(entry.clone(), text);

        let root = ctx.source_root.to_string_lossy().into_owned();
        let mut source_map = file.track_source_map.then(|| CssSourceMap::new(&root));

        let mut sheet = {
            let mut bundler = Bundler::new(&provider, source_map.as_mut(), ParserOptions::default());
            bundler.bundle(&entry).map_err(|e| located_error(ctx, &file.path, e))?
        };

        sheet
            .minify(MinifyOptions {
                targets: self.targets,
                ..MinifyOptions::default()
            })
            .map_err(|e| located_error(ctx, &file.path, e))?;

        let printed = sheet
            .to_css(PrinterOptions {
                minify: true,
                source_map: source_map.as_mut(),
                targets: self.targets,
                ..PrinterOptions::default()
            })
            .map_err(|e| located_error(ctx, &file.path, e))?;

        debug!(
            file = %file.rel_str(),
            sources = sheet.sources.len(),
            "stylesheet compiled"
        );

        if let Some(mut map) = source_map {
            file.source_map = Some(convert_map(ctx, &file, &mut map)?);
        }
        file.contents = printed.code.into_bytes();
        Ok(vec![file])
    }
}

/// Serves stylesheets from the build's filesystem.
///
/// Texts are kept for the life of the provider, since parsed rules borrow
/// from them.
struct TreeProvider {
    fs: Arc<dyn FileSystem>,
    source_root: PathBuf,
    files: FrozenMap<PathBuf, String>,
}

impl TreeProvider {
    fn new(fs: Arc<dyn FileSystem>, source_root: PathBuf) -> Self {
        Self {
            fs,
            source_root,
            files: FrozenMap::new(),
        }
    }
}

impl SourceProvider for TreeProvider {
    type Error = AssetflowError;

    fn read<'a>(&'a self, file: &Path) -> std::result::Result<&'a str, Self::Error> {
        if let Some(text) = self.files.get(file) {
            return Ok(text);
        }
        let text = self.fs.read_to_string(file)?;
        let text = match text.strip_prefix('\u{feff}') {
            Some(stripped) => stripped.to_string(),
            None => text,
        };
        Ok(self.files.insert(file.to_path_buf(), text))
    }

    fn resolve(
        &self,
        specifier: &str,
        originating_file: &Path,
    ) -> std::result::Result<ResolveResult, Self::Error> {
        if is_remote(specifier) {
            return Ok(ResolveResult::External(specifier.to_string()));
        }

        let joined = match specifier.strip_prefix('/') {
            Some(rooted) => self.source_root.join(rooted),
            None => originating_file.parent().unwrap_or(Path::new("")).join(specifier),
        };
        let target = normalize_path(&joined).ok_or_else(|| {
            AssetflowError::parse(
                originating_file,
                format!("@import '{specifier}' points outside the source tree"),
            )
        })?;

        if target.extension().is_none() {
            let with_ext = target.with_extension("css");
            if self.fs.is_file(&with_ext) {
                return Ok(ResolveResult::File(with_ext));
            }
        }
        Ok(ResolveResult::File(target))
    }
}

fn is_remote(spec: &str) -> bool {
    let lower = spec.to_ascii_lowercase();
    lower.starts_with("http:") || lower.starts_with("https:") || lower.starts_with("//")
}

/// Turn a lightningcss error into a parse error naming the file and line
/// it points at.
fn located_error<T: std::fmt::Display>(
    ctx: &BuildContext,
    entry: &Path,
    err: CssError<T>,
) -> AssetflowError {
    match err.loc {
        Some(loc) => AssetflowError::parse(
            ctx.display_rel(Path::new(&loc.filename)),
            format!("{} on line {}, column {}", err.kind, loc.line + 1, loc.column),
        ),
        None => AssetflowError::parse(entry, err.kind.to_string()),
    }
}

fn convert_map(ctx: &BuildContext, file: &AssetFile, map: &mut CssSourceMap) -> Result<SourceMap> {
    let mut mappings = Vec::new();
    map.write_vlq(&mut mappings)
        .map_err(|e| AssetflowError::parse(&file.path, format!("writing source map: {e:?}")))?;

    Ok(SourceMap {
        version: 3,
        file: file.file_name(),
        sources: map
            .get_sources()
            .iter()
            .map(|s| ctx.display_rel(Path::new(s)))
            .collect(),
        sources_content: map.get_sources_content().clone(),
        names: map.get_names().clone(),
        mappings: String::from_utf8_lossy(&mappings).into_owned(),
    })
}
