// src/tasks.rs

//! The standard asset task set and watch table.

use std::path::Path;
use std::sync::Arc;

use crate::config::BuildConfig;
use crate::dag::{TaskAction, TaskRegistry};
use crate::errors::Result;
use crate::lint::CssLintGate;
use crate::pipeline::sourcemap::{InitSourceMap, WriteSourceMap};
use crate::pipeline::{BundlePipeline, FilePipeline, SourceSet, TaskPipeline};
use crate::transform::css::css_targets;
use crate::transform::{CompileCss, MinifyHtml, MinifyJs, MinifyJson, MinifySvg, OptimizeImage};
use crate::watch::Dispatcher;

pub const HTML_GLOB: &str = "**/*.html";
pub const CSS_GLOB: &str = "assets/css/**/*.css";
pub const JS_GLOB: &str = "assets/js/**/*.js";
pub const JSON_GLOB: &str = "**/*.json";
pub const IMAGE_GLOB: &str = "**/*.{gif,ico,jpg,jpeg,png}";
pub const SVG_GLOB: &str = "**/*.svg";
pub const TEXT_GLOB: &str = "**/*.txt";

/// Prerequisites of `build`, in execution order.
pub const BUILD_STEPS: &[&str] = &["lint", "css", "html", "js", "json", "images", "svg", "copy"];

fn pipeline(p: impl TaskPipeline + 'static) -> TaskAction {
    TaskAction::Pipeline(Arc::new(p))
}

fn glob_of(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Build the registry of every standard task.
pub fn standard_registry(cfg: &BuildConfig) -> Result<TaskRegistry> {
    let mut registry = TaskRegistry::new();
    let none: [&str; 0] = [];

    let mut css = FilePipeline::new("css", SourceSet::new([glob_of(&cfg.css.entry)])?);
    if cfg.css.source_map {
        css = css.stage(InitSourceMap);
    }
    css = css.stage(CompileCss::new(css_targets(&cfg.css.browsers)?));
    if cfg.css.source_map {
        css = css.stage(WriteSourceMap::default());
    }
    registry.define("css", pipeline(css), none);

    registry.define(
        "copy",
        pipeline(FilePipeline::new("copy", SourceSet::new([TEXT_GLOB])?)),
        none,
    );

    registry.define(
        "html",
        pipeline(
            FilePipeline::new("html", SourceSet::new([HTML_GLOB])?)
                .stage(MinifyHtml::new(cfg.html.clone())),
        ),
        none,
    );

    registry.define(
        "images",
        pipeline(FilePipeline::new("images", SourceSet::new([IMAGE_GLOB])?).stage(OptimizeImage)),
        none,
    );

    let mut js = BundlePipeline::new("js", &cfg.js.entry, &cfg.js.output).target(&cfg.js.target);
    if cfg.js.source_map {
        js = js.stage(InitSourceMap);
    }
    js = js.stage(MinifyJs);
    if cfg.js.source_map {
        js = js.stage(WriteSourceMap::default());
    }
    registry.define("js", pipeline(js), none);

    registry.define(
        "json",
        pipeline(FilePipeline::new("json", SourceSet::new([JSON_GLOB])?).stage(MinifyJson)),
        none,
    );

    registry.define(
        "lint:css",
        pipeline(CssLintGate::new(
            SourceSet::new([CSS_GLOB])?,
            cfg.lint.css.clone(),
        )),
        none,
    );

    registry.define(
        "svg",
        pipeline(FilePipeline::new("svg", SourceSet::new([SVG_GLOB])?).stage(MinifySvg)),
        none,
    );

    registry.define("watch", TaskAction::Watch, none);
    registry.define("lint", TaskAction::Aggregate, ["lint:css"]);
    registry.define("build", TaskAction::Aggregate, BUILD_STEPS.iter().copied());
    registry.define("default", TaskAction::Aggregate, ["build", "watch"]);

    registry.validate()?;
    Ok(registry)
}

/// The standard watch table.
pub fn standard_dispatcher() -> Result<Dispatcher> {
    let mut dispatcher = Dispatcher::new();
    dispatcher.watch(HTML_GLOB, "html")?;
    dispatcher.watch(CSS_GLOB, "lint:css")?;
    dispatcher.watch(CSS_GLOB, "css")?;
    dispatcher.watch(JS_GLOB, "js")?;
    dispatcher.watch(JSON_GLOB, "json")?;
    dispatcher.watch(IMAGE_GLOB, "images")?;
    dispatcher.watch(SVG_GLOB, "svg")?;
    dispatcher.watch(TEXT_GLOB, "copy")?;
    Ok(dispatcher)
}
