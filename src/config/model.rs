// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::transform::html::HtmlMinifyOptions;
use crate::transform::js::DEFAULT_TARGET;

/// Build configuration as read from a TOML file.
///
/// ```toml
/// [paths]
/// source = "./source"
/// dest = "./docs"
///
/// [css]
/// browsers = ["defaults"]
///
/// [js]
/// target = "es2015"
///
/// [html]
/// remove_comments = true
///
/// [lint.css.rules]
/// "block-no-empty" = true
/// ```
///
/// Every section is optional; an empty file yields the standard layout.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawBuildConfig {
    #[serde(default)]
    pub paths: PathsSection,

    #[serde(default)]
    pub build: BuildSection,

    #[serde(default)]
    pub css: CssSection,

    #[serde(default)]
    pub js: JsSection,

    #[serde(default)]
    pub html: HtmlMinifyOptions,

    #[serde(default)]
    pub lint: LintSection,

    #[serde(default)]
    pub watch: WatchSection,
}

/// Validated build configuration.
///
/// Constructed via `BuildConfig::try_from(RawBuildConfig)` (see `validate.rs`),
/// or `BuildConfig::default()` for the standard layout.
#[derive(Debug, Clone, Default)]
pub struct BuildConfig {
    pub paths: PathsSection,
    pub build: BuildSection,
    pub css: CssSection,
    pub js: JsSection,
    pub html: HtmlMinifyOptions,
    pub lint: LintSection,
    pub watch: WatchSection,
}

impl BuildConfig {
    pub(crate) fn new_unchecked(raw: RawBuildConfig) -> Self {
        Self {
            paths: raw.paths,
            build: raw.build,
            css: raw.css,
            js: raw.js,
            html: raw.html,
            lint: raw.lint,
            watch: raw.watch,
        }
    }

    pub fn source_root(&self) -> &PathBuf {
        &self.paths.source
    }

    pub fn dest_root(&self) -> &PathBuf {
        &self.paths.dest
    }
}

impl From<BuildConfig> for RawBuildConfig {
    fn from(cfg: BuildConfig) -> Self {
        Self {
            paths: cfg.paths,
            build: cfg.build,
            css: cfg.css,
            js: cfg.js,
            html: cfg.html,
            lint: cfg.lint,
            watch: cfg.watch,
        }
    }
}

/// `[paths]` section: the source and destination trees.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsSection {
    #[serde(default = "default_source")]
    pub source: PathBuf,
    #[serde(default = "default_dest")]
    pub dest: PathBuf,
}

fn default_source() -> PathBuf {
    PathBuf::from("./source")
}

fn default_dest() -> PathBuf {
    PathBuf::from("./docs")
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            source: default_source(),
            dest: default_dest(),
        }
    }
}

/// `[build]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildSection {
    /// Maximum number of tasks executed at the same time within one run.
    ///
    /// `1` runs the plan strictly in order.
    #[serde(default = "default_jobs")]
    pub jobs: usize,
}

fn default_jobs() -> usize {
    1
}

impl Default for BuildSection {
    fn default() -> Self {
        Self { jobs: default_jobs() }
    }
}

/// `[css]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CssSection {
    /// Entry stylesheet, relative to the source root.
    #[serde(default = "default_css_entry")]
    pub entry: PathBuf,
    #[serde(default = "default_true")]
    pub source_map: bool,
    /// Browserslist queries syntax is lowered for; empty disables lowering.
    #[serde(default = "default_browsers")]
    pub browsers: Vec<String>,
}

fn default_browsers() -> Vec<String> {
    vec!["defaults".to_string()]
}

fn default_css_entry() -> PathBuf {
    PathBuf::from("assets/css/style.css")
}

fn default_true() -> bool {
    true
}

impl Default for CssSection {
    fn default() -> Self {
        Self {
            entry: default_css_entry(),
            source_map: true,
            browsers: default_browsers(),
        }
    }
}

/// `[js]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsSection {
    /// Root of the module graph, relative to the source root.
    #[serde(default = "default_js_entry")]
    pub entry: PathBuf,
    /// Bundle path, relative to the destination root.
    #[serde(default = "default_js_entry")]
    pub output: PathBuf,
    #[serde(default = "default_true")]
    pub source_map: bool,
    /// Syntax target, e.g. `es2015` or `chrome80,firefox78`.
    #[serde(default = "default_js_target")]
    pub target: String,
}

fn default_js_target() -> String {
    DEFAULT_TARGET.to_string()
}

fn default_js_entry() -> PathBuf {
    PathBuf::from("assets/js/script.js")
}

impl Default for JsSection {
    fn default() -> Self {
        Self {
            entry: default_js_entry(),
            output: default_js_entry(),
            source_map: true,
            target: default_js_target(),
        }
    }
}

/// `[lint]` section; only CSS is linted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LintSection {
    #[serde(default)]
    pub css: CssLintSection,
}

/// `[lint.css]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CssLintSection {
    /// Turn reported violations into a task failure.
    #[serde(default)]
    pub fail_on_error: bool,

    /// Per-rule switches (`"rule-id" = false` disables a rule).
    ///
    /// Rules not listed are enabled.
    #[serde(default)]
    pub rules: BTreeMap<String, bool>,
}

impl CssLintSection {
    pub fn rule_enabled(&self, id: &str) -> bool {
        self.rules.get(id).copied().unwrap_or(true)
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    /// Window used to batch filesystem events before dispatching.
    ///
    /// Within one window each (rule, path) pair fires once. `0` dispatches
    /// every event as it arrives.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    100
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}
