// src/lint/mod.rs

//! Linter gate.
//!
//! Lint pipelines read their sources and report rule violations; they never
//! write to the destination tree. Whether violations fail the task is a
//! configuration switch.

use std::fmt;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::config::CssLintSection;
use crate::errors::{AssetflowError, Result};
use crate::pipeline::{BuildContext, PipelineReport, SourceSet, TaskPipeline};
use crate::lint::syntax::parse_stylesheet;

pub mod css_rules;
pub mod syntax;

/// A single rule finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintViolation {
    pub rule: String,
    /// Path relative to the source root.
    pub path: PathBuf,
    /// 1-based line.
    pub line: usize,
    pub message: String,
}

impl fmt::Display for LintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} {} ({})",
            self.path.display(),
            self.line,
            self.message,
            self.rule
        )
    }
}

/// Stylesheet linter over a set of source files.
#[derive(Debug, Clone)]
pub struct CssLintGate {
    sources: SourceSet,
    settings: CssLintSection,
}

impl CssLintGate {
    pub fn new(sources: SourceSet, settings: CssLintSection) -> Self {
        Self { sources, settings }
    }

    /// Lint one stylesheet's text.
    pub fn lint_text(&self, rel: &std::path::Path, text: &str) -> Result<Vec<LintViolation>> {
        let violation = |rule: &str, line: usize, message: String| LintViolation {
            rule: rule.to_string(),
            path: rel.to_path_buf(),
            line,
            message,
        };

        let sheet = match parse_stylesheet(text) {
            Ok(sheet) => sheet,
            Err(err) => {
                return Ok(vec![violation(css_rules::SYNTAX_ERROR, err.line, err.message)]);
            }
        };

        let enabled = |id: &str| self.settings.rule_enabled(id);
        let findings = css_rules::check_stylesheet(&sheet, &enabled);
        Ok(findings
            .into_iter()
            .map(|f| violation(f.rule, f.line, f.message))
            .collect())
    }
}

impl TaskPipeline for CssLintGate {
    fn describe(&self) -> String {
        format!("lint {:?} -> report", self.sources.patterns())
    }

    fn run(&self, ctx: &BuildContext) -> Result<PipelineReport> {
        let files = self.sources.collect(ctx.fs.as_ref(), &ctx.source_root)?;
        let mut report = PipelineReport {
            matched: files.len(),
            ..PipelineReport::default()
        };

        for rel in files {
            let text = ctx.fs.read_to_string(&ctx.source_path(&rel))?;
            for v in self.lint_text(&rel, &text)? {
                warn!(
                    file = %v.path.display(),
                    line = v.line,
                    rule = %v.rule,
                    "{}",
                    v.message
                );
                report.violations.push(v);
            }
        }

        info!(
            files = report.matched,
            violations = report.violations.len(),
            "lint finished"
        );

        if self.settings.fail_on_error {
            if let Some(first) = report.violations.first() {
                let err = AssetflowError::parse(
                    &first.path,
                    format!(
                        "{} violation(s); first: line {} {} ({})",
                        report.violations.len(),
                        first.line,
                        first.message,
                        first.rule
                    ),
                );
                report.failures.push(err);
            }
        }

        Ok(report)
    }
}
