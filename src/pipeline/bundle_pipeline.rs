// src/pipeline/bundle_pipeline.rs

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::errors::Result;
use crate::pipeline::{
    AssetFile, BuildContext, PipelineReport, Stage, TaskPipeline, apply_stages, write_outputs,
};
use crate::transform::js::bundle::{DEFAULT_TARGET, bundle_module_graph};

/// Pipeline rooted at a single JS entry file.
///
/// The module graph is compiled into one script before the stages run, so the
/// whole graph succeeds or fails together: a single unresolved import means
/// nothing is written.
#[derive(Debug, Clone)]
pub struct BundlePipeline {
    label: String,
    entry: PathBuf,
    output: PathBuf,
    /// Syntax target modules are lowered to.
    target: String,
    stages: Vec<Arc<dyn Stage>>,
}

impl BundlePipeline {
    pub fn new(label: impl Into<String>, entry: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            entry: entry.into(),
            output: output.into(),
            target: DEFAULT_TARGET.to_string(),
            stages: Vec::new(),
        }
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    fn build(&self, ctx: &BuildContext) -> Result<Vec<AssetFile>> {
        let bundle = bundle_module_graph(ctx, &self.entry, &self.target)?;
        info!(
            pipeline = %self.label,
            modules = bundle.modules.len(),
            "module graph compiled"
        );

        let file = AssetFile::new(&self.output, bundle.code.into_bytes());
        apply_stages(&self.stages, file, ctx)
    }
}

impl TaskPipeline for BundlePipeline {
    fn describe(&self) -> String {
        let stages: Vec<&str> = self.stages.iter().map(|s| s.name()).collect();
        let mut chain = vec!["bundle"];
        chain.extend(stages);
        format!(
            "{} {} ({}) => {} -> {}",
            self.label,
            self.entry.display(),
            self.target,
            self.output.display(),
            chain.join(" -> ")
        )
    }

    fn run(&self, ctx: &BuildContext) -> Result<PipelineReport> {
        let mut report = PipelineReport {
            matched: 1,
            ..PipelineReport::default()
        };

        match self.build(ctx) {
            Ok(outputs) => write_outputs(ctx, outputs, &mut report)?,
            Err(err) if err.is_parse() => {
                warn!(pipeline = %self.label, error = %err, "bundle failed; nothing written");
                report.failures.push(err);
            }
            Err(err) => return Err(err),
        }

        info!(
            pipeline = %self.label,
            written = report.written.len(),
            failed = report.failures.len(),
            "pipeline finished"
        );
        Ok(report)
    }
}
