// src/pipeline/file_pipeline.rs

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::pipeline::{
    AssetFile, BuildContext, PipelineReport, SourceSet, Stage, TaskPipeline, apply_stages,
    write_outputs,
};

/// Glob-driven pipeline where every matched file is an independent unit.
///
/// A parse error in one file drops that file's output and is recorded in the
/// report; the rest of the batch still completes. IO errors abort the run.
#[derive(Debug, Clone)]
pub struct FilePipeline {
    label: String,
    sources: SourceSet,
    stages: Vec<Arc<dyn Stage>>,
}

impl FilePipeline {
    pub fn new(label: impl Into<String>, sources: SourceSet) -> Self {
        Self {
            label: label.into(),
            sources,
            stages: Vec::new(),
        }
    }

    /// Append a stage; order of calls is the order of application.
    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    pub fn sources(&self) -> &SourceSet {
        &self.sources
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    fn process_file(&self, ctx: &BuildContext, rel: &std::path::Path) -> Result<Vec<AssetFile>> {
        let contents = ctx.fs.read(&ctx.source_path(rel))?;
        let file = AssetFile::new(rel, contents);
        apply_stages(&self.stages, file, ctx)
    }
}

impl TaskPipeline for FilePipeline {
    fn describe(&self) -> String {
        let stages = self.stage_names();
        if stages.is_empty() {
            format!("{} {:?} -> copy", self.label, self.sources.patterns())
        } else {
            format!(
                "{} {:?} -> {}",
                self.label,
                self.sources.patterns(),
                stages.join(" -> ")
            )
        }
    }

    fn run(&self, ctx: &BuildContext) -> Result<PipelineReport> {
        let files = self.sources.collect(ctx.fs.as_ref(), &ctx.source_root)?;
        let mut report = PipelineReport {
            matched: files.len(),
            ..PipelineReport::default()
        };

        for rel in files {
            match self.process_file(ctx, &rel) {
                Ok(outputs) => {
                    debug!(
                        pipeline = %self.label,
                        file = %rel.display(),
                        outputs = outputs.len(),
                        "file transformed"
                    );
                    write_outputs(ctx, outputs, &mut report)?;
                }
                Err(err) if err.is_parse() => {
                    warn!(
                        pipeline = %self.label,
                        file = %rel.display(),
                        error = %err,
                        "skipping file after parse error"
                    );
                    report.failures.push(err);
                }
                Err(err) => return Err(err),
            }
        }

        info!(
            pipeline = %self.label,
            matched = report.matched,
            written = report.written.len(),
            failed = report.failures.len(),
            "pipeline finished"
        );
        Ok(report)
    }
}
