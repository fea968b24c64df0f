use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assetflow::errors::{AssetflowError, Result};
use assetflow::pipeline::{BuildContext, PipelineReport, TaskPipeline};

/// Shared, ordered log of pipeline invocations.
#[derive(Debug, Clone, Default)]
pub struct RunLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries.lock().unwrap().iter().filter(|e| *e == entry).count()
    }

    /// Index of the first matching entry.
    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries.lock().unwrap().iter().position(|e| e == entry)
    }
}

/// A pipeline that records its invocations instead of transforming files.
///
/// - Pushes `<name>` to the log when it runs (or `start:<name>` / `end:<name>`
///   when a delay is configured).
/// - Optionally writes one file beneath the destination root.
/// - Optionally fails with a parse error.
#[derive(Debug, Clone)]
pub struct RecordingPipeline {
    name: String,
    log: RunLog,
    fail: bool,
    delay: Option<Duration>,
    output: Option<(PathBuf, Vec<u8>)>,
}

impl RecordingPipeline {
    pub fn new(name: impl Into<String>, log: &RunLog) -> Self {
        Self {
            name: name.into(),
            log: log.clone(),
            fail: false,
            delay: None,
            output: None,
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn writes(mut self, rel: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        self.output = Some((rel.into(), contents.into()));
        self
    }
}

impl TaskPipeline for RecordingPipeline {
    fn describe(&self) -> String {
        format!("record {}", self.name)
    }

    fn run(&self, ctx: &BuildContext) -> Result<PipelineReport> {
        match self.delay {
            Some(delay) => {
                self.log.push(format!("start:{}", self.name));
                std::thread::sleep(delay);
                self.log.push(format!("end:{}", self.name));
            }
            None => self.log.push(self.name.clone()),
        }

        if self.fail {
            return Err(AssetflowError::parse(
                PathBuf::from(&self.name),
                "recorded failure",
            ));
        }

        let mut report = PipelineReport::default();
        if let Some((rel, contents)) = &self.output {
            let dest = ctx.dest_path(rel);
            ctx.fs.write(&dest, contents)?;
            report.written.push(dest);
        }
        Ok(report)
    }
}
