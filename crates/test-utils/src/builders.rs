#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use assetflow::dag::{TaskAction, TaskRegistry};
use assetflow::pipeline::TaskPipeline;
use tempfile::TempDir;

/// Builder for `TaskRegistry` to simplify test setup.
#[derive(Default)]
pub struct RegistryBuilder {
    registry: TaskRegistry,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pipeline(mut self, name: &str, pipeline: impl TaskPipeline + 'static, prereqs: &[&str]) -> Self {
        self.registry.define(
            name,
            TaskAction::Pipeline(Arc::new(pipeline)),
            prereqs.iter().copied(),
        );
        self
    }

    pub fn aggregate(mut self, name: &str, prereqs: &[&str]) -> Self {
        self.registry
            .define(name, TaskAction::Aggregate, prereqs.iter().copied());
        self
    }

    pub fn watch(mut self, name: &str) -> Self {
        let none: [&str; 0] = [];
        self.registry.define(name, TaskAction::Watch, none);
        self
    }

    pub fn build(self) -> TaskRegistry {
        self.registry
    }
}

/// Real on-disk `source/` + `docs/` trees inside a temp directory.
pub struct SourceTree {
    dir: TempDir,
}

impl SourceTree {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        fs::create_dir_all(dir.path().join("source")).expect("create source dir");
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn source(&self) -> PathBuf {
        self.dir.path().join("source")
    }

    pub fn dest(&self) -> PathBuf {
        self.dir.path().join("docs")
    }

    /// Write a file beneath `source/`, creating parent directories.
    pub fn file(&self, rel: &str, contents: impl AsRef<[u8]>) -> &Self {
        let path = self.source().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(&path, contents).expect("write source file");
        self
    }

    pub fn read_dest(&self, rel: &str) -> Option<Vec<u8>> {
        fs::read(self.dest().join(rel)).ok()
    }

    pub fn read_dest_string(&self, rel: &str) -> Option<String> {
        fs::read_to_string(self.dest().join(rel)).ok()
    }

    /// Every file under `docs/`, relative and with forward slashes, sorted.
    pub fn dest_files(&self) -> Vec<String> {
        let mut out = Vec::new();
        let dest = self.dest();
        let mut stack = vec![dest.clone()];
        while let Some(dir) = stack.pop() {
            let Ok(entries) = fs::read_dir(&dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                } else if let Ok(rel) = path.strip_prefix(&dest) {
                    out.push(rel.to_string_lossy().replace('\\', "/"));
                }
            }
        }
        out.sort();
        out
    }
}

impl Default for SourceTree {
    fn default() -> Self {
        Self::new()
    }
}
