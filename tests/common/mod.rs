#![allow(dead_code)]

use std::error::Error;
use std::sync::Arc;

use assetflow::config::BuildConfig;
use assetflow::dag::TaskRegistry;
use assetflow::engine::Runner;
use assetflow::fs::RealFileSystem;
use assetflow::fs::mock::MockFileSystem;
use assetflow::pipeline::BuildContext;
use assetflow::tasks::standard_registry;

pub use assetflow_test_utils::{
    RecordingPipeline, RegistryBuilder, RunLog, SourceTree, init_tracing, with_timeout,
};

pub type TestResult = Result<(), Box<dyn Error>>;

/// Context over a mock filesystem rooted at `source` / `docs`.
pub fn mock_context(fs: &MockFileSystem) -> BuildContext {
    BuildContext::new(Arc::new(fs.clone()), "source", "docs")
}

/// Mock filesystem with an (empty) source root.
pub fn mock_fs() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_dir("source");
    fs
}

pub fn mock_runner(registry: TaskRegistry, fs: &MockFileSystem) -> Runner {
    Runner::new(Arc::new(registry), mock_context(fs))
}

/// Runner with the standard task set over a real temp tree.
pub fn standard_runner(tree: &SourceTree) -> Result<Runner, Box<dyn Error>> {
    let cfg = BuildConfig::default();
    let registry = standard_registry(&cfg)?;
    let ctx = BuildContext::new(Arc::new(RealFileSystem), tree.source(), tree.dest());
    Ok(Runner::new(Arc::new(registry), ctx))
}
