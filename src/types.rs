// src/types.rs

/// Canonical task name type used throughout the registry, runner and watcher.
pub type TaskName = String;

/// Outcome of a single task inside a run, as reported to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed,
}

/// Why a run was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Requested on the command line (or programmatically).
    Manual,
    /// Dispatched by the watch session after a filesystem event.
    FileWatch,
}

impl std::fmt::Display for TriggerReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerReason::Manual => f.write_str("manual"),
            TriggerReason::FileWatch => f.write_str("file-watch"),
        }
    }
}
