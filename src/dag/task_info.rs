// src/dag/task_info.rs

//! Per-run task state.

use crate::types::TaskName;

/// Per-run state of a task (internal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Waiting on prerequisites.
    Pending,
    /// Handed to the runner.
    Running,
    DoneSuccess,
    /// Failed itself, or skipped because a prerequisite failed.
    DoneFailed,
}

/// Public, read-only view of a task's state in the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRunState {
    Pending,
    Running,
    DoneSuccess,
    DoneFailed,
}

impl From<RunState> for TaskRunState {
    fn from(state: RunState) -> Self {
        match state {
            RunState::Pending => TaskRunState::Pending,
            RunState::Running => TaskRunState::Running,
            RunState::DoneSuccess => TaskRunState::DoneSuccess,
            RunState::DoneFailed => TaskRunState::DoneFailed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub name: TaskName,
    /// Position in the resolved plan.
    pub index: usize,
    pub deps: Vec<TaskName>,
    pub run_state: RunState,
}

/// A task whose prerequisites have all succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTask {
    pub name: TaskName,
    /// Position in the resolved plan; the runner starts lower indices first.
    pub index: usize,
}

impl ScheduledTask {
    pub fn from_task_info(info: &TaskInfo) -> Self {
        Self {
            name: info.name.clone(),
            index: info.index,
        }
    }
}
