// src/dag/scheduler_step.rs

use crate::dag::task_info::ScheduledTask;
use crate::types::TaskName;

/// Structured result of a single scheduler step.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// Tasks that became ready as a result of this step, in plan order.
    pub newly_scheduled: Vec<ScheduledTask>,
    /// The task that failed in this step (if any) followed by every
    /// dependent that will now be skipped.
    pub newly_failed: Vec<TaskName>,
    /// Whether every task in the run is now terminal.
    pub run_just_finished: bool,
}
