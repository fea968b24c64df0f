// src/dag/state_manager.rs

//! Per-run state transitions.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::dag::DagGraph;
use crate::dag::task_info::{RunState, ScheduledTask, TaskInfo};
use crate::types::TaskName;

pub struct StateManager<'a> {
    graph: &'a DagGraph,
    tasks: &'a mut HashMap<TaskName, TaskInfo>,
}

impl<'a> StateManager<'a> {
    pub fn new(graph: &'a DagGraph, tasks: &'a mut HashMap<TaskName, TaskInfo>) -> Self {
        Self { graph, tasks }
    }

    /// All prerequisites of `info` have succeeded in this run.
    pub fn deps_satisfied_for_info(&self, info: &TaskInfo) -> bool {
        info.deps.iter().all(|dep_name| match self.tasks.get(dep_name) {
            Some(dep) => dep.run_state == RunState::DoneSuccess,
            None => {
                warn!(task = %info.name, dep = %dep_name, "prerequisite missing from run");
                false
            }
        })
    }

    /// Mark every pending dependent (transitively) of a failed task as
    /// `DoneFailed`.
    ///
    /// Returns the newly failed tasks in plan order, excluding `failed_task`.
    pub fn mark_dependents_failed(&mut self, failed_task: &str) -> Vec<TaskName> {
        let mut stack: Vec<TaskName> = self.graph.dependents_of(failed_task).to_vec();
        let mut newly_failed = Vec::new();

        while let Some(name) = stack.pop() {
            if let Some(info) = self.tasks.get_mut(&name) {
                if matches!(info.run_state, RunState::Pending | RunState::Running) {
                    info.run_state = RunState::DoneFailed;
                    debug!(task = %info.name, "skipping task due to failed prerequisite");
                    newly_failed.push((info.index, info.name.clone()));
                    stack.extend(self.graph.dependents_of(&name).iter().cloned());
                }
            }
        }

        newly_failed.sort();
        newly_failed.into_iter().map(|(_, name)| name).collect()
    }

    /// Collect pending tasks whose prerequisites are satisfied, mark them
    /// `Running`, and return them in plan order.
    pub fn collect_new_ready_tasks(&mut self) -> Vec<ScheduledTask> {
        let mut candidates: Vec<(usize, TaskName)> = self
            .tasks
            .values()
            .filter(|info| info.run_state == RunState::Pending && self.deps_satisfied_for_info(info))
            .map(|info| (info.index, info.name.clone()))
            .collect();
        candidates.sort();

        let mut ready = Vec::with_capacity(candidates.len());
        for (_, name) in candidates {
            if let Some(info) = self.tasks.get_mut(&name) {
                debug!(task = %info.name, "prerequisites satisfied; marking Running");
                info.run_state = RunState::Running;
                ready.push(ScheduledTask::from_task_info(info));
            }
        }
        ready
    }

    pub fn all_tasks_terminal(&self) -> bool {
        !self
            .tasks
            .values()
            .any(|info| matches!(info.run_state, RunState::Pending | RunState::Running))
    }
}
