// src/dag/scheduler.rs

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::dag::graph::DagGraph;
use crate::dag::registry::TaskRegistry;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::StateManager;
use crate::dag::task_info::{RunState, TaskInfo, TaskRunState};
use crate::types::{TaskName, TaskOutcome};

/// State machine for a single run of a resolved plan.
///
/// It is responsible for:
/// - deciding when a task is ready (all prerequisites succeeded)
/// - recording each task's outcome
/// - failing dependents when a task fails
#[derive(Debug)]
pub struct Scheduler {
    graph: DagGraph,
    tasks: HashMap<TaskName, TaskInfo>,
    finished: bool,
}

impl Scheduler {
    /// Build a scheduler with every plan entry `Pending`.
    pub fn from_plan(registry: &TaskRegistry, plan: &[TaskName]) -> Self {
        let graph = DagGraph::from_plan(registry, plan);

        let tasks = plan
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let info = TaskInfo {
                    name: name.clone(),
                    index,
                    deps: graph.dependencies_of(name).to_vec(),
                    run_state: RunState::Pending,
                };
                (name.clone(), info)
            })
            .collect();

        Self {
            graph,
            tasks,
            finished: plan.is_empty(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Read-only view of the given task's run state.
    pub fn run_state_of(&self, task: &str) -> Option<TaskRunState> {
        self.tasks.get(task).map(|info| info.run_state.into())
    }

    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.graph.tasks()
    }

    /// Schedule the tasks that have no prerequisites.
    pub fn start(&mut self) -> SchedulerStep {
        let mut manager = StateManager::new(&self.graph, &mut self.tasks);
        let newly_scheduled = manager.collect_new_ready_tasks();
        debug!(ready = newly_scheduled.len(), "scheduler: run started");
        SchedulerStep {
            newly_scheduled,
            newly_failed: Vec::new(),
            run_just_finished: self.maybe_finish_run(),
        }
    }

    /// Record the outcome of a running task.
    pub fn step_completion(&mut self, task: &str, outcome: TaskOutcome) -> SchedulerStep {
        let mut step = SchedulerStep::default();

        let Some(info) = self.tasks.get_mut(task) else {
            warn!(task = %task, "completion for unknown task; ignoring");
            return step;
        };
        if info.run_state != RunState::Running {
            warn!(task = %task, state = ?info.run_state, "completion for task that is not running; ignoring");
            return step;
        }

        match outcome {
            TaskOutcome::Success => {
                info.run_state = RunState::DoneSuccess;
                debug!(task = %task, "task completed successfully");
                let mut manager = StateManager::new(&self.graph, &mut self.tasks);
                step.newly_scheduled = manager.collect_new_ready_tasks();
            }
            TaskOutcome::Failed => {
                info.run_state = RunState::DoneFailed;
                debug!(task = %task, "task failed; failing dependents in this run");
                step.newly_failed.push(task.to_string());
                let mut manager = StateManager::new(&self.graph, &mut self.tasks);
                step.newly_failed.extend(manager.mark_dependents_failed(task));
                // Siblings unaffected by the failure may still become ready.
                step.newly_scheduled = manager.collect_new_ready_tasks();
            }
        }

        step.run_just_finished = self.maybe_finish_run();
        step
    }

    fn maybe_finish_run(&mut self) -> bool {
        if self.finished {
            return false;
        }
        let manager = StateManager::new(&self.graph, &mut self.tasks);
        if manager.all_tasks_terminal() {
            debug!("scheduler: all tasks terminal; run finished");
            self.finished = true;
            true
        } else {
            false
        }
    }
}
