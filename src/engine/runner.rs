// src/engine/runner.rs

use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::dag::{Scheduler, SchedulerStep, TaskAction, TaskRegistry, resolve_plan};
use crate::errors::{AssetflowError, Result};
use crate::lint::LintViolation;
use crate::pipeline::{BuildContext, PipelineReport, TaskPipeline};
use crate::types::{TaskName, TaskOutcome, TriggerReason};

/// What one `run` did.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub root: TaskName,
    /// Resolved plan, prerequisites first.
    pub plan: Vec<TaskName>,
    /// Tasks that completed successfully, in completion order.
    pub succeeded: Vec<TaskName>,
    /// Tasks that failed themselves.
    pub failed: Vec<TaskName>,
    /// Tasks never started because a prerequisite failed.
    pub skipped: Vec<TaskName>,
    /// The plan contained a `watch` task.
    pub watch_requested: bool,
    pub written: Vec<PathBuf>,
    pub violations: Vec<LintViolation>,
    /// First error per failed task, in completion order.
    pub errors: Vec<(TaskName, AssetflowError)>,
}

impl RunSummary {
    fn new(root: &str, plan: Vec<TaskName>) -> Self {
        Self {
            root: root.to_string(),
            plan,
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// The first task error, if any task failed.
    pub fn into_result(mut self) -> Result<RunSummary> {
        if self.errors.is_empty() {
            Ok(self)
        } else {
            let (_, err) = self.errors.remove(0);
            Err(err)
        }
    }
}

enum Dispatch {
    Spawned,
    Done(TaskOutcome),
}

/// Executes a task and its prerequisite tree against one build context.
///
/// The registry is shared with the watch session so both entry points route
/// through the same table.
#[derive(Debug, Clone)]
pub struct Runner {
    registry: Arc<TaskRegistry>,
    ctx: BuildContext,
    jobs: usize,
}

impl Runner {
    pub fn new(registry: Arc<TaskRegistry>, ctx: BuildContext) -> Self {
        Self {
            registry,
            ctx,
            jobs: 1,
        }
    }

    /// Maximum number of pipelines in flight at once (minimum 1).
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn context(&self) -> &BuildContext {
        &self.ctx
    }

    /// Run `name` and its prerequisites, failing with the first task error.
    pub async fn run(&self, name: &str) -> Result<RunSummary> {
        self.execute(name, TriggerReason::Manual).await?.into_result()
    }

    /// Run `name` and its prerequisites, collecting every outcome.
    ///
    /// Only plan-level problems (unknown task, cycle, missing source root)
    /// are returned as `Err`; those are raised before anything is written.
    pub async fn execute(&self, name: &str, reason: TriggerReason) -> Result<RunSummary> {
        let plan = resolve_plan(&self.registry, name)?;
        if !self.ctx.fs.is_dir(&self.ctx.source_root) {
            return Err(AssetflowError::config(format!(
                "source root {} does not exist",
                self.ctx.source_root.display()
            )));
        }

        info!(task = %name, %reason, ?plan, jobs = self.jobs, "starting run");

        let mut scheduler = Scheduler::from_plan(&self.registry, &plan);
        let mut summary = RunSummary::new(name, plan);

        // Keyed by plan index so the lowest ready entry always starts first.
        let mut ready: BTreeMap<usize, TaskName> = BTreeMap::new();
        let mut in_flight: JoinSet<(TaskName, Result<PipelineReport>)> = JoinSet::new();

        absorb(scheduler.start(), &mut ready, &mut summary);

        loop {
            while in_flight.len() < self.jobs {
                let Some((_, task)) = ready.pop_first() else {
                    break;
                };
                match self.dispatch(&task, &mut in_flight, &mut summary) {
                    Dispatch::Spawned => {}
                    Dispatch::Done(outcome) => {
                        record_outcome(&task, outcome, &mut summary);
                        absorb(scheduler.step_completion(&task, outcome), &mut ready, &mut summary);
                    }
                }
            }

            if in_flight.is_empty() {
                if ready.is_empty() {
                    break;
                }
                continue;
            }

            let Some(joined) = in_flight.join_next().await else {
                break;
            };
            let (task, result) = match joined {
                Ok(done) => done,
                Err(join_err) => {
                    error!(error = %join_err, "pipeline worker was cancelled");
                    continue;
                }
            };

            let outcome = self.finish_pipeline(&task, result, &mut summary);
            absorb(scheduler.step_completion(&task, outcome), &mut ready, &mut summary);
        }

        if !scheduler.is_finished() {
            warn!(task = %name, "run ended with unfinished tasks");
        }

        info!(
            task = %name,
            succeeded = summary.succeeded.len(),
            failed = summary.failed.len(),
            skipped = summary.skipped.len(),
            written = summary.written.len(),
            "run finished"
        );
        Ok(summary)
    }

    fn dispatch(
        &self,
        task: &str,
        in_flight: &mut JoinSet<(TaskName, Result<PipelineReport>)>,
        summary: &mut RunSummary,
    ) -> Dispatch {
        let Some(def) = self.registry.get(task) else {
            error!(task = %task, "planned task vanished from registry");
            summary.errors.push((
                task.to_string(),
                AssetflowError::TaskNotFound {
                    name: task.to_string(),
                    available: self.registry.names(),
                },
            ));
            return Dispatch::Done(TaskOutcome::Failed);
        };

        match &def.action {
            TaskAction::Aggregate => {
                debug!(task = %task, "aggregate task complete");
                Dispatch::Done(TaskOutcome::Success)
            }
            TaskAction::Watch => {
                info!(task = %task, "watch session requested");
                summary.watch_requested = true;
                Dispatch::Done(TaskOutcome::Success)
            }
            TaskAction::Pipeline(pipeline) => {
                info!(task = %task, pipeline = %pipeline.describe(), "running task");
                let pipeline: Arc<dyn TaskPipeline> = Arc::clone(pipeline);
                let ctx = self.ctx.clone();
                let name = task.to_string();
                in_flight.spawn_blocking(move || {
                    let result = catch_unwind(AssertUnwindSafe(|| pipeline.run(&ctx)))
                        .unwrap_or_else(|_| {
                            Err(AssetflowError::Other(anyhow::anyhow!("pipeline panicked")))
                        });
                    (name, result)
                });
                Dispatch::Spawned
            }
        }
    }

    fn finish_pipeline(
        &self,
        task: &str,
        result: Result<PipelineReport>,
        summary: &mut RunSummary,
    ) -> TaskOutcome {
        let result = result.and_then(|mut report| {
            summary.written.append(&mut report.written);
            summary.violations.append(&mut report.violations);
            for failure in report.failures.iter().skip(1) {
                warn!(task = %task, error = %failure, "additional file failure");
            }
            report.into_result()
        });

        match result {
            Ok(_) => {
                record_outcome(task, TaskOutcome::Success, summary);
                TaskOutcome::Success
            }
            Err(err) => {
                error!(task = %task, error = %err, "task failed");
                summary.errors.push((task.to_string(), err));
                record_outcome(task, TaskOutcome::Failed, summary);
                TaskOutcome::Failed
            }
        }
    }
}

fn record_outcome(task: &str, outcome: TaskOutcome, summary: &mut RunSummary) {
    match outcome {
        TaskOutcome::Success => summary.succeeded.push(task.to_string()),
        TaskOutcome::Failed => summary.failed.push(task.to_string()),
    }
}

/// Queue newly ready tasks and record skipped dependents.
fn absorb(step: SchedulerStep, ready: &mut BTreeMap<usize, TaskName>, summary: &mut RunSummary) {
    for scheduled in step.newly_scheduled {
        ready.insert(scheduled.index, scheduled.name);
    }
    // The first entry is the failing task itself; it is already recorded.
    for skipped in step.newly_failed.into_iter().skip(1) {
        warn!(task = %skipped, "skipped: a prerequisite failed");
        summary.skipped.push(skipped);
    }
    if step.run_just_finished {
        debug!(task = %summary.root, "all planned tasks terminal");
    }
}
