// tests/scheduler.rs

mod common;
use crate::common::{RecordingPipeline, RegistryBuilder, RunLog};

use assetflow::dag::{Scheduler, TaskRegistry, TaskRunState, resolve_plan};
use assetflow::types::TaskOutcome;

fn chain_registry() -> TaskRegistry {
    // lint:css -> lint -> build <- css
    let log = RunLog::new();
    RegistryBuilder::new()
        .pipeline("lint:css", RecordingPipeline::new("lint:css", &log), &[])
        .aggregate("lint", &["lint:css"])
        .pipeline("css", RecordingPipeline::new("css", &log), &[])
        .aggregate("build", &["lint", "css"])
        .build()
}

fn scheduled_names(step: &assetflow::dag::SchedulerStep) -> Vec<&str> {
    step.newly_scheduled.iter().map(|t| t.name.as_str()).collect()
}

#[test]
fn plan_is_depth_first_post_order() {
    let registry = chain_registry();
    let plan = resolve_plan(&registry, "build").unwrap();
    assert_eq!(plan, vec!["lint:css", "lint", "css", "build"]);
}

#[test]
fn plan_for_leaf_task_is_just_the_task() {
    let registry = chain_registry();
    assert_eq!(resolve_plan(&registry, "css").unwrap(), vec!["css"]);
}

#[test]
fn start_schedules_tasks_without_prerequisites_in_plan_order() {
    let registry = chain_registry();
    let plan = resolve_plan(&registry, "build").unwrap();
    let mut scheduler = Scheduler::from_plan(&registry, &plan);

    let step = scheduler.start();
    assert_eq!(scheduled_names(&step), vec!["lint:css", "css"]);
    assert_eq!(step.newly_scheduled[0].index, 0);
    assert_eq!(step.newly_scheduled[1].index, 2);
    assert!(!step.run_just_finished);

    assert_eq!(scheduler.run_state_of("lint:css"), Some(TaskRunState::Running));
    assert_eq!(scheduler.run_state_of("build"), Some(TaskRunState::Pending));
    assert_eq!(scheduler.run_state_of("unknown"), None);
}

#[test]
fn completion_unlocks_dependents_once_all_prerequisites_succeed() {
    let registry = chain_registry();
    let plan = resolve_plan(&registry, "build").unwrap();
    let mut scheduler = Scheduler::from_plan(&registry, &plan);
    scheduler.start();

    let step = scheduler.step_completion("lint:css", TaskOutcome::Success);
    assert_eq!(scheduled_names(&step), vec!["lint"]);

    let step = scheduler.step_completion("lint", TaskOutcome::Success);
    assert!(step.newly_scheduled.is_empty(), "css still running");

    let step = scheduler.step_completion("css", TaskOutcome::Success);
    assert_eq!(scheduled_names(&step), vec!["build"]);
    assert!(!step.run_just_finished);

    let step = scheduler.step_completion("build", TaskOutcome::Success);
    assert!(step.run_just_finished);
    assert!(scheduler.is_finished());
}

#[test]
fn failure_marks_transitive_dependents_failed() {
    let registry = chain_registry();
    let plan = resolve_plan(&registry, "build").unwrap();
    let mut scheduler = Scheduler::from_plan(&registry, &plan);
    scheduler.start();

    let step = scheduler.step_completion("lint:css", TaskOutcome::Failed);
    assert_eq!(step.newly_failed, vec!["lint:css", "lint", "build"]);
    assert!(!step.run_just_finished, "css is still running");
    assert_eq!(scheduler.run_state_of("build"), Some(TaskRunState::DoneFailed));

    let step = scheduler.step_completion("css", TaskOutcome::Success);
    assert!(step.newly_scheduled.is_empty());
    assert!(step.run_just_finished);
}

#[test]
fn completion_for_task_not_running_is_ignored() {
    let registry = chain_registry();
    let plan = resolve_plan(&registry, "build").unwrap();
    let mut scheduler = Scheduler::from_plan(&registry, &plan);
    scheduler.start();

    let step = scheduler.step_completion("build", TaskOutcome::Success);
    assert!(step.newly_scheduled.is_empty());
    assert_eq!(scheduler.run_state_of("build"), Some(TaskRunState::Pending));
}
