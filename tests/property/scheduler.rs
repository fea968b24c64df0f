use std::collections::{HashMap, HashSet};

use proptest::prelude::*;

use assetflow::dag::{Scheduler, TaskRegistry, resolve_plan};
use assetflow::types::TaskOutcome;

use crate::common::{RecordingPipeline, RegistryBuilder, RunLog};

// Acyclic by construction: task N may only depend on tasks 0..N-1.
fn dag_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..num_tasks),
            num_tasks,
        )
        .prop_map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(|(i, potential)| {
                    let mut deps: Vec<usize> = Vec::new();
                    if i > 0 {
                        for d in potential {
                            let d = d % i;
                            if !deps.contains(&d) {
                                deps.push(d);
                            }
                        }
                    }
                    deps
                })
                .collect()
        })
    })
}

fn registry_for(deps: &[Vec<usize>]) -> TaskRegistry {
    let log = RunLog::new();
    let mut builder = RegistryBuilder::new();
    for (i, task_deps) in deps.iter().enumerate() {
        let name = format!("task_{i}");
        let prereqs: Vec<String> = task_deps.iter().map(|d| format!("task_{d}")).collect();
        let prereqs: Vec<&str> = prereqs.iter().map(String::as_str).collect();
        builder = builder.pipeline(&name, RecordingPipeline::new(&name, &log), &prereqs);
    }
    builder.build()
}

proptest! {
    #[test]
    fn plan_covers_transitive_closure_in_dependency_order(deps in dag_strategy(12)) {
        let registry = registry_for(&deps);
        let root = format!("task_{}", deps.len() - 1);
        let plan = resolve_plan(&registry, &root).unwrap();

        let position: HashMap<&str, usize> =
            plan.iter().enumerate().map(|(i, n)| (n.as_str(), i)).collect();
        prop_assert_eq!(position.len(), plan.len(), "each task appears once");
        prop_assert_eq!(plan.last().map(String::as_str), Some(root.as_str()));

        for name in &plan {
            let task = registry.get(name).unwrap();
            for prereq in &task.prerequisites {
                let p = position.get(prereq.as_str());
                prop_assert!(p.is_some(), "{} missing from plan", prereq);
                prop_assert!(p.unwrap() < &position[name.as_str()]);
            }
        }
    }

    #[test]
    fn run_terminates_and_never_runs_dependents_of_failures(
        deps in dag_strategy(10),
        failing in proptest::collection::hash_set(0..10usize, 0..4),
    ) {
        let registry = registry_for(&deps);
        let root = format!("task_{}", deps.len() - 1);
        let plan = resolve_plan(&registry, &root).unwrap();
        let failing: HashSet<String> = failing.into_iter().map(|i| format!("task_{i}")).collect();

        let mut scheduler = Scheduler::from_plan(&registry, &plan);
        let mut executing: Vec<String> =
            scheduler.start().newly_scheduled.into_iter().map(|t| t.name).collect();
        let mut succeeded: HashSet<String> = HashSet::new();
        let mut failed: HashSet<String> = HashSet::new();

        let mut steps = 0;
        while let Some(task) = executing.pop() {
            steps += 1;
            prop_assert!(steps <= plan.len(), "a task was scheduled twice");

            for prereq in &registry.get(&task).unwrap().prerequisites {
                prop_assert!(succeeded.contains(prereq), "{} ran before {}", task, prereq);
            }

            let outcome = if failing.contains(&task) {
                TaskOutcome::Failed
            } else {
                TaskOutcome::Success
            };
            let step = scheduler.step_completion(&task, outcome);
            match outcome {
                TaskOutcome::Success => { succeeded.insert(task); }
                TaskOutcome::Failed => { failed.extend(step.newly_failed.iter().cloned()); }
            }
            executing.extend(step.newly_scheduled.into_iter().map(|t| t.name));
        }

        prop_assert!(scheduler.is_finished());
        prop_assert_eq!(succeeded.len() + failed.len(), plan.len());
        prop_assert!(succeeded.is_disjoint(&failed));
    }
}
