// tests/integration/standard_tasks.rs

use assetflow::config::BuildConfig;
use assetflow::dag::{TaskAction, resolve_plan};
use assetflow::tasks::{BUILD_STEPS, standard_registry};

fn names(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

#[test]
fn standard_registry_defines_every_task() {
    let registry = standard_registry(&BuildConfig::default()).unwrap();

    assert_eq!(
        registry.names(),
        names(&[
            "build", "copy", "css", "default", "html", "images", "js", "json", "lint",
            "lint:css", "svg", "watch",
        ])
    );
    assert!(matches!(registry.get("watch").map(|t| &t.action), Some(TaskAction::Watch)));
    assert!(matches!(registry.get("build").map(|t| &t.action), Some(TaskAction::Aggregate)));
    assert_eq!(registry.get("build").unwrap().prerequisites, names(BUILD_STEPS));
}

#[test]
fn build_plan_runs_lint_first_and_each_step_once() {
    let registry = standard_registry(&BuildConfig::default()).unwrap();

    assert_eq!(
        resolve_plan(&registry, "build").unwrap(),
        names(&[
            "lint:css", "lint", "css", "html", "js", "json", "images", "svg", "copy", "build",
        ])
    );
}

#[test]
fn default_plan_builds_then_watches() {
    let registry = standard_registry(&BuildConfig::default()).unwrap();
    let plan = resolve_plan(&registry, "default").unwrap();

    assert_eq!(plan.len(), 12);
    assert_eq!(&plan[9..], &names(&["build", "watch", "default"])[..]);
}

#[test]
fn disabling_source_maps_removes_the_map_stages() {
    let mut cfg = BuildConfig::default();
    cfg.css.source_map = false;
    let registry = standard_registry(&cfg).unwrap();

    let Some(TaskAction::Pipeline(css)) = registry.get("css").map(|t| &t.action) else {
        panic!("css should be a pipeline task");
    };
    let description = css.describe();
    assert!(!description.contains("sourcemap"), "{description}");
    assert!(description.contains("css-compile"), "{description}");
}
