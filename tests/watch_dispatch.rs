// tests/watch_dispatch.rs

mod common;
use crate::common::{
    RecordingPipeline, RegistryBuilder, RunLog, TestResult, init_tracing, mock_fs, mock_runner,
    with_timeout,
};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use assetflow::config::BuildConfig;
use assetflow::errors::AssetflowError;
use assetflow::tasks::{standard_dispatcher, standard_registry};
use assetflow::watch::{Dispatcher, WatchSession};
use tokio::sync::mpsc;

fn names(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

fn dispatcher(rules: &[(&str, &str)]) -> Arc<Dispatcher> {
    let mut d = Dispatcher::new();
    for (pattern, task) in rules {
        d.watch(*pattern, *task).unwrap();
    }
    Arc::new(d)
}

#[test]
fn standard_table_routes_changes_to_tasks() -> TestResult {
    let d = standard_dispatcher()?;

    assert_eq!(d.matching_tasks("assets/css/site/a.css"), vec!["lint:css", "css"]);
    assert_eq!(d.matching_tasks("index.html"), vec!["html"]);
    assert_eq!(d.matching_tasks("blog/post.html"), vec!["html"]);
    assert_eq!(d.matching_tasks("assets/js/app.js"), vec!["js"]);
    assert_eq!(d.matching_tasks("data/site.json"), vec!["json"]);
    assert_eq!(d.matching_tasks("assets/img/logo.svg"), vec!["svg"]);
    assert_eq!(d.matching_tasks("assets/img/photo.jpeg"), vec!["images"]);
    assert_eq!(d.matching_tasks("robots.txt"), vec!["copy"]);
    assert!(d.matching_tasks("README.md").is_empty());
    assert!(d.matching_tasks("vendor/lib.css").is_empty());
    assert!(!d.is_watched("README.md"));

    d.validate(&standard_registry(&BuildConfig::default())?)?;
    Ok(())
}

#[test]
fn each_rule_and_path_pair_fires_once_per_batch() {
    let d = dispatcher(&[("**/*.css", "lint:css"), ("**/*.css", "css"), ("**/*.txt", "copy")]);

    let triggers = d.triggers_for(["a.css", "b.txt", "a.css", "c.md", "b.txt"]);
    let fired: Vec<(usize, &str, &str)> = triggers
        .iter()
        .map(|t| (t.rule, t.task.as_str(), t.path.as_str()))
        .collect();

    assert_eq!(
        fired,
        vec![
            (0, "lint:css", "a.css"),
            (1, "css", "a.css"),
            (2, "copy", "b.txt"),
        ]
    );
}

#[test]
fn rule_for_unknown_task_fails_validation() {
    let registry = RegistryBuilder::new().aggregate("build", &[]).build();
    let d = dispatcher(&[("**/*.css", "css")]);

    match d.validate(&registry) {
        Err(AssetflowError::Config(msg)) => assert!(msg.contains("'css'"), "{msg}"),
        other => panic!("expected Config error, got {other:?}"),
    }
}

#[test]
fn invalid_pattern_is_rejected_on_registration() {
    let mut d = Dispatcher::new();
    assert!(d.watch("assets/[css", "css").is_err());
    assert!(d.is_empty());
}

#[tokio::test]
async fn failing_task_does_not_stop_other_triggers() -> TestResult {
    init_tracing();
    let log = RunLog::new();
    let registry = RegistryBuilder::new()
        .pipeline("bad", RecordingPipeline::new("bad", &log).failing(), &[])
        .pipeline("good", RecordingPipeline::new("good", &log), &[])
        .build();
    let fs = mock_fs();
    let session = WatchSession::new(
        mock_runner(registry, &fs),
        dispatcher(&[("**/*.css", "bad"), ("**/*.css", "good"), ("**/*.txt", "missing")]),
        Duration::ZERO,
    );

    let records = with_timeout(session.dispatch_paths(&names(&["a.css", "notes.txt"]))).await;

    let outcome: Vec<(&str, bool)> = records
        .iter()
        .map(|r| (r.trigger.task.as_str(), r.succeeded))
        .collect();
    assert_eq!(outcome, vec![("bad", false), ("good", true), ("missing", false)]);
    assert_eq!(log.entries(), names(&["bad", "good"]));

    // The next change runs the failed task again.
    with_timeout(session.dispatch_paths(&names(&["a.css"]))).await;
    assert_eq!(log.count("bad"), 2);
    Ok(())
}

#[tokio::test]
async fn debounced_batch_dispatches_each_change_once() -> TestResult {
    init_tracing();
    let log = RunLog::new();
    let registry = RegistryBuilder::new()
        .pipeline("json", RecordingPipeline::new("json", &log), &[])
        .pipeline("copy", RecordingPipeline::new("copy", &log), &[])
        .build();
    let fs = mock_fs();
    let session = WatchSession::new(
        mock_runner(registry, &fs),
        dispatcher(&[("**/*.json", "json"), ("**/*.txt", "copy")]),
        Duration::from_millis(10),
    );

    let (tx, rx) = mpsc::unbounded_channel();
    for path in [
        "source/data/a.json",
        "source/data/a.json",
        "source/notes.txt",
        "docs/data/a.json",
        "elsewhere/b.json",
    ] {
        tx.send(PathBuf::from(path))?;
    }
    drop(tx);

    with_timeout(session.process_events(rx, std::future::pending())).await;

    assert_eq!(log.entries(), names(&["json", "copy"]));
    Ok(())
}

#[tokio::test]
async fn shutdown_ends_the_session_without_events() -> TestResult {
    let log = RunLog::new();
    let registry = RegistryBuilder::new()
        .pipeline("json", RecordingPipeline::new("json", &log), &[])
        .build();
    let fs = mock_fs();
    let session = WatchSession::new(
        mock_runner(registry, &fs),
        dispatcher(&[("**/*.json", "json")]),
        Duration::from_millis(10),
    );

    let (_tx, rx) = mpsc::unbounded_channel::<PathBuf>();
    with_timeout(session.process_events(rx, async {})).await;

    assert!(log.entries().is_empty());
    Ok(())
}
