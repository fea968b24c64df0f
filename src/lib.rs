// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod lint;
pub mod logging;
pub mod pipeline;
pub mod tasks;
pub mod transform;
pub mod types;
pub mod watch;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{error, info};

use crate::cli::CliArgs;
use crate::config::{BuildConfig, RawBuildConfig, default_config_path, load_or_default};
use crate::dag::{TaskAction, TaskRegistry, resolve_plan};
use crate::engine::Runner;
use crate::fs::RealFileSystem;
use crate::pipeline::BuildContext;
use crate::types::TriggerReason;
use crate::watch::WatchSession;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - the standard task registry and watch table
/// - the runner for each requested task
/// - the watch session (when a plan contains `watch`) with Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = resolve_config(&args)?;
    let registry = Arc::new(tasks::standard_registry(&cfg)?);

    if args.list {
        print_task_list(&registry);
        return Ok(());
    }

    if args.dry_run {
        print_dry_run(&cfg, &registry, &args.tasks)?;
        return Ok(());
    }

    let ctx = BuildContext::new(
        Arc::new(RealFileSystem),
        cfg.source_root().clone(),
        cfg.dest_root().clone(),
    );
    let runner = Runner::new(Arc::clone(&registry), ctx).with_jobs(cfg.build.jobs);

    let mut watch_requested = false;
    for task in &args.tasks {
        let summary = runner.execute(task, TriggerReason::Manual).await?;
        watch_requested |= summary.watch_requested;

        if let Err(err) = summary.into_result() {
            if !watch_requested {
                return Err(err.into());
            }
            error!(task = %task, error = %err, "build failed; starting watch session anyway");
        }
    }

    if watch_requested {
        let dispatcher = Arc::new(tasks::standard_dispatcher()?);
        let session = WatchSession::new(
            runner,
            dispatcher,
            Duration::from_millis(cfg.watch.debounce_ms),
        );
        session.run_until(shutdown_signal()).await?;
    }

    Ok(())
}

/// Load the config file and apply `--source` / `--dest` / `--jobs`.
///
/// Overrides are re-validated together with the file values.
pub fn resolve_config(args: &CliArgs) -> Result<BuildConfig> {
    let (path, explicit) = match &args.config {
        Some(path) => (path.clone(), true),
        None => (default_config_path(), false),
    };
    let cfg = load_or_default(&path, explicit)?;

    if args.source.is_none() && args.dest.is_none() && args.jobs.is_none() {
        return Ok(cfg);
    }

    let mut raw = RawBuildConfig::from(cfg);
    if let Some(source) = &args.source {
        raw.paths.source = source.clone();
    }
    if let Some(dest) = &args.dest {
        raw.paths.dest = dest.clone();
    }
    if let Some(jobs) = args.jobs {
        raw.build.jobs = jobs;
    }
    Ok(BuildConfig::try_from(raw)?)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for Ctrl+C; watching until killed");
        std::future::pending::<()>().await;
    }
    info!("Ctrl+C received");
}

fn print_task_list(registry: &TaskRegistry) {
    println!("available tasks:");
    for task in registry.tasks() {
        if task.prerequisites.is_empty() {
            println!("  {}", task.name);
        } else {
            println!("  {} ({})", task.name, task.prerequisites.join(", "));
        }
    }
}

/// Print each requested task's plan and what every step would do.
fn print_dry_run(cfg: &BuildConfig, registry: &TaskRegistry, requested: &[String]) -> Result<()> {
    println!("assetflow dry-run");
    println!("  source = {}", cfg.source_root().display());
    println!("  dest   = {}", cfg.dest_root().display());
    println!("  jobs   = {}", cfg.build.jobs);

    for root in requested {
        let plan = resolve_plan(registry, root)?;
        println!();
        println!("plan for '{root}' ({} steps):", plan.len());
        for (i, name) in plan.iter().enumerate() {
            let Some(task) = registry.get(name) else {
                continue;
            };
            match &task.action {
                TaskAction::Aggregate => println!("  {:>2}. {name} [aggregate]", i + 1),
                TaskAction::Watch => println!("  {:>2}. {name} [start watch session]", i + 1),
                TaskAction::Pipeline(p) => println!("  {:>2}. {name}: {}", i + 1, p.describe()),
            }
        }
    }
    Ok(())
}
