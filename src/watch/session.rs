// src/watch/session.rs

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::engine::Runner;
use crate::errors::Result;
use crate::types::TriggerReason;
use crate::watch::path_utils::relative_str;
use crate::watch::rules::{Dispatcher, Trigger};
use crate::watch::watcher::spawn_watcher;

/// Result of dispatching one trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRecord {
    pub trigger: Trigger,
    pub succeeded: bool,
}

/// Long-lived loop turning file changes into runner invocations.
///
/// Task errors are logged and never end the session; only the shutdown
/// future or the change source closing does.
#[derive(Debug, Clone)]
pub struct WatchSession {
    runner: Runner,
    dispatcher: Arc<Dispatcher>,
    debounce: Duration,
}

impl WatchSession {
    pub fn new(runner: Runner, dispatcher: Arc<Dispatcher>, debounce: Duration) -> Self {
        Self {
            runner,
            dispatcher,
            debounce,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Watch the source root with `notify` until `shutdown` resolves.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        self.dispatcher.validate(self.runner.registry())?;

        let source_root = self.runner.context().source_root.clone();
        let (_handle, events) = spawn_watcher(&source_root)?;
        info!(
            rules = self.dispatcher.rules().len(),
            debounce_ms = self.debounce.as_millis() as u64,
            "watch session started"
        );
        self.process_events(events, shutdown).await;
        info!("watch session stopped");
        Ok(())
    }

    /// Consume absolute changed paths until the channel closes or `shutdown`
    /// resolves.
    pub async fn process_events<F>(&self, mut events: mpsc::UnboundedReceiver<PathBuf>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let root = self.runner.context().source_root.clone();
        let root = root.canonicalize().unwrap_or(root);
        let dest = self.runner.context().dest_root.clone();
        let dest = dest.canonicalize().unwrap_or(dest);

        tokio::pin!(shutdown);

        loop {
            let first = tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    break;
                }
                next = events.recv() => match next {
                    Some(path) => path,
                    None => {
                        debug!("change source closed");
                        break;
                    }
                },
            };

            let mut batch = vec![first];
            let window = tokio::time::sleep(self.debounce);
            tokio::pin!(window);
            let mut closed = false;
            loop {
                tokio::select! {
                    _ = &mut window => break,
                    next = events.recv() => match next {
                        Some(path) => batch.push(path),
                        None => {
                            closed = true;
                            break;
                        }
                    },
                }
            }

            let rels = relativize(&root, &dest, &batch);
            self.dispatch_paths(&rels).await;

            if closed {
                debug!("change source closed");
                break;
            }
        }
    }

    /// Run every task whose rule matches one of `rel_paths`.
    ///
    /// Paths are relative to the source root with forward slashes. Each
    /// (rule, path) pair runs once, in arrival order.
    pub async fn dispatch_paths(&self, rel_paths: &[String]) -> Vec<DispatchRecord> {
        let triggers = self.dispatcher.triggers_for(rel_paths);
        if triggers.is_empty() {
            debug!(paths = ?rel_paths, "no watch rule matched");
            return Vec::new();
        }

        let mut records = Vec::with_capacity(triggers.len());
        for trigger in triggers {
            info!(task = %trigger.task, path = %trigger.path, "change detected; running task");
            let succeeded = match self.runner.execute(&trigger.task, TriggerReason::FileWatch).await {
                Ok(summary) => match summary.into_result() {
                    Ok(_) => true,
                    Err(err) => {
                        error!(task = %trigger.task, error = %err, "task failed; still watching");
                        false
                    }
                },
                Err(err) => {
                    error!(task = %trigger.task, error = %err, "task could not start; still watching");
                    false
                }
            };
            records.push(DispatchRecord { trigger, succeeded });
        }
        records
    }
}

/// Map absolute event paths to source-relative strings, dropping anything
/// outside the source root or inside the destination tree.
fn relativize(root: &Path, dest: &Path, paths: &[PathBuf]) -> Vec<String> {
    let mut rels = Vec::with_capacity(paths.len());
    for path in paths {
        if relative_str(dest, path).is_some() {
            continue;
        }
        match relative_str(root, path) {
            Some(rel) if !rel.is_empty() => rels.push(rel),
            Some(_) => {}
            None => warn!(path = %path.display(), "change outside source root; ignoring"),
        }
    }
    rels
}
