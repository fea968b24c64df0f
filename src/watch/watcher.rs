// src/watch/watcher.rs

use std::path::PathBuf;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::errors::{AssetflowError, Result};

/// Handle for the filesystem watcher.
///
/// Dropping this handle stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Watch `root` recursively and forward every changed path.
///
/// Access-only events are dropped; creations, modifications, renames and
/// removals are all forwarded.
pub fn spawn_watcher(root: impl Into<PathBuf>) -> Result<(WatcherHandle, mpsc::UnboundedReceiver<PathBuf>)> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or_else(|_| root.clone());

    let (path_tx, path_rx) = mpsc::unbounded_channel::<PathBuf>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if matches!(event.kind, EventKind::Access(_)) {
                    return;
                }
                debug!(?event, "received notify event");
                for path in event.paths {
                    if path_tx.send(path).is_err() {
                        debug!("watch session gone; dropping notify event");
                        return;
                    }
                }
            }
            Err(err) => error!(error = %err, "file watch error"),
        },
        Config::default(),
    )
    .map_err(|e| AssetflowError::config(format!("creating file watcher: {e}")))?;

    watcher
        .watch(&root, RecursiveMode::Recursive)
        .map_err(|e| AssetflowError::config(format!("watching {}: {e}", root.display())))?;

    info!(root = %root.display(), "file watcher started");

    Ok((WatcherHandle { _inner: watcher }, path_rx))
}
