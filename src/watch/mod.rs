// src/watch/mod.rs

//! Watch dispatcher.
//!
//! - [`rules`] holds the ordered glob-to-task table.
//! - [`watcher`] wires up a cross-platform filesystem watcher (`notify`).
//! - [`session`] batches change events and invokes the runner per match.
//!
//! Rules only name tasks; pipeline logic stays in the registry.

pub mod path_utils;
pub mod rules;
pub mod session;
pub mod watcher;

pub use rules::{Dispatcher, Trigger, WatchRule};
pub use session::{DispatchRecord, WatchSession};
pub use watcher::{WatcherHandle, spawn_watcher};
