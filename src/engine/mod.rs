// src/engine/mod.rs

//! Task runner.
//!
//! [`Runner`] resolves a plan from the registry, feeds it through the
//! per-run [`crate::dag::Scheduler`], and executes pipelines on the blocking
//! pool while the scheduler decides what is ready next.

pub mod runner;

pub use runner::{RunSummary, Runner};
