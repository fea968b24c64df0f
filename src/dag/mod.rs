// src/dag/mod.rs

//! Task registry, plan resolution and scheduling.
//!
//! - [`registry`] owns task definitions and validates the whole table.
//! - [`plan`] resolves the ordered execution plan for a requested task.
//! - [`graph`] holds prerequisite/dependent adjacency for one plan.
//! - [`scheduler`] is the per-run state machine deciding which tasks are
//!   ready and which must be skipped after a failure.
//! - [`state_manager`] manages per-run state transitions.

pub mod graph;
pub mod plan;
pub mod registry;
pub mod scheduler;
pub mod scheduler_step;
pub mod state_manager;
pub mod task_info;

pub use graph::DagGraph;
pub use plan::resolve_plan;
pub use registry::{Task, TaskAction, TaskRegistry};
pub use scheduler::Scheduler;
pub use scheduler_step::SchedulerStep;
pub use task_info::{ScheduledTask, TaskRunState};
