// src/dag/registry.rs

use std::collections::BTreeMap;
use std::sync::Arc;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::errors::{AssetflowError, Result};
use crate::pipeline::TaskPipeline;
use crate::types::TaskName;

/// What a task does once its prerequisites are done.
#[derive(Debug, Clone)]
pub enum TaskAction {
    /// Pure aggregation point (`lint`, `build`, `default`).
    Aggregate,
    /// Run a transform pipeline or lint gate.
    Pipeline(Arc<dyn TaskPipeline>),
    /// Start the watch session once the rest of the run has finished.
    Watch,
}

impl TaskAction {
    pub fn kind(&self) -> &'static str {
        match self {
            TaskAction::Aggregate => "aggregate",
            TaskAction::Pipeline(_) => "pipeline",
            TaskAction::Watch => "watch",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Task {
    pub name: TaskName,
    pub action: TaskAction,
    /// Ordered prerequisite names.
    pub prerequisites: Vec<TaskName>,
}

/// Owns every task definition.
///
/// Built once at startup and handed to the runner; lookups are by name.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<TaskName, Task>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task. Re-defining an existing name replaces it.
    pub fn define<I, S>(&mut self, name: impl Into<TaskName>, action: TaskAction, prerequisites: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        let name = name.into();
        let prerequisites: Vec<TaskName> = prerequisites.into_iter().map(Into::into).collect();
        debug!(task = %name, kind = action.kind(), ?prerequisites, "task defined");

        let task = Task {
            name: name.clone(),
            action,
            prerequisites,
        };
        if self.tasks.insert(name.clone(), task).is_some() {
            debug!(task = %name, "replaced existing task definition");
        }
    }

    pub fn get(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Registered task names, sorted.
    pub fn names(&self) -> Vec<TaskName> {
        self.tasks.keys().cloned().collect()
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Look up a task, failing with the list of available names.
    pub fn require(&self, name: &str) -> Result<&Task> {
        self.get(name).ok_or_else(|| AssetflowError::TaskNotFound {
            name: name.to_string(),
            available: self.names(),
        })
    }

    /// Check the whole table: every prerequisite must exist and the graph
    /// must be acyclic.
    pub fn validate(&self) -> Result<()> {
        for task in self.tasks.values() {
            for prereq in &task.prerequisites {
                if prereq == &task.name {
                    return Err(AssetflowError::config(format!(
                        "task '{}' lists itself as a prerequisite",
                        task.name
                    )));
                }
                if !self.tasks.contains_key(prereq) {
                    return Err(AssetflowError::config(format!(
                        "task '{}' has unknown prerequisite '{}'",
                        task.name, prereq
                    )));
                }
            }
        }

        // Edge direction: prerequisite -> task.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for name in self.tasks.keys() {
            graph.add_node(name.as_str());
        }
        for task in self.tasks.values() {
            for prereq in &task.prerequisites {
                graph.add_edge(prereq.as_str(), task.name.as_str(), ());
            }
        }

        toposort(&graph, None).map(|_| ()).map_err(|cycle| {
            AssetflowError::config(format!(
                "prerequisite cycle involving task '{}'",
                cycle.node_id()
            ))
        })
    }
}
