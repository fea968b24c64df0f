// src/dag/graph.rs

use std::collections::HashMap;

use crate::dag::registry::TaskRegistry;
use crate::types::TaskName;

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone)]
struct DagNode {
    /// Prerequisites: tasks that must succeed before this one can run.
    deps: Vec<TaskName>,
    /// Tasks that list this one as a prerequisite.
    dependents: Vec<TaskName>,
}

/// Adjacency view of the tasks taking part in one run.
///
/// Only tasks from a resolved plan are present, so every edge points at a
/// known node and the graph is acyclic.
#[derive(Debug, Clone)]
pub struct DagGraph {
    nodes: HashMap<TaskName, DagNode>,
}

impl DagGraph {
    /// Build the graph for a resolved plan.
    pub fn from_plan(registry: &TaskRegistry, plan: &[TaskName]) -> Self {
        let mut nodes: HashMap<TaskName, DagNode> = HashMap::new();

        for name in plan {
            let deps = registry
                .get(name)
                .map(|t| t.prerequisites.clone())
                .unwrap_or_default();
            nodes.insert(
                name.clone(),
                DagNode {
                    deps,
                    dependents: Vec::new(),
                },
            );
        }

        // Plan order keeps the dependents lists deterministic.
        for name in plan {
            let deps = nodes.get(name).map(|n| n.deps.clone()).unwrap_or_default();
            for dep in deps {
                if let Some(dep_node) = nodes.get_mut(&dep) {
                    if !dep_node.dependents.contains(name) {
                        dep_node.dependents.push(name.clone());
                    }
                }
            }
        }

        Self { nodes }
    }

    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    pub fn dependencies_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    pub fn dependents_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }
}
