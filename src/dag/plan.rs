// src/dag/plan.rs

use std::collections::HashMap;

use crate::dag::registry::TaskRegistry;
use crate::errors::{AssetflowError, Result};
use crate::types::TaskName;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Visited,
}

/// Resolve the execution plan for `root`.
///
/// The plan is the depth-first post-order of the prerequisite tree:
/// prerequisites in listed order, each task exactly once, `root` last.
/// Unknown roots fail with `TaskNotFound`; unknown prerequisites and cycles
/// fail with a configuration error naming the offending chain.
pub fn resolve_plan(registry: &TaskRegistry, root: &str) -> Result<Vec<TaskName>> {
    registry.require(root)?;

    let mut marks: HashMap<TaskName, Mark> = HashMap::new();
    let mut plan = Vec::new();
    let mut path = Vec::new();
    visit(registry, root, &mut marks, &mut path, &mut plan)?;
    Ok(plan)
}

fn visit(
    registry: &TaskRegistry,
    name: &str,
    marks: &mut HashMap<TaskName, Mark>,
    path: &mut Vec<TaskName>,
    plan: &mut Vec<TaskName>,
) -> Result<()> {
    match marks.get(name) {
        Some(Mark::Visited) => return Ok(()),
        Some(Mark::Visiting) => {
            let start = path.iter().position(|p| p == name).unwrap_or(0);
            let mut chain: Vec<&str> = path[start..].iter().map(String::as_str).collect();
            chain.push(name);
            return Err(AssetflowError::config(format!(
                "prerequisite cycle: {}",
                chain.join(" -> ")
            )));
        }
        None => {}
    }

    let task = registry.get(name).ok_or_else(|| {
        let parent = path.last().map(String::as_str).unwrap_or("<root>");
        AssetflowError::config(format!(
            "task '{parent}' has unknown prerequisite '{name}'"
        ))
    })?;

    marks.insert(name.to_string(), Mark::Visiting);
    path.push(name.to_string());

    for prereq in &task.prerequisites {
        visit(registry, prereq, marks, path, plan)?;
    }

    path.pop();
    marks.insert(name.to_string(), Mark::Visited);
    plan.push(name.to_string());
    Ok(())
}
