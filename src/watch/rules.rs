// src/watch/rules.rs

use std::collections::HashSet;
use std::fmt;

use globset::{GlobMatcher, GlobSet, GlobSetBuilder};
use tracing::debug;

use crate::dag::TaskRegistry;
use crate::errors::{AssetflowError, Result};
use crate::pipeline::sources::compile_glob;
use crate::types::TaskName;

/// One glob-pattern-to-task binding.
#[derive(Clone)]
pub struct WatchRule {
    pattern: String,
    matcher: GlobMatcher,
    task: TaskName,
}

impl fmt::Debug for WatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchRule")
            .field("pattern", &self.pattern)
            .field("task", &self.task)
            .finish()
    }
}

impl WatchRule {
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    /// Whether a path relative to the source root (forward slashes) matches.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.matcher.is_match(rel_path)
    }
}

/// A rule firing for one changed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    /// Index of the rule in registration order.
    pub rule: usize,
    pub task: TaskName,
    pub path: String,
}

/// Ordered table of watch rules.
///
/// Holds task names only; the runner resolves them against the registry at
/// dispatch time.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    rules: Vec<WatchRule>,
    union: Option<GlobSet>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule. The same pattern may be bound to several tasks.
    pub fn watch(&mut self, pattern: impl Into<String>, task: impl Into<TaskName>) -> Result<()> {
        let pattern = pattern.into();
        let task = task.into();
        let matcher = compile_glob(&pattern)?.compile_matcher();
        debug!(%pattern, task = %task, "watch rule registered");
        self.rules.push(WatchRule {
            pattern,
            matcher,
            task,
        });
        self.union = Some(self.build_union()?);
        Ok(())
    }

    pub fn rules(&self) -> &[WatchRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether any registered pattern matches.
    pub fn is_watched(&self, rel_path: &str) -> bool {
        self.union.as_ref().is_some_and(|set| set.is_match(rel_path))
    }

    /// Tasks whose rules match `rel_path`, in registration order.
    pub fn matching_tasks(&self, rel_path: &str) -> Vec<&str> {
        self.rules
            .iter()
            .filter(|r| r.matches(rel_path))
            .map(|r| r.task.as_str())
            .collect()
    }

    /// Expand a batch of changed paths into triggers.
    ///
    /// Each (rule, path) pair fires at most once per batch; order follows
    /// path arrival, then rule registration.
    pub fn triggers_for<I, S>(&self, paths: I) -> Vec<Trigger>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen: HashSet<(usize, String)> = HashSet::new();
        let mut triggers = Vec::new();

        for path in paths {
            let path = path.as_ref();
            if !self.is_watched(path) {
                continue;
            }
            for (index, rule) in self.rules.iter().enumerate() {
                if rule.matches(path) && seen.insert((index, path.to_string())) {
                    triggers.push(Trigger {
                        rule: index,
                        task: rule.task.clone(),
                        path: path.to_string(),
                    });
                }
            }
        }
        triggers
    }

    /// Every rule must name a registered task.
    pub fn validate(&self, registry: &TaskRegistry) -> Result<()> {
        for rule in &self.rules {
            if !registry.contains(&rule.task) {
                return Err(AssetflowError::config(format!(
                    "watch rule '{}' targets unknown task '{}'",
                    rule.pattern, rule.task
                )));
            }
        }
        Ok(())
    }

    fn build_union(&self) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for rule in &self.rules {
            builder.add(compile_glob(&rule.pattern)?);
        }
        builder
            .build()
            .map_err(|e| AssetflowError::config(format!("building watch glob set: {e}")))
    }
}
