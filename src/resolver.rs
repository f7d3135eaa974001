// src/resolver.rs

//! Dependency resolution: expands a requested task into an ordered
//! execution plan honouring pre/post constraints.
//!
//! The expansion is depth-first: a task's `pre` identities are resolved and
//! emitted in declared order, then the task itself, then its `post`
//! identities. An identity required by several branches executes once, at
//! its first required position. A "currently expanding" stack turns
//! revisits into a cycle error naming the members instead of looping.

use std::collections::HashSet;

use tracing::debug;

use crate::errors::{Result, TaskdockError};
use crate::meta::TaskId;
use crate::registry::Registry;

/// Expand `target` into an ordered plan of identities.
pub fn resolve(registry: &Registry, target: &TaskId) -> Result<Vec<TaskId>> {
    let mut plan = Vec::new();
    let mut emitted = HashSet::new();
    let mut expanding = Vec::new();

    visit(registry, target, None, &mut plan, &mut emitted, &mut expanding)?;

    debug!(target = %target, steps = plan.len(), "resolved execution plan");
    Ok(plan)
}

fn visit(
    registry: &Registry,
    id: &TaskId,
    referenced_by: Option<&TaskId>,
    plan: &mut Vec<TaskId>,
    emitted: &mut HashSet<TaskId>,
    expanding: &mut Vec<TaskId>,
) -> Result<()> {
    if emitted.contains(id) {
        return Ok(());
    }

    if let Some(pos) = expanding.iter().position(|x| x == id) {
        let mut members: Vec<String> = expanding[pos..].iter().map(TaskId::to_string).collect();
        members.push(id.to_string());
        return Err(TaskdockError::DependencyCycle(members.join(" -> ")));
    }

    let Some(meta) = registry.get(id) else {
        return Err(match referenced_by {
            Some(from) => TaskdockError::UnknownDependency {
                dependency: id.clone(),
                referenced_by: from.clone(),
            },
            None => TaskdockError::TaskNotFound(id.clone()),
        });
    };

    expanding.push(id.clone());

    for pre in &meta.pre {
        visit(registry, pre, Some(id), plan, emitted, expanding)?;
    }

    emitted.insert(id.clone());
    plan.push(id.clone());

    for post in &meta.post {
        visit(registry, post, Some(id), plan, emitted, expanding)?;
    }

    expanding.pop();
    Ok(())
}
