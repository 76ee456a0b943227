use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::models::Task;

/// task id → ids of the tasks that declare it as a dependency.
pub type DependentsMap = BTreeMap<String, Vec<String>>;

/// Reverse the declared dependency edges: for every task, list who would be
/// affected if it slipped. Every task in `tasks` gets an entry (possibly
/// empty). References to ids outside `tasks` are ignored.
pub fn build_dependents(tasks: &[Task]) -> DependentsMap {
    let known: HashSet<&str> = tasks.iter().map(|t| t.id.as_str()).collect();

    let mut adj: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for task in tasks {
        adj.entry(task.id.as_str()).or_default();
    }
    for task in tasks {
        for dep_id in &task.depends_on {
            if known.contains(dep_id.as_str()) {
                adj.entry(dep_id.as_str()).or_default().insert(task.id.as_str());
            }
        }
    }

    adj.into_iter()
        .map(|(id, dependents)| {
            (
                id.to_string(),
                dependents.into_iter().map(str::to_string).collect(),
            )
        })
        .collect()
}

/// Every task reachable downstream of `id`, nearest first. Each task is
/// visited once, so cyclic declarations terminate.
pub fn transitive_dependents(graph: &DependentsMap, id: &str) -> Vec<String> {
    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(id);
    let mut order = Vec::new();
    let mut frontier = vec![id];

    while !frontier.is_empty() {
        let mut next = Vec::new();
        for node in frontier {
            let Some(children) = graph.get(node) else { continue };
            for child in children {
                if visited.insert(child.as_str()) {
                    order.push(child.clone());
                    next.push(child.as_str());
                }
            }
        }
        frontier = next;
    }
    order
}
