use std::collections::BTreeMap;

use tracing::debug;

use crate::graph::{build_dependents, transitive_dependents};
use crate::models::{days_between, DependencyConflict, TaskSet};

/// Declared dependencies whose planned end falls after the dependent task's
/// planned start. Sorted by (task id, dependency id).
///
/// Tasks without a planned start, dependencies without a planned end and
/// dependency ids that do not resolve are skipped.
pub fn detect_schedule_conflicts(set: &TaskSet) -> Vec<DependencyConflict> {
    let mut conflicts = Vec::new();

    for task in set.tasks() {
        let Some(start) = task.planned_start else {
            continue;
        };
        for dep_id in &task.depends_on {
            let Some(dep) = set.task(dep_id) else {
                debug!(task = %task.id, dependency = %dep_id, "dangling dependency skipped");
                continue;
            };
            let Some(dep_end) = dep.planned_end else {
                continue;
            };
            if start < dep_end {
                conflicts.push(DependencyConflict {
                    task_id: task.id.clone(),
                    dependency_id: dep.id.clone(),
                    conflict_days: days_between(start, dep_end),
                });
            }
        }
    }

    conflicts.sort_by(|a, b| {
        a.task_id
            .cmp(&b.task_id)
            .then_with(|| a.dependency_id.cmp(&b.dependency_id))
    });
    debug!(count = conflicts.len(), "schedule conflict check done");
    conflicts
}

/// For each task involved in a conflict as the late starter, the tasks
/// downstream of it that would inherit a slip.
pub fn downstream_impact(set: &TaskSet, conflicts: &[DependencyConflict]) -> BTreeMap<String, Vec<String>> {
    if conflicts.is_empty() {
        return BTreeMap::new();
    }
    let graph = build_dependents(set.tasks());
    conflicts
        .iter()
        .map(|c| c.task_id.as_str())
        .map(|id| (id.to_string(), transitive_dependents(&graph, id)))
        .filter(|(_, downstream)| !downstream.is_empty())
        .collect()
}
