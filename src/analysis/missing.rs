use tracing::debug;

use crate::models::{days_between, MissingDependencyCandidate, TaskSet};

/// Default lookback window, in days.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 5;

/// Suggest predecessors for tasks that declare no dependencies.
///
/// A task with a planned start and an empty dependency list is a subject. Any
/// task that precedes it in chronological order, or has no planned start at
/// all, is a candidate when its planned end lies `0..=lookback_days` days
/// before the subject's start. Overlapping predecessors (negative gap) are
/// left to the conflict check.
///
/// Output is advisory and follows chronological order for both subjects and
/// candidates.
pub fn infer_missing_dependencies(set: &TaskSet, lookback_days: i64) -> Vec<MissingDependencyCandidate> {
    let tasks = set.tasks();
    let mut found = Vec::new();

    for (i, task) in tasks.iter().enumerate() {
        let Some(start) = task.planned_start else {
            // unscheduled starts sort last
            break;
        };
        if !task.depends_on.is_empty() {
            continue;
        }

        let candidate_predecessor_ids: Vec<String> = tasks
            .iter()
            .enumerate()
            .filter(|&(j, other)| j != i && (j < i || other.planned_start.is_none()))
            .filter_map(|(_, other)| {
                let gap = days_between(other.planned_end?, start);
                (0..=lookback_days).contains(&gap).then(|| other.id.clone())
            })
            .collect();

        if !candidate_predecessor_ids.is_empty() {
            found.push(MissingDependencyCandidate {
                task_id: task.id.clone(),
                candidate_predecessor_ids,
            });
        }
    }

    debug!(count = found.len(), lookback_days, "missing dependency inference done");
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::testutil::{date, depending, scheduled};
    use crate::models::Task;

    #[test]
    fn test_inside_window_reported_outside_not() {
        let set = TaskSet::new(
            "p",
            vec![],
            vec![
                scheduled("near", None, (1, 2), (1, 6)),
                scheduled("far", None, (1, 1), (1, 3)),
                scheduled("subject", None, (1, 10), (1, 12)),
            ],
        );
        let found = infer_missing_dependencies(&set, DEFAULT_LOOKBACK_DAYS);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].task_id, "subject");
        assert_eq!(found[0].candidate_predecessor_ids, vec!["near".to_string()]);
    }

    #[test]
    fn test_window_edges() {
        let set = TaskSet::new(
            "p",
            vec![],
            vec![
                scheduled("same-day", None, (1, 8), (1, 10)),
                scheduled("five", None, (1, 1), (1, 5)),
                scheduled("six", None, (1, 1), (1, 4)),
                scheduled("subject", None, (1, 10), (1, 12)),
            ],
        );
        let found = infer_missing_dependencies(&set, DEFAULT_LOOKBACK_DAYS);
        let subject = found.iter().find(|f| f.task_id == "subject").unwrap();
        assert_eq!(
            subject.candidate_predecessor_ids,
            vec!["five".to_string(), "same-day".to_string()]
        );
        // same-day itself starts Jan 8: "five" ends 3 days before, "six" 4
        let same_day = found.iter().find(|f| f.task_id == "same-day").unwrap();
        assert_eq!(
            same_day.candidate_predecessor_ids,
            vec!["five".to_string(), "six".to_string()]
        );
    }

    #[test]
    fn test_negative_gap_excluded() {
        let set = TaskSet::new(
            "p",
            vec![],
            vec![
                scheduled("still-open", None, (1, 1), (1, 11)),
                scheduled("subject", None, (1, 10), (1, 12)),
            ],
        );
        let found = infer_missing_dependencies(&set, DEFAULT_LOOKBACK_DAYS);
        assert!(found.iter().all(|f| f.task_id != "subject"));
    }

    #[test]
    fn test_tasks_with_dependencies_are_not_subjects() {
        let set = TaskSet::new(
            "p",
            vec![],
            vec![
                scheduled("a", None, (1, 1), (1, 8)),
                scheduled("b", None, (1, 2), (1, 9)),
                depending(scheduled("c", None, (1, 10), (1, 12)), &["a"]),
            ],
        );
        assert!(infer_missing_dependencies(&set, DEFAULT_LOOKBACK_DAYS).is_empty());
    }

    #[test]
    fn test_unscheduled_start_is_candidate_not_subject() {
        let mut end_only = Task::new("end-only");
        end_only.planned_end = Some(date(1, 8));
        let set = TaskSet::new(
            "p",
            vec![],
            vec![end_only, Task::new("nothing"), scheduled("subject", None, (1, 10), (1, 11))],
        );
        let found = infer_missing_dependencies(&set, DEFAULT_LOOKBACK_DAYS);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].task_id, "subject");
        assert_eq!(found[0].candidate_predecessor_ids, vec!["end-only".to_string()]);
    }

    #[test]
    fn test_custom_lookback() {
        let set = TaskSet::new(
            "p",
            vec![],
            vec![
                scheduled("far", None, (1, 1), (1, 3)),
                scheduled("subject", None, (1, 10), (1, 12)),
            ],
        );
        assert!(infer_missing_dependencies(&set, 5).is_empty());
        assert_eq!(infer_missing_dependencies(&set, 7).len(), 1);
        assert!(infer_missing_dependencies(&set, -1).is_empty());
    }
}
