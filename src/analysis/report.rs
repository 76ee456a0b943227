use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::models::{
    CoordinationReport, Findings, Task, TaskDisplay, TaskSet, TaskStatus, UNASSIGNED_TRADE,
};

pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

/// Build the coordination report for one project.
///
/// `None` for the task set means the collaborator could not supply the
/// project at all; the result is then `None` too. An empty but present task
/// set yields a report with zero counts.
pub fn assemble_report(
    set: Option<&TaskSet>,
    findings: Option<&Findings>,
    generated_date: NaiveDate,
) -> Option<CoordinationReport> {
    let set = set?;

    let mut tasks_by_trade: BTreeMap<String, Vec<TaskDisplay>> = BTreeMap::new();
    let (mut completed, mut in_progress, mut planned, mut delayed) = (0, 0, 0, 0);

    for task in set.tasks() {
        match task.status {
            TaskStatus::Completed => completed += 1,
            TaskStatus::InProgress => in_progress += 1,
            TaskStatus::Planned => planned += 1,
            TaskStatus::Delayed => delayed += 1,
        }
        let group = set.trade_name_of(task).unwrap_or(UNASSIGNED_TRADE);
        tasks_by_trade
            .entry(group.to_string())
            .or_default()
            .push(task_display(task));
    }

    debug!(
        project = set.project_name(),
        tasks = set.len(),
        groups = tasks_by_trade.len(),
        "coordination report assembled"
    );

    Some(CoordinationReport {
        project_name: set.project_name().to_string(),
        generated_date,
        tasks_by_trade,
        total_tasks: set.len(),
        completed_tasks: completed,
        in_progress_tasks: in_progress,
        planned_tasks: planned,
        delayed_tasks: delayed,
        skipped_records: set.ingest_report().skipped_count(),
        findings: findings.cloned(),
    })
}

pub fn task_display(task: &Task) -> TaskDisplay {
    let fmt = |d: Option<NaiveDate>| d.map(|d| d.format(DISPLAY_DATE_FORMAT).to_string());
    TaskDisplay {
        id: task.id.clone(),
        name: task.display_name().to_string(),
        planned_start: fmt(task.planned_start),
        planned_end: fmt(task.planned_end),
        actual_start: fmt(task.actual_start),
        actual_end: fmt(task.actual_end),
        status: task.status.as_str().to_string(),
    }
}
