use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::Findings;

/// Group label for tasks with no (resolvable) trade.
pub const UNASSIGNED_TRADE: &str = "unassigned";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskDisplay {
    pub id: String,
    pub name: String,
    pub planned_start: Option<String>,
    pub planned_end: Option<String>,
    pub actual_start: Option<String>,
    pub actual_end: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoordinationReport {
    pub project_name: String,
    pub generated_date: NaiveDate,
    pub tasks_by_trade: BTreeMap<String, Vec<TaskDisplay>>,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub in_progress_tasks: usize,
    pub planned_tasks: usize,
    pub delayed_tasks: usize,
    /// Records rejected when the task set was built; not part of `total_tasks`.
    pub skipped_records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub findings: Option<Findings>,
}
