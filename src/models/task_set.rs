use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use super::{Task, TaskRecord, TaskStatus, Trade, TradeRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Task,
    Trade,
}

/// A record rejected while building a [`TaskSet`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub kind: RecordKind,
    /// Position in the input sequence.
    pub position: usize,
    pub id: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub skipped: Vec<SkippedRecord>,
}

impl IngestReport {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn skipped_tasks(&self) -> usize {
        self.skipped.iter().filter(|s| s.kind == RecordKind::Task).count()
    }

    fn skip(&mut self, kind: RecordKind, position: usize, id: Option<&str>, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(?kind, position, id, %reason, "skipping record");
        self.skipped.push(SkippedRecord {
            kind,
            position,
            id: id.map(str::to_string),
            reason,
        });
    }
}

/// Flat, validated snapshot of one project's tasks and trades.
///
/// Tasks are stored in chronological order (planned start ascending, tasks
/// without a start last, ties broken by id) and addressed by index; all
/// cross-references stay as ids.
#[derive(Debug, Clone)]
pub struct TaskSet {
    project_name: String,
    tasks: Vec<Task>,
    task_index: HashMap<String, usize>,
    trades: Vec<Trade>,
    trade_index: HashMap<String, usize>,
    ingest: IngestReport,
}

impl TaskSet {
    /// Builds a set from already-typed tasks. Duplicates and self-dependencies
    /// are still rejected.
    pub fn new(project_name: impl Into<String>, trades: Vec<Trade>, tasks: Vec<Task>) -> Self {
        let mut ingest = IngestReport::default();
        let trades = dedup_trades(trades, &mut ingest);
        Self::assemble(project_name.into(), trades, tasks, ingest)
    }

    /// Validates raw collaborator records. Anything malformed is left out and
    /// listed in [`TaskSet::ingest_report`].
    pub fn from_records(
        project_name: impl Into<String>,
        trades: Vec<TradeRecord>,
        tasks: Vec<TaskRecord>,
    ) -> Self {
        let mut ingest = IngestReport::default();

        let mut typed_trades = Vec::with_capacity(trades.len());
        for (position, record) in trades.into_iter().enumerate() {
            let Some(id) = non_blank(record.id) else {
                ingest.skip(RecordKind::Trade, position, None, "missing id");
                continue;
            };
            let name = non_blank(record.name).unwrap_or_else(|| id.clone());
            typed_trades.push(Trade { id, name });
        }
        let typed_trades = dedup_trades(typed_trades, &mut ingest);

        let mut typed_tasks = Vec::with_capacity(tasks.len());
        for (position, record) in tasks.into_iter().enumerate() {
            match parse_task_record(record) {
                Ok(task) => typed_tasks.push(task),
                Err((id, reason)) => ingest.skip(RecordKind::Task, position, id.as_deref(), reason),
            }
        }

        Self::assemble(project_name.into(), typed_trades, typed_tasks, ingest)
    }

    fn assemble(project_name: String, trades: Vec<Trade>, tasks: Vec<Task>, mut ingest: IngestReport) -> Self {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(tasks.len());
        for (position, mut task) in tasks.into_iter().enumerate() {
            if task.id.trim().is_empty() {
                ingest.skip(RecordKind::Task, position, None, "missing id");
                continue;
            }
            if task.depends_on(&task.id) {
                ingest.skip(RecordKind::Task, position, Some(task.id.as_str()), "task depends on itself");
                continue;
            }
            if !seen.insert(task.id.clone()) {
                ingest.skip(RecordKind::Task, position, Some(task.id.as_str()), "duplicate task id");
                continue;
            }
            if let (Some(start), Some(end)) = (task.planned_start, task.planned_end) {
                if start > end {
                    ingest.skip(
                        RecordKind::Task,
                        position,
                        Some(task.id.as_str()),
                        format!("planned start {start} is after planned end {end}"),
                    );
                    continue;
                }
            }
            let mut deps = HashSet::new();
            task.depends_on.retain(|d| deps.insert(d.clone()));
            kept.push(task);
        }

        kept.sort_by(chronological);

        let task_index = kept
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.clone(), i))
            .collect();
        let trade_index = trades
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.clone(), i))
            .collect();

        Self {
            project_name,
            tasks: kept,
            task_index,
            trades,
            trade_index,
            ingest,
        }
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// Tasks in chronological order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.task_index.get(id).map(|&i| &self.tasks[i])
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.task_index.get(id).copied()
    }

    pub fn trade(&self, id: &str) -> Option<&Trade> {
        self.trade_index.get(id).map(|&i| &self.trades[i])
    }

    /// Display name of the task's trade, if it has one that resolves.
    pub fn trade_name_of(&self, task: &Task) -> Option<&str> {
        task.trade_id
            .as_deref()
            .and_then(|id| self.trade(id))
            .map(|t| t.name.as_str())
    }

    pub fn ingest_report(&self) -> &IngestReport {
        &self.ingest
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Planned start ascending, unscheduled starts last, then id.
pub fn chronological(a: &Task, b: &Task) -> Ordering {
    match (a.planned_start, b.planned_start) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.id.cmp(&b.id))
}

fn dedup_trades(trades: Vec<Trade>, ingest: &mut IngestReport) -> Vec<Trade> {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(trades.len());
    for (position, trade) in trades.into_iter().enumerate() {
        if seen.insert(trade.id.clone()) {
            kept.push(trade);
        } else {
            ingest.skip(RecordKind::Trade, position, Some(trade.id.as_str()), "duplicate trade id");
        }
    }
    kept
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_date(field: &str, value: Option<String>) -> Result<Option<NaiveDate>, String> {
    match non_blank(value) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| format!("invalid {field} '{s}' (expected YYYY-MM-DD)")),
    }
}

fn parse_task_record(record: TaskRecord) -> Result<Task, (Option<String>, String)> {
    let Some(id) = non_blank(record.id) else {
        return Err((None, "missing id".to_string()));
    };
    let fail = |reason: String| (Some(id.clone()), reason);

    let status = match non_blank(record.status) {
        None => TaskStatus::Planned,
        Some(s) => TaskStatus::from_str(&s).ok_or_else(|| fail(format!("unknown status '{s}'")))?,
    };

    Ok(Task {
        planned_start: parse_date("planned_start", record.planned_start).map_err(fail)?,
        planned_end: parse_date("planned_end", record.planned_end).map_err(fail)?,
        actual_start: parse_date("actual_start", record.actual_start).map_err(fail)?,
        actual_end: parse_date("actual_end", record.actual_end).map_err(fail)?,
        name: non_blank(record.name),
        trade_id: non_blank(record.trade),
        status,
        depends_on: record.after.into_iter().filter_map(|d| non_blank(Some(d))).collect(),
        id,
    })
}
