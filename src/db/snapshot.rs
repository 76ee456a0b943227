use std::collections::HashMap;

use rusqlite::{params, Connection};
use tracing::debug;

use crate::db::{dependency_repo, trade_repo};
use crate::error::CoordError;
use crate::models::{Project, TaskRecord, TaskSet, TradeRecord};

/// Load a project's trades, tasks and dependency edges as one consistent
/// snapshot. Rows go through the same ingestion checks as JSON input.
pub fn load_task_set(conn: &Connection, project: &Project) -> Result<TaskSet, CoordError> {
    conn.execute_batch("BEGIN DEFERRED")?;
    let result = (|| -> Result<_, CoordError> {
        let trades = trade_repo::list_trades_by_project(conn, &project.id)?;
        let tasks = list_task_records(conn, &project.id)?;
        let edges = dependency_repo::get_all_dependencies_for_project(conn, &project.id)?;
        Ok((trades, tasks, edges))
    })();

    let (trades, mut tasks, edges) = match result {
        Ok(loaded) => {
            conn.execute_batch("COMMIT")?;
            loaded
        }
        Err(e) => {
            let _ = conn.execute_batch("ROLLBACK");
            return Err(e);
        }
    };

    let mut by_task: HashMap<String, Vec<String>> = HashMap::new();
    for edge in edges {
        by_task.entry(edge.task_id).or_default().push(edge.dependency_id);
    }
    for record in &mut tasks {
        if let Some(deps) = record.id.as_ref().and_then(|id| by_task.remove(id)) {
            record.after = deps;
        }
    }

    debug!(project = %project.name, tasks = tasks.len(), trades = trades.len(), "snapshot loaded");

    let trade_records = trades
        .into_iter()
        .map(|t| TradeRecord {
            id: Some(t.id),
            name: Some(t.name),
        })
        .collect();
    Ok(TaskSet::from_records(project.name.clone(), trade_records, tasks))
}

fn list_task_records(conn: &Connection, project_id: &str) -> Result<Vec<TaskRecord>, CoordError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, trade_id, planned_start, planned_end, actual_start, actual_end, status
         FROM tasks WHERE project_id = ?1 ORDER BY sort_order ASC, id ASC",
    )?;
    let records = stmt
        .query_map(params![project_id], |row| {
            Ok(TaskRecord {
                id: row.get(0)?,
                name: row.get(1)?,
                trade: row.get(2)?,
                planned_start: row.get(3)?,
                planned_end: row.get(4)?,
                actual_start: row.get(5)?,
                actual_end: row.get(6)?,
                status: row.get(7)?,
                after: Vec::new(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}
