use chrono::NaiveDate;
use rusqlite::{params, Connection};

use crate::db::{dependency_repo, like_escape};
use crate::error::CoordError;
use crate::models::{Task, TaskStatus};

const TASK_COLUMNS: &str =
    "id, name, trade_id, planned_start, planned_end, actual_start, actual_end, status";

#[derive(Debug, Clone)]
pub struct NewTask<'a> {
    pub id: &'a str,
    pub project_id: &'a str,
    pub name: Option<&'a str>,
    pub trade_id: Option<&'a str>,
    pub planned_start: Option<NaiveDate>,
    pub planned_end: Option<NaiveDate>,
    pub actual_start: Option<NaiveDate>,
    pub actual_end: Option<NaiveDate>,
    pub status: TaskStatus,
    pub sort_order: i32,
}

/// Date columns to overwrite; `None` leaves a column untouched.
#[derive(Debug, Clone, Default)]
pub struct DateUpdate {
    pub planned_start: Option<NaiveDate>,
    pub planned_end: Option<NaiveDate>,
    pub actual_start: Option<NaiveDate>,
    pub actual_end: Option<NaiveDate>,
}

impl DateUpdate {
    pub fn is_empty(&self) -> bool {
        self.planned_start.is_none()
            && self.planned_end.is_none()
            && self.actual_start.is_none()
            && self.actual_end.is_none()
    }
}

pub fn create_task(conn: &Connection, task: &NewTask) -> Result<Task, CoordError> {
    conn.execute(
        "INSERT INTO tasks (id, project_id, name, trade_id, planned_start, planned_end,
                            actual_start, actual_end, status, sort_order)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            task.id,
            task.project_id,
            task.name,
            task.trade_id,
            task.planned_start,
            task.planned_end,
            task.actual_start,
            task.actual_end,
            task.status.as_str(),
            task.sort_order
        ],
    )?;
    get_task_by_id(conn, task.id)
}

pub fn get_task_by_id(conn: &Connection, id: &str) -> Result<Task, CoordError> {
    let mut task = conn
        .query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
            params![id],
            row_to_task,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => CoordError::task_not_found(id),
            _ => CoordError::from(e),
        })?;
    task.depends_on = dependency_repo::get_dependencies(conn, id)?;
    Ok(task)
}

/// Resolve task by exact id or id prefix within a project.
pub fn resolve_task(conn: &Connection, project_id: &str, reference: &str) -> Result<Task, CoordError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE project_id = ?1 AND (id = ?2 OR id LIKE ?3 ESCAPE '\\')"
    ))?;
    let prefix = format!("{}%", like_escape(reference));
    let tasks: Vec<Task> = stmt
        .query_map(params![project_id, reference, prefix], row_to_task)?
        .collect::<Result<Vec<_>, _>>()?;

    let exact = tasks.iter().position(|t| t.id == reference);
    let mut task = match (exact, tasks.len()) {
        (Some(i), _) => tasks.into_iter().nth(i),
        (None, 1) => tasks.into_iter().next(),
        (None, 0) => None,
        (None, _) => {
            let candidates: Vec<String> = tasks
                .iter()
                .map(|t| format!("{} ({})", t.display_name(), t.id))
                .collect();
            return Err(CoordError::ambiguous_ref(reference, &candidates));
        }
    }
    .ok_or_else(|| CoordError::task_not_found(reference))?;

    task.depends_on = dependency_repo::get_dependencies(conn, &task.id)?;
    Ok(task)
}

pub fn list_tasks_by_project(conn: &Connection, project_id: &str) -> Result<Vec<Task>, CoordError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE project_id = ?1 ORDER BY sort_order ASC, id ASC"
    ))?;
    let mut tasks = stmt
        .query_map(params![project_id], row_to_task)?
        .collect::<Result<Vec<_>, _>>()?;

    let edges = dependency_repo::get_all_dependencies_for_project(conn, project_id)?;
    for task in &mut tasks {
        task.depends_on = edges
            .iter()
            .filter(|e| e.task_id == task.id)
            .map(|e| e.dependency_id.clone())
            .collect();
    }
    Ok(tasks)
}

pub fn next_sort_order(conn: &Connection, project_id: &str) -> Result<i32, CoordError> {
    let max: i32 = conn.query_row(
        "SELECT COALESCE(MAX(sort_order), -1) FROM tasks WHERE project_id = ?1",
        params![project_id],
        |row| row.get(0),
    )?;
    Ok(max + 1)
}

pub fn update_task_status(conn: &Connection, id: &str, status: TaskStatus) -> Result<(), CoordError> {
    let changed = conn.execute(
        "UPDATE tasks SET status = ?1, updated_at = datetime('now') WHERE id = ?2",
        params![status.as_str(), id],
    )?;
    if changed == 0 {
        return Err(CoordError::task_not_found(id));
    }
    Ok(())
}

pub fn update_task_dates(conn: &Connection, id: &str, dates: &DateUpdate) -> Result<(), CoordError> {
    let changed = conn.execute(
        "UPDATE tasks SET
            planned_start = COALESCE(?1, planned_start),
            planned_end = COALESCE(?2, planned_end),
            actual_start = COALESCE(?3, actual_start),
            actual_end = COALESCE(?4, actual_end),
            updated_at = datetime('now')
         WHERE id = ?5",
        params![
            dates.planned_start,
            dates.planned_end,
            dates.actual_start,
            dates.actual_end,
            id
        ],
    )?;
    if changed == 0 {
        return Err(CoordError::task_not_found(id));
    }
    Ok(())
}

fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
    let status: String = row.get(7)?;
    Ok(Task {
        id: row.get(0)?,
        name: row.get(1)?,
        trade_id: row.get(2)?,
        planned_start: row.get(3)?,
        planned_end: row.get(4)?,
        actual_start: row.get(5)?,
        actual_end: row.get(6)?,
        status: TaskStatus::from_str(&status).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                7,
                rusqlite::types::Type::Text,
                format!("unknown task status '{status}'").into(),
            )
        })?,
        depends_on: Vec::new(),
    })
}
