use rusqlite::{params, Connection};

use crate::error::CoordError;
use crate::models::TaskDependency;

pub fn add_dependency(conn: &Connection, task_id: &str, dependency_id: &str) -> Result<(), CoordError> {
    if task_id == dependency_id {
        return Err(CoordError::validation(format!("Task '{task_id}' depends on itself")));
    }
    conn.execute(
        "INSERT OR IGNORE INTO task_dependencies (task_id, dependency_id) VALUES (?1, ?2)",
        params![task_id, dependency_id],
    )?;
    Ok(())
}

pub fn remove_dependency(conn: &Connection, task_id: &str, dependency_id: &str) -> Result<(), CoordError> {
    conn.execute(
        "DELETE FROM task_dependencies WHERE task_id = ?1 AND dependency_id = ?2",
        params![task_id, dependency_id],
    )?;
    Ok(())
}

/// Declared prerequisites of a task.
pub fn get_dependencies(conn: &Connection, task_id: &str) -> Result<Vec<String>, CoordError> {
    let mut stmt = conn.prepare(
        "SELECT dependency_id FROM task_dependencies WHERE task_id = ?1 ORDER BY dependency_id",
    )?;
    let deps = stmt
        .query_map(params![task_id], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(deps)
}

/// All dependency edges declared by tasks of a project.
pub fn get_all_dependencies_for_project(
    conn: &Connection,
    project_id: &str,
) -> Result<Vec<TaskDependency>, CoordError> {
    let mut stmt = conn.prepare(
        "SELECT td.task_id, td.dependency_id
         FROM task_dependencies td
         JOIN tasks t ON td.task_id = t.id
         WHERE t.project_id = ?1
         ORDER BY td.task_id, td.dependency_id",
    )?;
    let deps = stmt
        .query_map(params![project_id], |row| {
            Ok(TaskDependency {
                task_id: row.get(0)?,
                dependency_id: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(deps)
}
