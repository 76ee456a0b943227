use rusqlite::{params, Connection};

use crate::db::like_escape;
use crate::error::CoordError;
use crate::models::Project;

const PROJECT_COLUMNS: &str = "id, name, description, created_at, updated_at";

pub fn create_project(
    conn: &Connection,
    id: &str,
    name: &str,
    description: Option<&str>,
) -> Result<Project, CoordError> {
    if find_project_by_name(conn, name)?.is_some() {
        return Err(CoordError::project_name_conflict(name));
    }

    conn.execute(
        "INSERT INTO projects (id, name, description) VALUES (?1, ?2, ?3)",
        params![id, name, description],
    )?;

    get_project_by_id(conn, id)
}

pub fn get_project_by_id(conn: &Connection, id: &str) -> Result<Project, CoordError> {
    conn.query_row(
        &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
        params![id],
        row_to_project,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => CoordError::project_not_found(id),
        _ => CoordError::from(e),
    })
}

pub fn find_project_by_name(conn: &Connection, name: &str) -> Result<Option<Project>, CoordError> {
    let mut stmt = conn.prepare(&format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE name = ?1"))?;
    let mut rows = stmt.query(params![name])?;
    match rows.next()? {
        Some(row) => Ok(Some(row_to_project(row)?)),
        None => Ok(None),
    }
}

/// Resolve a project reference: exact name → ULID prefix → name partial match.
pub fn resolve_project(conn: &Connection, reference: &str) -> Result<Project, CoordError> {
    if let Some(project) = find_project_by_name(conn, reference)? {
        return Ok(project);
    }

    let by_prefix = query_projects(
        conn,
        &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id LIKE ?1 ESCAPE '\\'"),
        &format!("{}%", like_escape(reference)),
    )?;
    if let Some(project) = single_or_ambiguous(reference, by_prefix)? {
        return Ok(project);
    }

    let by_name = query_projects(
        conn,
        &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE name LIKE ?1 ESCAPE '\\'"),
        &format!("%{}%", like_escape(reference)),
    )?;
    single_or_ambiguous(reference, by_name)?.ok_or_else(|| CoordError::project_not_found(reference))
}

pub fn list_projects(conn: &Connection) -> Result<Vec<Project>, CoordError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY created_at DESC, name ASC"
    ))?;
    let projects = stmt
        .query_map([], row_to_project)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(projects)
}

pub fn delete_project(conn: &Connection, id: &str) -> Result<(), CoordError> {
    let changed = conn.execute("DELETE FROM projects WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(CoordError::project_not_found(id));
    }
    Ok(())
}

pub fn touch_project(conn: &Connection, id: &str) -> Result<(), CoordError> {
    conn.execute(
        "UPDATE projects SET updated_at = datetime('now') WHERE id = ?1",
        params![id],
    )?;
    Ok(())
}

fn query_projects(conn: &Connection, sql: &str, pattern: &str) -> Result<Vec<Project>, CoordError> {
    let mut stmt = conn.prepare(sql)?;
    let projects = stmt
        .query_map(params![pattern], row_to_project)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(projects)
}

fn single_or_ambiguous(reference: &str, mut projects: Vec<Project>) -> Result<Option<Project>, CoordError> {
    match projects.len() {
        0 => Ok(None),
        1 => Ok(projects.pop()),
        _ => {
            let candidates: Vec<String> = projects.iter().map(|p| format!("{} ({})", p.name, p.id)).collect();
            Err(CoordError::ambiguous_ref(reference, &candidates))
        }
    }
}

fn row_to_project(row: &rusqlite::Row) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::open_in_memory;
    use crate::error::ErrorCode;

    #[test]
    fn test_resolve_by_name_prefix_and_partial() {
        let conn = open_in_memory();
        create_project(&conn, "01AAA", "villa-nice", None).unwrap();
        create_project(&conn, "01BBB", "ecole-lyon", Some("Extension")).unwrap();

        assert_eq!(resolve_project(&conn, "villa-nice").unwrap().id, "01AAA");
        assert_eq!(resolve_project(&conn, "01B").unwrap().name, "ecole-lyon");
        assert_eq!(resolve_project(&conn, "lyon").unwrap().id, "01BBB");

        let err = resolve_project(&conn, "01").unwrap_err();
        assert_eq!(err.code, ErrorCode::AmbiguousRef);
        let err = resolve_project(&conn, "marseille").unwrap_err();
        assert_eq!(err.code, ErrorCode::ProjectNotFound);
    }

    #[test]
    fn test_wildcards_in_reference_match_literally() {
        let conn = open_in_memory();
        create_project(&conn, "01AAA", "villa-nice", None).unwrap();
        create_project(&conn, "01BBB", "ecole-lyon", None).unwrap();

        for reference in ["%", "_", "0_", "%lyon"] {
            let err = resolve_project(&conn, reference).unwrap_err();
            assert_eq!(err.code, ErrorCode::ProjectNotFound, "{reference}");
        }
    }

    #[test]
    fn test_name_conflict() {
        let conn = open_in_memory();
        create_project(&conn, "01AAA", "villa", None).unwrap();
        let err = create_project(&conn, "01BBB", "villa", None).unwrap_err();
        assert_eq!(err.code, ErrorCode::ProjectNameConflict);
    }
}
