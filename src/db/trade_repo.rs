use rusqlite::{params, Connection};

use crate::db::like_escape;
use crate::error::CoordError;
use crate::models::Trade;

pub fn create_trade(conn: &Connection, id: &str, project_id: &str, name: &str) -> Result<Trade, CoordError> {
    conn.execute(
        "INSERT INTO trades (id, project_id, name) VALUES (?1, ?2, ?3)",
        params![id, project_id, name],
    )?;
    Ok(Trade {
        id: id.to_string(),
        name: name.to_string(),
    })
}

pub fn get_trade_by_id(conn: &Connection, id: &str) -> Result<Trade, CoordError> {
    conn.query_row("SELECT id, name FROM trades WHERE id = ?1", params![id], row_to_trade)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => CoordError::trade_not_found(id),
            _ => CoordError::from(e),
        })
}

pub fn list_trades_by_project(conn: &Connection, project_id: &str) -> Result<Vec<Trade>, CoordError> {
    let mut stmt = conn.prepare("SELECT id, name FROM trades WHERE project_id = ?1 ORDER BY name ASC, id ASC")?;
    let trades = stmt
        .query_map(params![project_id], row_to_trade)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(trades)
}

/// Resolve a trade within a project: exact name (case-insensitive) → id prefix.
pub fn resolve_trade(conn: &Connection, project_id: &str, reference: &str) -> Result<Trade, CoordError> {
    let mut stmt = conn.prepare(
        "SELECT id, name FROM trades WHERE project_id = ?1 AND name = ?2 COLLATE NOCASE",
    )?;
    let by_name = stmt
        .query_map(params![project_id, reference], row_to_trade)?
        .collect::<Result<Vec<_>, _>>()?;

    let mut matches = if by_name.is_empty() {
        let mut stmt = conn.prepare("SELECT id, name FROM trades WHERE project_id = ?1 AND id LIKE ?2 ESCAPE '\\'")?;
        let prefix = format!("{}%", like_escape(reference));
        let by_prefix = stmt
            .query_map(params![project_id, prefix], row_to_trade)?
            .collect::<Result<Vec<_>, _>>()?;
        by_prefix
    } else {
        by_name
    };

    match matches.len() {
        0 => Err(CoordError::trade_not_found(reference)),
        1 => Ok(matches.remove(0)),
        _ => {
            let candidates: Vec<String> = matches.iter().map(|t| format!("{} ({})", t.name, t.id)).collect();
            Err(CoordError::ambiguous_ref(reference, &candidates))
        }
    }
}

fn row_to_trade(row: &rusqlite::Row) -> rusqlite::Result<Trade> {
    Ok(Trade {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::open_in_memory;
    use crate::db::project_repo;
    use crate::error::ErrorCode;

    #[test]
    fn test_resolve_trade_by_name_and_prefix() {
        let conn = open_in_memory();
        project_repo::create_project(&conn, "P1", "villa", None).unwrap();
        create_trade(&conn, "01PLB", "P1", "Plomberie").unwrap();
        create_trade(&conn, "01ELE", "P1", "Électricité").unwrap();

        assert_eq!(resolve_trade(&conn, "P1", "plomberie").unwrap().id, "01PLB");
        assert_eq!(resolve_trade(&conn, "P1", "01E").unwrap().name, "Électricité");
        assert_eq!(get_trade_by_id(&conn, "01PLB").unwrap().name, "Plomberie");
        assert_eq!(
            resolve_trade(&conn, "P1", "01").unwrap_err().code,
            ErrorCode::AmbiguousRef
        );
        assert_eq!(
            resolve_trade(&conn, "P1", "Peinture").unwrap_err().code,
            ErrorCode::TradeNotFound
        );
    }
}
