use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::error::{CoordError, ErrorCode};

use super::migrations;

const DATA_DIR: &str = ".coordai";

/// Find the .git root by walking up from current directory.
pub fn find_git_root() -> Result<PathBuf, CoordError> {
    let mut dir = env::current_dir().map_err(|e| CoordError::database(e.to_string()))?;
    loop {
        if dir.join(".git").exists() {
            return Ok(dir);
        }
        if !dir.pop() {
            return Err(CoordError::new(
                ErrorCode::NotInitialized,
                "Not inside a git repository. coordai keeps its store at the repository root.",
            ));
        }
    }
}

pub fn data_dir() -> Result<PathBuf, CoordError> {
    Ok(find_git_root()?.join(DATA_DIR))
}

pub fn db_path() -> Result<PathBuf, CoordError> {
    Ok(data_dir()?.join("coordai.db"))
}

pub fn config_path() -> Result<PathBuf, CoordError> {
    Ok(data_dir()?.join("config.json"))
}

/// Open the store. Returns error if not initialized.
pub fn open_db() -> Result<Connection, CoordError> {
    let path = db_path()?;
    if !path.exists() {
        return Err(CoordError::not_initialized());
    }
    open_at(&path)
}

/// Create the data directory and database, and run migrations.
pub fn init_db() -> Result<PathBuf, CoordError> {
    let path = db_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| CoordError::database(e.to_string()))?;
    }
    let conn = open_at(&path)?;
    migrations::run_migrations(&conn)?;
    Ok(path)
}

fn open_at(path: &Path) -> Result<Connection, CoordError> {
    let conn = Connection::open(path)?;
    configure_connection(&conn)?;
    Ok(conn)
}

pub fn configure_connection(conn: &Connection) -> Result<(), CoordError> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA busy_timeout=5000;
         PRAGMA foreign_keys=ON;",
    )?;
    Ok(())
}

/// In-memory store with the full schema, for tests.
#[cfg(test)]
pub fn open_in_memory() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
    migrations::run_migrations(&conn).unwrap();
    conn
}
