use rusqlite::{params, Connection};
use tracing::{debug, warn};

use crate::error::CoordError;

/// Runs older than this are assumed to belong to a crashed process.
const STALE_AFTER_MINUTES: i64 = 30;

/// Marks an analysis run for one project as in flight. Only one guard per
/// project can exist across processes sharing the store; the mark is cleared
/// when the guard is dropped.
pub struct RunGuard<'a> {
    conn: &'a Connection,
    project_id: String,
}

impl<'a> RunGuard<'a> {
    pub fn acquire(conn: &'a Connection, project_id: &str) -> Result<Self, CoordError> {
        conn.execute_batch("BEGIN IMMEDIATE")?;
        let result = (|| -> Result<usize, CoordError> {
            let stale = conn.execute(
                "DELETE FROM analysis_runs
                 WHERE project_id = ?1 AND started_at < datetime('now', ?2)",
                params![project_id, format!("-{STALE_AFTER_MINUTES} minutes")],
            )?;
            if stale > 0 {
                warn!(project = project_id, "replacing stale analysis run marker");
            }
            Ok(conn.execute(
                "INSERT OR IGNORE INTO analysis_runs (project_id) VALUES (?1)",
                params![project_id],
            )?)
        })();

        match result {
            Ok(inserted) => {
                conn.execute_batch("COMMIT")?;
                if inserted == 0 {
                    return Err(CoordError::analysis_in_progress(project_id));
                }
                debug!(project = project_id, "analysis run started");
                Ok(Self {
                    conn,
                    project_id: project_id.to_string(),
                })
            }
            Err(e) => {
                let _ = conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.conn.execute(
            "DELETE FROM analysis_runs WHERE project_id = ?1",
            params![self.project_id],
        ) {
            warn!(project = %self.project_id, error = %e, "failed to clear analysis run marker");
        }
    }
}
