pub mod analyze;
pub mod commands;
pub mod config;
pub mod init;
pub mod project;
pub mod report;
pub mod task;
pub mod trade;

pub use commands::*;

use std::io::{self, Read};

use rusqlite::Connection;
use serde_json::Value;

use crate::config::Config;
use crate::db::project_repo;
use crate::error::CoordError;
use crate::models::Project;
use crate::output;

/// Flags shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct Globals {
    pub json: bool,
    pub project: Option<String>,
    pub lookback_days: Option<i64>,
}

/// Exit code: success.
pub const EXIT_OK: i32 = 0;
/// Exit code: any error.
pub const EXIT_ERROR: i32 = 1;
/// Exit code: analysis reported confirmed findings.
pub const EXIT_FINDINGS: i32 = 2;

/// Print an error in the requested format and map the result to an exit code.
pub fn finish(result: Result<i32, CoordError>, json_output: bool) -> i32 {
    match result {
        Ok(code) => code,
        Err(e) => {
            if json_output {
                print_json(&output::json::error(&e));
            } else {
                eprintln!("Error: {}", e.message);
            }
            EXIT_ERROR
        }
    }
}

pub fn print_json(value: &Value) {
    println!("{value:#}");
}

pub fn print_success(data: Value) {
    print_json(&output::json::success(data));
}

pub fn read_stdin() -> Result<String, CoordError> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| CoordError::validation(format!("Failed to read stdin: {e}")))?;
    Ok(input)
}

/// `--project` wins over the active project in config.
pub fn resolve_project(conn: &Connection, project_flag: Option<&str>) -> Result<Project, CoordError> {
    if let Some(reference) = project_flag {
        return project_repo::resolve_project(conn, reference);
    }
    let active = Config::load()?
        .active_project_id
        .ok_or_else(CoordError::no_active_project)?;
    project_repo::get_project_by_id(conn, &active).map_err(|e| match e.code {
        crate::error::ErrorCode::ProjectNotFound => CoordError::no_active_project(),
        _ => e,
    })
}

/// Project names are slugs: lowercase alphanumerics and inner hyphens.
pub fn validate_project_name(name: &str) -> Result<(), CoordError> {
    let bytes = name.as_bytes();
    let slug_char = |c: &u8| c.is_ascii_lowercase() || c.is_ascii_digit();
    let valid = match (bytes.first(), bytes.last()) {
        (Some(first), Some(last)) => {
            slug_char(first) && slug_char(last) && bytes.iter().all(|c| slug_char(c) || *c == b'-')
        }
        _ => false,
    };
    if !valid {
        return Err(CoordError::validation(
            "Project name must match ^[a-z0-9][a-z0-9-]*[a-z0-9]$ (or single char [a-z0-9])",
        ));
    }
    Ok(())
}
