use chrono::Local;
use tracing::debug;

use crate::analysis::{self, assemble_report};
use crate::cli::analyze::{analysis_options, parse_snapshot};
use crate::cli::{finish, print_success, read_stdin, resolve_project, Globals, EXIT_OK};
use crate::db::run_guard::RunGuard;
use crate::db::{connection, snapshot};
use crate::error::{CoordError, ErrorCode};
use crate::models::TaskSet;
use crate::output;

pub fn run(stdin: bool, with_findings: bool, globals: &Globals) -> i32 {
    finish(run_report(stdin, with_findings, globals), globals.json)
}

fn run_report(stdin: bool, with_findings: bool, globals: &Globals) -> Result<i32, CoordError> {
    if stdin {
        let input = read_stdin()?;
        let set = if input.trim().is_empty() {
            None
        } else {
            Some(parse_snapshot(&input)?)
        };
        return print_report(set.as_ref(), with_findings, globals);
    }

    let conn = connection::open_db()?;
    let project = match resolve_project(&conn, globals.project.as_deref()) {
        Ok(project) => project,
        Err(e) if matches!(e.code, ErrorCode::ProjectNotFound | ErrorCode::NoActiveProject) => {
            debug!(reason = %e.message, "no project to report on");
            return print_report(None, with_findings, globals);
        }
        Err(e) => return Err(e),
    };
    let _guard = if with_findings {
        Some(RunGuard::acquire(&conn, &project.id)?)
    } else {
        None
    };
    let set = snapshot::load_task_set(&conn, &project)?;
    print_report(Some(&set), with_findings, globals)
}

fn print_report(set: Option<&TaskSet>, with_findings: bool, globals: &Globals) -> Result<i32, CoordError> {
    let findings = match (set, with_findings) {
        (Some(set), true) => Some(analysis::analyze(set, &analysis_options(globals)?)),
        _ => None,
    };
    let report = assemble_report(set, findings.as_ref(), Local::now().date_naive());

    if globals.json {
        print_success(output::json::to_value(&report));
    } else {
        match report {
            Some(ref report) => output::text::print_report(report),
            None => println!("No data for this project."),
        }
    }
    Ok(EXIT_OK)
}
