use std::env;

use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::analysis::{self, downstream_impact, AnalysisOptions};
use crate::cli::{finish, print_success, read_stdin, resolve_project, Globals, EXIT_FINDINGS, EXIT_OK};
use crate::config::{self, Config, LOOKBACK_ENV};
use crate::db::run_guard::RunGuard;
use crate::db::{connection, snapshot};
use crate::error::CoordError;
use crate::models::{TaskRecord, TaskSet, TradeRecord};
use crate::output;

/// Project snapshot piped in on stdin. Only `tasks` is required.
#[derive(Deserialize)]
pub(crate) struct SnapshotInput {
    #[serde(default, alias = "project_name")]
    name: Option<String>,
    #[serde(default)]
    trades: Vec<TradeRecord>,
    tasks: Vec<TaskRecord>,
}

pub(crate) fn parse_snapshot(input: &str) -> Result<TaskSet, CoordError> {
    let snapshot: SnapshotInput = serde_json::from_str(input)?;
    let name = snapshot.name.unwrap_or_else(|| "stdin".to_string());
    Ok(TaskSet::from_records(name, snapshot.trades, snapshot.tasks))
}

pub(crate) fn analysis_options(globals: &Globals) -> Result<AnalysisOptions, CoordError> {
    let env_value = env::var(LOOKBACK_ENV).ok();
    let lookback_days =
        config::resolve_lookback_days(globals.lookback_days, env_value.as_deref(), &Config::load()?)?;
    Ok(AnalysisOptions { lookback_days })
}

pub fn run(stdin: bool, globals: &Globals) -> i32 {
    finish(run_analyze(stdin, globals), globals.json)
}

fn run_analyze(stdin: bool, globals: &Globals) -> Result<i32, CoordError> {
    let options = analysis_options(globals)?;

    if stdin {
        let set = parse_snapshot(&read_stdin()?)?;
        return report_findings(&set, &options, globals.json);
    }

    let conn = connection::open_db()?;
    let project = resolve_project(&conn, globals.project.as_deref())?;
    let _guard = RunGuard::acquire(&conn, &project.id)?;
    let set = snapshot::load_task_set(&conn, &project)?;
    report_findings(&set, &options, globals.json)
}

fn report_findings(set: &TaskSet, options: &AnalysisOptions, json_output: bool) -> Result<i32, CoordError> {
    let findings = analysis::analyze(set, options);
    let impact = downstream_impact(set, &findings.conflicts);
    info!(
        project = set.project_name(),
        confirmed = findings.confirmed_count(),
        suggestions = findings.missing_dependencies.len(),
        "analysis finished"
    );

    if json_output {
        print_success(json!({
            "project": set.project_name(),
            "lookback_days": options.lookback_days,
            "task_count": set.len(),
            "skipped": output::json::skipped_json(set.ingest_report()),
            "overlaps": output::json::to_value(&findings.overlaps),
            "conflicts": output::json::to_value(&findings.conflicts),
            "missing_dependencies": output::json::to_value(&findings.missing_dependencies),
            "findings": output::json::to_value(&findings.tagged()),
            "confirmed_count": findings.confirmed_count(),
            "downstream_impact": impact
        }));
    } else {
        println!(
            "Analysis of '{}' ({} tasks, lookback {} days):",
            set.project_name(),
            set.len(),
            options.lookback_days
        );
        output::text::print_skipped(set.ingest_report());
        output::text::print_findings(&findings, &impact);
    }

    if findings.confirmed_count() > 0 {
        Ok(EXIT_FINDINGS)
    } else {
        Ok(EXIT_OK)
    }
}
