use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::cli::commands::ProjectCommands;
use crate::cli::{finish, print_success, read_stdin, validate_project_name, Globals, EXIT_OK};
use crate::config::Config;
use crate::db::task_repo::NewTask;
use crate::db::{connection, dependency_repo, project_repo, task_repo, trade_repo};
use crate::error::CoordError;
use crate::models::{TaskRecord, TaskSet, TradeRecord};
use crate::output;

pub fn run(cmd: ProjectCommands, globals: &Globals) -> i32 {
    let json_output = globals.json;
    let result = match cmd {
        ProjectCommands::Create { name, description } => run_create(&name, description.as_deref(), json_output),
        ProjectCommands::List => run_list(json_output),
        ProjectCommands::Show { reference } => run_show(&reference, json_output),
        ProjectCommands::Activate { name } => run_activate(&name, json_output),
        ProjectCommands::Delete { reference } => run_delete(&reference, json_output),
        ProjectCommands::Load => run_load(json_output),
    };
    finish(result, json_output)
}

fn run_create(name: &str, description: Option<&str>, json_output: bool) -> Result<i32, CoordError> {
    validate_project_name(name)?;
    let conn = connection::open_db()?;
    let id = ulid::Ulid::new().to_string();
    let project = project_repo::create_project(&conn, &id, name, description)?;

    if json_output {
        print_success(output::json::project_json(&project));
    } else {
        println!("Created project: {} ({})", project.name, project.id);
    }
    Ok(EXIT_OK)
}

fn run_list(json_output: bool) -> Result<i32, CoordError> {
    let conn = connection::open_db()?;
    let projects = project_repo::list_projects(&conn)?;
    let active_id = Config::load()?.active_project_id;

    if json_output {
        let projects_json: Vec<_> = projects
            .iter()
            .map(|p| {
                let mut v = output::json::project_json(p);
                if active_id.as_deref() == Some(p.id.as_str()) {
                    v["active"] = json!(true);
                }
                v
            })
            .collect();
        print_success(json!({ "projects": projects_json }));
    } else {
        output::text::print_project_list(&projects, active_id.as_deref());
    }
    Ok(EXIT_OK)
}

fn run_show(reference: &str, json_output: bool) -> Result<i32, CoordError> {
    let conn = connection::open_db()?;
    let project = project_repo::resolve_project(&conn, reference)?;
    let trades = trade_repo::list_trades_by_project(&conn, &project.id)?;
    let tasks = task_repo::list_tasks_by_project(&conn, &project.id)?;
    let trade_names: BTreeMap<String, String> =
        trades.iter().map(|t| (t.id.clone(), t.name.clone())).collect();

    if json_output {
        let trades_json: Vec<_> = trades.iter().map(output::json::trade_json).collect();
        let tasks_json: Vec<_> = tasks
            .iter()
            .map(|t| {
                let trade = t.trade_id.as_ref().and_then(|id| trade_names.get(id));
                output::json::task_summary(t, trade.map(String::as_str))
            })
            .collect();
        print_success(json!({
            "project": output::json::project_json(&project),
            "trades": trades_json,
            "tasks": tasks_json
        }));
    } else {
        output::text::print_project(&project);
        println!("\nTrades:");
        output::text::print_trade_list(&trades);
        println!("\nTasks:");
        output::text::print_task_list(&tasks, &trade_names);
    }
    Ok(EXIT_OK)
}

fn run_activate(name: &str, json_output: bool) -> Result<i32, CoordError> {
    let conn = connection::open_db()?;
    let project = project_repo::resolve_project(&conn, name)?;

    let mut config = Config::load()?;
    config.active_project_id = Some(project.id.clone());
    config.save()?;

    if json_output {
        print_success(json!({
            "activated": { "id": project.id, "name": project.name }
        }));
    } else {
        println!("Activated project: {} ({})", project.name, project.id);
    }
    Ok(EXIT_OK)
}

fn run_delete(reference: &str, json_output: bool) -> Result<i32, CoordError> {
    let conn = connection::open_db()?;
    let project = project_repo::resolve_project(&conn, reference)?;
    let mut config = Config::load()?;
    project_repo::delete_project(&conn, &project.id)?;

    if config.active_project_id.as_deref() == Some(project.id.as_str()) {
        config.active_project_id = None;
        config.save()?;
    }

    if json_output {
        print_success(json!({
            "deleted": { "id": project.id, "name": project.name }
        }));
    } else {
        println!("Deleted project: {} ({})", project.name, project.id);
    }
    Ok(EXIT_OK)
}

// --- project load ---

#[derive(Deserialize)]
struct ProjectLoadInput {
    name: String,
    description: Option<String>,
    #[serde(default)]
    trades: Vec<TradeRecord>,
    tasks: Vec<TaskRecord>,
}

fn run_load(json_output: bool) -> Result<i32, CoordError> {
    let input: ProjectLoadInput = serde_json::from_str(&read_stdin()?)?;

    validate_project_name(&input.name)?;
    let set = validate_load_input(&input)?;

    let conn = connection::open_db()?;
    let mut config = Config::load()?;
    if project_repo::find_project_by_name(&conn, &input.name)?.is_some() {
        return Err(CoordError::project_name_conflict(&input.name));
    }

    let project_id = ulid::Ulid::new().to_string();
    let mut trade_mapping: HashMap<String, String> = HashMap::new();
    let mut task_mapping: HashMap<String, String> = HashMap::new();

    conn.execute_batch("BEGIN IMMEDIATE")?;
    let result = (|| -> Result<_, CoordError> {
        project_repo::create_project(&conn, &project_id, &input.name, input.description.as_deref())?;

        for trade in set.trades() {
            let trade_id = ulid::Ulid::new().to_string();
            trade_repo::create_trade(&conn, &trade_id, &project_id, &trade.name)?;
            trade_mapping.insert(trade.id.clone(), trade_id);
        }

        // Input order becomes sort order.
        for (i, record) in input.tasks.iter().enumerate() {
            let Some(task) = record.id.as_deref().and_then(|id| set.task(id.trim())) else {
                continue;
            };
            let task_id = ulid::Ulid::new().to_string();
            let trade_id = task.trade_id.as_ref().map(|t| trade_mapping[t].as_str());
            task_repo::create_task(
                &conn,
                &NewTask {
                    id: &task_id,
                    project_id: &project_id,
                    name: task.name.as_deref(),
                    trade_id,
                    planned_start: task.planned_start,
                    planned_end: task.planned_end,
                    actual_start: task.actual_start,
                    actual_end: task.actual_end,
                    status: task.status,
                    sort_order: i as i32,
                },
            )?;
            task_mapping.insert(task.id.clone(), task_id);
        }

        for task in set.tasks() {
            let task_id = &task_mapping[&task.id];
            for dep in &task.depends_on {
                dependency_repo::add_dependency(&conn, task_id, &task_mapping[dep])?;
            }
        }
        Ok(())
    })();

    match result {
        Ok(()) => conn.execute_batch("COMMIT")?,
        Err(e) => {
            let _ = conn.execute_batch("ROLLBACK");
            return Err(e);
        }
    }
    info!(project = %input.name, tasks = set.len(), trades = set.trades().len(), "project loaded");

    let should_activate = match config.active_project_id {
        None => true,
        Some(ref id) => project_repo::get_project_by_id(&conn, id).is_err(),
    };
    if should_activate {
        config.active_project_id = Some(project_id.clone());
        config.save()?;
    }

    if json_output {
        let tasks_json: serde_json::Map<String, serde_json::Value> =
            task_mapping.iter().map(|(k, v)| (k.clone(), json!(v))).collect();
        let trades_json: serde_json::Map<String, serde_json::Value> =
            trade_mapping.iter().map(|(k, v)| (k.clone(), json!(v))).collect();
        print_success(json!({
            "project": { "name": input.name, "id": project_id },
            "trades_created": trade_mapping.len(),
            "tasks_created": task_mapping.len(),
            "activated": should_activate,
            "id_mapping": {
                "trades": trades_json,
                "tasks": tasks_json
            }
        }));
    } else {
        println!(
            "Loaded project '{}' with {} trades and {} tasks.",
            input.name,
            trade_mapping.len(),
            task_mapping.len()
        );
    }
    Ok(EXIT_OK)
}

/// Load is strict: any record the analysis would skip fails the whole load.
fn validate_load_input(input: &ProjectLoadInput) -> Result<TaskSet, CoordError> {
    let set = TaskSet::from_records(input.name.clone(), input.trades.clone(), input.tasks.clone());

    if let Some(skipped) = set.ingest_report().skipped.first() {
        return Err(CoordError::validation(format!(
            "{:?} #{} ({}): {}",
            skipped.kind,
            skipped.position,
            skipped.id.as_deref().unwrap_or("no id"),
            skipped.reason
        )));
    }

    let trade_ids: HashSet<&str> = set.trades().iter().map(|t| t.id.as_str()).collect();
    for task in set.tasks() {
        if let Some(ref trade) = task.trade_id {
            if !trade_ids.contains(trade.as_str()) {
                return Err(CoordError::validation(format!(
                    "Task '{}' references unknown trade '{}'",
                    task.id, trade
                )));
            }
        }
        for dep in &task.depends_on {
            if set.task(dep).is_none() {
                return Err(CoordError::validation(format!(
                    "Task '{}' references unknown dependency '{}'",
                    task.id, dep
                )));
            }
        }
    }
    Ok(set)
}
