use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use crate::cli::commands::{DepCommands, TaskCommands};
use crate::cli::{finish, print_success, resolve_project, Globals, EXIT_OK};
use crate::db::task_repo::{DateUpdate, NewTask};
use crate::db::{connection, dependency_repo, project_repo, snapshot, task_repo, trade_repo};
use crate::error::CoordError;
use crate::graph;
use crate::models::{Task, TaskStatus, Trade};
use crate::output;

pub fn run(cmd: TaskCommands, globals: &Globals) -> i32 {
    let json_output = globals.json;
    let project_flag = globals.project.as_deref();
    let result = match cmd {
        TaskCommands::Add { name, trade, start, end, status, after } => run_add(
            &name,
            trade.as_deref(),
            DateUpdate {
                planned_start: start,
                planned_end: end,
                ..Default::default()
            },
            &status,
            &after,
            json_output,
            project_flag,
        ),
        TaskCommands::List => run_list(json_output, project_flag),
        TaskCommands::Show { id } => run_show(&id, json_output, project_flag),
        TaskCommands::Status { id, status } => run_status(&id, &status, json_output, project_flag),
        TaskCommands::Dates { id, start, end, actual_start, actual_end } => run_dates(
            &id,
            &DateUpdate {
                planned_start: start,
                planned_end: end,
                actual_start,
                actual_end,
            },
            json_output,
            project_flag,
        ),
        TaskCommands::Dep(dep_cmd) => run_dep(dep_cmd, json_output, project_flag),
    };
    finish(result, json_output)
}

fn parse_status(raw: &str) -> Result<TaskStatus, CoordError> {
    TaskStatus::from_str(raw).ok_or_else(|| {
        CoordError::validation(format!(
            "Unknown status '{raw}' (expected planned, in_progress, completed or delayed)"
        ))
    })
}

fn trade_of(conn: &rusqlite::Connection, task: &Task) -> Result<Option<Trade>, CoordError> {
    task.trade_id
        .as_deref()
        .map(|id| trade_repo::get_trade_by_id(conn, id))
        .transpose()
}

fn run_add(
    name: &str,
    trade_ref: Option<&str>,
    dates: DateUpdate,
    status: &str,
    after: &[String],
    json_output: bool,
    project_flag: Option<&str>,
) -> Result<i32, CoordError> {
    let status = parse_status(status)?;
    let conn = connection::open_db()?;
    let project = resolve_project(&conn, project_flag)?;

    // Resolve every reference before any write.
    let trade = trade_ref
        .map(|r| trade_repo::resolve_trade(&conn, &project.id, r))
        .transpose()?;
    let mut resolved_deps = Vec::new();
    for dep_ref in after {
        resolved_deps.push(task_repo::resolve_task(&conn, &project.id, dep_ref)?);
    }

    let task_id = ulid::Ulid::new().to_string();
    let sort_order = task_repo::next_sort_order(&conn, &project.id)?;

    conn.execute_batch("BEGIN IMMEDIATE")?;
    let result = (|| -> Result<_, CoordError> {
        task_repo::create_task(
            &conn,
            &NewTask {
                id: &task_id,
                project_id: &project.id,
                name: Some(name),
                trade_id: trade.as_ref().map(|t| t.id.as_str()),
                planned_start: dates.planned_start,
                planned_end: dates.planned_end,
                actual_start: None,
                actual_end: None,
                status,
                sort_order,
            },
        )?;
        for dep in &resolved_deps {
            dependency_repo::add_dependency(&conn, &task_id, &dep.id)?;
        }
        project_repo::touch_project(&conn, &project.id)?;
        Ok(())
    })();

    match result {
        Ok(()) => conn.execute_batch("COMMIT")?,
        Err(e) => {
            let _ = conn.execute_batch("ROLLBACK");
            return Err(e);
        }
    }

    let task = task_repo::get_task_by_id(&conn, &task_id)?;
    if json_output {
        print_success(json!({
            "task": output::json::task_detail(&task, trade.as_ref())
        }));
    } else {
        println!("Added task: {} ({})", task.display_name(), task.id);
    }
    Ok(EXIT_OK)
}

fn run_list(json_output: bool, project_flag: Option<&str>) -> Result<i32, CoordError> {
    let conn = connection::open_db()?;
    let project = resolve_project(&conn, project_flag)?;
    let tasks = task_repo::list_tasks_by_project(&conn, &project.id)?;
    let trade_names: BTreeMap<String, String> = trade_repo::list_trades_by_project(&conn, &project.id)?
        .into_iter()
        .map(|t| (t.id, t.name))
        .collect();

    if json_output {
        let tasks_json: Vec<_> = tasks
            .iter()
            .map(|t| {
                let trade = t.trade_id.as_ref().and_then(|id| trade_names.get(id));
                output::json::task_summary(t, trade.map(String::as_str))
            })
            .collect();
        print_success(json!({ "tasks": tasks_json }));
    } else {
        output::text::print_task_list(&tasks, &trade_names);
    }
    Ok(EXIT_OK)
}

fn run_show(id: &str, json_output: bool, project_flag: Option<&str>) -> Result<i32, CoordError> {
    let conn = connection::open_db()?;
    let project = resolve_project(&conn, project_flag)?;
    let task = task_repo::resolve_task(&conn, &project.id, id)?;
    let trade = trade_of(&conn, &task)?;

    let set = snapshot::load_task_set(&conn, &project)?;
    let dependents = graph::build_dependents(set.tasks());
    let downstream = graph::transitive_dependents(&dependents, &task.id);

    let deps: Vec<Task> = task
        .depends_on
        .iter()
        .filter_map(|d| set.task(d).cloned())
        .collect();
    let downstream_tasks: Vec<Task> = downstream
        .iter()
        .filter_map(|d| set.task(d).cloned())
        .collect();

    if json_output {
        let summary = |t: &Task| output::json::task_summary(t, set.trade_name_of(t));
        print_success(json!({
            "task": output::json::task_detail(&task, trade.as_ref()),
            "dependencies": deps.iter().map(summary).collect::<Vec<_>>(),
            "downstream": downstream_tasks.iter().map(summary).collect::<Vec<_>>()
        }));
    } else {
        output::text::print_task(&task, trade.as_ref());
        if !deps.is_empty() {
            println!("\nDependencies:");
            for d in &deps {
                println!("  [{}] {} ({})", d.status.as_str(), d.display_name(), d.id);
            }
        }
        if !downstream_tasks.is_empty() {
            println!("\nDownstream:");
            for d in &downstream_tasks {
                println!("  [{}] {} ({})", d.status.as_str(), d.display_name(), d.id);
            }
        }
    }
    Ok(EXIT_OK)
}

fn run_status(id: &str, status: &str, json_output: bool, project_flag: Option<&str>) -> Result<i32, CoordError> {
    let status = parse_status(status)?;
    let conn = connection::open_db()?;
    let project = resolve_project(&conn, project_flag)?;
    let task = task_repo::resolve_task(&conn, &project.id, id)?;

    task_repo::update_task_status(&conn, &task.id, status)?;
    project_repo::touch_project(&conn, &project.id)?;

    if json_output {
        print_success(json!({
            "task": { "id": task.id, "status": status.as_str(), "previous": task.status.as_str() }
        }));
    } else {
        println!(
            "Task {} ({}): {} → {}",
            task.display_name(),
            task.id,
            task.status.as_str(),
            status.as_str()
        );
    }
    Ok(EXIT_OK)
}

fn run_dates(id: &str, dates: &DateUpdate, json_output: bool, project_flag: Option<&str>) -> Result<i32, CoordError> {
    if dates.is_empty() {
        return Err(CoordError::validation(
            "Nothing to change: pass --start, --end, --actual-start or --actual-end",
        ));
    }
    let conn = connection::open_db()?;
    let project = resolve_project(&conn, project_flag)?;
    let task = task_repo::resolve_task(&conn, &project.id, id)?;

    task_repo::update_task_dates(&conn, &task.id, dates)?;
    project_repo::touch_project(&conn, &project.id)?;
    let task = task_repo::get_task_by_id(&conn, &task.id)?;

    if json_output {
        let trade = trade_of(&conn, &task)?;
        print_success(json!({
            "task": output::json::task_detail(&task, trade.as_ref())
        }));
    } else {
        println!("Updated dates for {} ({})", task.display_name(), task.id);
    }
    Ok(EXIT_OK)
}

fn run_dep(cmd: DepCommands, json_output: bool, project_flag: Option<&str>) -> Result<i32, CoordError> {
    let conn = connection::open_db()?;
    let project = resolve_project(&conn, project_flag)?;

    let (adding, id, dep_id) = match cmd {
        DepCommands::Add { id, dep_id } => (true, id, dep_id),
        DepCommands::Remove { id, dep_id } => (false, id, dep_id),
    };
    let task = task_repo::resolve_task(&conn, &project.id, &id)?;
    let dep = task_repo::resolve_task(&conn, &project.id, &dep_id)?;

    let action = if adding {
        dependency_repo::add_dependency(&conn, &task.id, &dep.id)?;
        "added"
    } else {
        dependency_repo::remove_dependency(&conn, &task.id, &dep.id)?;
        "removed"
    };
    project_repo::touch_project(&conn, &project.id)?;

    if json_output {
        let mut data = Map::new();
        data.insert(
            action.to_string(),
            json!({ "task_id": task.id, "dependency_id": dep.id }),
        );
        print_success(Value::Object(data));
    } else {
        println!(
            "Dependency {action}: {} after {}",
            task.display_name(),
            dep.display_name()
        );
    }
    Ok(EXIT_OK)
}
