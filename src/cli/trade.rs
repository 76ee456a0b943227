use serde_json::json;

use crate::cli::commands::TradeCommands;
use crate::cli::{finish, print_success, resolve_project, Globals, EXIT_OK};
use crate::db::{connection, project_repo, trade_repo};
use crate::error::CoordError;
use crate::output;

pub fn run(cmd: TradeCommands, globals: &Globals) -> i32 {
    let project_flag = globals.project.as_deref();
    let result = match cmd {
        TradeCommands::Add { name } => run_add(&name, globals.json, project_flag),
        TradeCommands::List => run_list(globals.json, project_flag),
    };
    finish(result, globals.json)
}

fn run_add(name: &str, json_output: bool, project_flag: Option<&str>) -> Result<i32, CoordError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoordError::validation("Trade name is required"));
    }
    let conn = connection::open_db()?;
    let project = resolve_project(&conn, project_flag)?;

    let id = ulid::Ulid::new().to_string();
    let trade = trade_repo::create_trade(&conn, &id, &project.id, name)?;
    project_repo::touch_project(&conn, &project.id)?;

    if json_output {
        print_success(json!({ "trade": output::json::trade_json(&trade) }));
    } else {
        println!("Added trade: {} ({})", trade.name, trade.id);
    }
    Ok(EXIT_OK)
}

fn run_list(json_output: bool, project_flag: Option<&str>) -> Result<i32, CoordError> {
    let conn = connection::open_db()?;
    let project = resolve_project(&conn, project_flag)?;
    let trades = trade_repo::list_trades_by_project(&conn, &project.id)?;

    if json_output {
        let trades_json: Vec<_> = trades.iter().map(output::json::trade_json).collect();
        print_success(json!({ "trades": trades_json }));
    } else {
        output::text::print_trade_list(&trades);
    }
    Ok(EXIT_OK)
}
