use std::env;

use serde_json::json;

use crate::cli::analyze::analysis_options;
use crate::cli::commands::ConfigCommands;
use crate::cli::{finish, print_success, Globals, EXIT_OK};
use crate::config::{validate_lookback_days, Config, LOOKBACK_ENV};
use crate::db::connection;
use crate::error::CoordError;

pub fn run(cmd: ConfigCommands, globals: &Globals) -> i32 {
    let result = match cmd {
        ConfigCommands::Show => run_show(globals),
        ConfigCommands::SetLookback { days } => run_set_lookback(days, globals.json),
    };
    finish(result, globals.json)
}

fn run_show(globals: &Globals) -> Result<i32, CoordError> {
    let config = Config::load()?;
    let effective = analysis_options(globals)?.lookback_days;
    let env_value = env::var(LOOKBACK_ENV).ok();

    if globals.json {
        print_success(json!({
            "active_project_id": config.active_project_id,
            "lookback_days": config.lookback_days,
            "lookback_env": env_value,
            "effective_lookback_days": effective
        }));
    } else {
        println!(
            "Active project: {}",
            config.active_project_id.as_deref().unwrap_or("(none)")
        );
        match config.lookback_days {
            Some(days) => println!("Lookback days (stored): {days}"),
            None => println!("Lookback days (stored): (default)"),
        }
        if let Some(ref raw) = env_value {
            println!("{LOOKBACK_ENV}: {raw}");
        }
        println!("Effective lookback days: {effective}");
    }
    Ok(EXIT_OK)
}

fn run_set_lookback(days: i64, json_output: bool) -> Result<i32, CoordError> {
    let days = validate_lookback_days(days)?;
    // Settings live next to the store; refuse before `init`.
    connection::open_db()?;

    let mut config = Config::load()?;
    config.lookback_days = Some(days);
    config.save()?;

    if json_output {
        print_success(json!({ "lookback_days": days }));
    } else {
        println!("Lookback window set to {days} days");
    }
    Ok(EXIT_OK)
}
