use serde_json::json;

use crate::cli::{finish, print_success, Globals, EXIT_OK};
use crate::db::connection;
use crate::error::CoordError;

pub fn run(globals: &Globals) -> i32 {
    finish(run_init(globals.json), globals.json)
}

fn run_init(json_output: bool) -> Result<i32, CoordError> {
    let path = connection::init_db()?;
    if json_output {
        print_success(json!({ "path": path.to_string_lossy() }));
    } else {
        println!("Initialized coordai at {}", path.display());
    }
    Ok(EXIT_OK)
}
