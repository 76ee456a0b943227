pub mod connection;
pub mod migrations;
pub mod project_repo;
pub mod trade_repo;
pub mod task_repo;
pub mod dependency_repo;
pub mod snapshot;
pub mod run_guard;

pub use connection::*;

/// Escape `%`, `_` and `\` so user input matches literally inside a
/// `LIKE ... ESCAPE '\'` pattern.
pub fn like_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
