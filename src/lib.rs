//! Schedule coordination for construction projects.
//!
//! Given a project's tasks (each attributed to a trade and optionally
//! depending on other tasks), `coordai` reports inter-trade timing overlaps,
//! tasks planned to start before their prerequisites finish, and likely
//! undeclared hand-offs between adjacent tasks. The [`analysis`] module is a
//! pure library over an in-memory [`models::TaskSet`]; [`db`] and [`cli`] are
//! the SQLite store and command-line front end around it.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod graph;
pub mod logging;
pub mod models;
pub mod output;
