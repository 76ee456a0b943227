use chrono::NaiveDate;
use clap::{Parser, Subcommand};

const VERSION: &str = env!("COORDAI_VERSION");

#[derive(Parser)]
#[command(
    name = "coordai",
    version = VERSION,
    about = "Schedule coordination and conflict detection for construction projects",
    after_help = "\
NOTE:
  Requires a git repository. The store lives at <git-root>/.coordai/coordai.db
  Run `coordai init` before any other command (except `analyze --stdin` and `report --stdin`).

EXIT CODES:
  0  Success (for `analyze`: no confirmed findings)
  1  Error (DB, validation, unknown reference, analysis already running, etc.)
  2  `analyze` found trade overlaps or dependency conflicts

FINDINGS:
  Overlaps and dependency conflicts are confirmed problems.
  Missing-dependency candidates are suggestions only and never change the exit code.

LOOKBACK WINDOW:
  --lookback-days, then COORDAI_LOOKBACK_DAYS, then `config set-lookback`, then 5 days.

LOGGING:
  Diagnostics go to stderr. Set COORDAI_LOG (e.g. `debug`, `coordai=trace`) to change the level."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Specify project by name or ID
    #[arg(long, global = true)]
    pub project: Option<String>,

    /// Days a predecessor may end before a task starts and still be suggested
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub lookback_days: Option<i64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize coordai in this repository
    Init,

    /// Project management
    #[command(subcommand)]
    Project(ProjectCommands),

    /// Trade management for the active project
    #[command(subcommand)]
    Trade(TradeCommands),

    /// Task management for the active project
    #[command(subcommand)]
    Task(TaskCommands),

    /// Detect trade overlaps, dependency conflicts and missing dependencies
    #[command(after_help = "\
NOTE:
  Reads the active project from the store, or a snapshot from stdin with --stdin.
  Only one analysis per project runs at a time; a concurrent run fails with ANALYSIS_IN_PROGRESS.

STDIN FORMAT:
  {\"name\":\"...\", \"trades\":[{\"id\":\"...\",\"name\":\"...\"}],
   \"tasks\":[{\"id\":\"...\", \"trade\":\"...\", \"planned_start\":\"YYYY-MM-DD\",
              \"planned_end\":\"YYYY-MM-DD\", \"status\":\"planned\", \"after\":[...]}]}
  Malformed task or trade records are skipped and counted, not fatal.")]
    Analyze {
        /// Read the snapshot from stdin instead of the store
        #[arg(long)]
        stdin: bool,
    },

    /// Coordination report: tasks grouped by trade with status counts
    #[command(after_help = "\
NOTE:
  A project that cannot be resolved (unknown --project, no or stale active project,
  or empty stdin) yields `data: null` with exit code 0.
  Dates are shown as DD/MM/YYYY.")]
    Report {
        /// Read the snapshot from stdin instead of the store
        #[arg(long)]
        stdin: bool,
        /// Include analysis findings in the report
        #[arg(long)]
        with_findings: bool,
    },

    /// Show or change settings
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum ProjectCommands {
    /// Create a new project
    Create {
        /// Project name (slug: lowercase alphanumeric with hyphens)
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// List all projects
    List,
    /// Show project details
    Show {
        /// Project name or ID
        reference: String,
    },
    /// Set active project
    Activate {
        /// Project name
        name: String,
    },
    /// Delete a project with its trades and tasks
    Delete {
        /// Project name or ID
        reference: String,
    },
    /// Load a project from stdin JSON
    #[command(after_help = "\
STDIN FORMAT:
  {\"name\":\"slug\", \"description\":\"...\",
   \"trades\":[{\"id\":\"plb\", \"name\":\"Plomberie\"}],
   \"tasks\":[{\"id\":\"t1\", \"name\":\"...\", \"trade\":\"plb\", \"planned_start\":\"2024-01-08\",
              \"planned_end\":\"2024-01-20\", \"status\":\"planned\", \"after\":[...]}]}

NOTE:
  Atomic: all-or-nothing. Validates duplicate IDs, self-dependencies, unknown refs, dates and statuses.
  Dependency cycles are accepted; each edge is analysed on its own.
  Project name must be unique. Existing name → error (no overwrite).
  Auto-activates if no valid active project exists.")]
    Load,
}

#[derive(Subcommand)]
pub enum TradeCommands {
    /// Add a trade to the active project
    Add {
        /// Trade name, e.g. Plomberie
        name: String,
    },
    /// List trades in the active project
    List,
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Add a task to the active project
    Add {
        /// Task name
        name: String,
        /// Trade name or ID
        #[arg(long)]
        trade: Option<String>,
        /// Planned start (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Planned end (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,
        /// planned | in_progress | completed | delayed
        #[arg(long, default_value = "planned")]
        status: String,
        /// Add dependency: task runs after this task ID
        #[arg(long)]
        after: Vec<String>,
    },
    /// List tasks in the active project
    List,
    /// Show task details, prerequisites and everything downstream of it
    Show {
        /// Task ID or prefix
        id: String,
    },
    /// Set task status
    Status {
        id: String,
        /// planned | in_progress | completed | delayed
        status: String,
    },
    /// Change planned or actual dates
    Dates {
        id: String,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long)]
        actual_start: Option<NaiveDate>,
        #[arg(long)]
        actual_end: Option<NaiveDate>,
    },
    /// Manage task dependencies
    #[command(subcommand)]
    Dep(DepCommands),
}

#[derive(Subcommand)]
pub enum DepCommands {
    /// Add a dependency
    Add {
        /// Task ID
        id: String,
        /// Dependency task ID
        dep_id: String,
    },
    /// Remove a dependency
    Remove {
        /// Task ID
        id: String,
        /// Dependency task ID
        dep_id: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show stored settings and the effective lookback window
    Show,
    /// Persist the missing-dependency lookback window
    SetLookback {
        /// Days (0 or more)
        #[arg(allow_negative_numbers = true)]
        days: i64,
    },
}
