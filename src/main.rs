use clap::Parser;
use std::process;

use coordai::cli::commands::{Cli, Commands};
use coordai::cli::{self, Globals};
use coordai::logging;

fn main() {
    logging::init();

    let cli_args = Cli::parse();
    let globals = Globals {
        json: cli_args.json,
        project: cli_args.project.clone(),
        lookback_days: cli_args.lookback_days,
    };

    let exit_code = match cli_args.command {
        Commands::Init => cli::init::run(&globals),
        Commands::Project(cmd) => cli::project::run(cmd, &globals),
        Commands::Trade(cmd) => cli::trade::run(cmd, &globals),
        Commands::Task(cmd) => cli::task::run(cmd, &globals),
        Commands::Analyze { stdin } => cli::analyze::run(stdin, &globals),
        Commands::Report { stdin, with_findings } => cli::report::run(stdin, with_findings, &globals),
        Commands::Config(cmd) => cli::config::run(cmd, &globals),
    };

    process::exit(exit_code);
}
