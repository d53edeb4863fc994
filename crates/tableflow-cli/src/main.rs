mod commands;
mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tableflow",
    version,
    about = "Run table functions between source and destination plugins"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a function once
    Run {
        /// Path to function YAML file
        function: PathBuf,
        /// Print a machine-readable JSON summary after the run
        #[arg(long)]
        json: bool,
    },
    /// Validate function configuration without running it
    Check {
        /// Path to function YAML file
        function: PathBuf,
    },
    /// Inspect or reset a function's checkpoint
    Checkpoint {
        #[command(subcommand)]
        action: CheckpointAction,
    },
}

#[derive(Subcommand)]
enum CheckpointAction {
    /// Print the persisted checkpoint
    Show {
        /// Path to function YAML file
        function: PathBuf,
    },
    /// Delete the persisted checkpoint
    Reset {
        /// Path to function YAML file
        function: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init(&cli.log_level);

    match cli.command {
        Commands::Run { function, json } => commands::run::execute(&function, json),
        Commands::Check { function } => commands::check::execute(&function),
        Commands::Checkpoint { action } => match action {
            CheckpointAction::Show { function } => commands::checkpoint::show(&function),
            CheckpointAction::Reset { function } => commands::checkpoint::reset(&function),
        },
    }
}
