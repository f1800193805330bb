//! Debug front-end CLI
//!
//! Inspects persisted front-end state, lists the command table and runs
//! YAML scenarios against the session layer.

use clap::Parser;
use debug_frontend::commands::Commands;
use debug_frontend::{cli, common::logging};

#[derive(Parser)]
#[command(name = "debug-frontend", about = "Debugger-agnostic debug front-end")]
#[command(version, long_about = None)]
struct Cli {
    /// Write diagnostics to the log file in the data directory instead of stderr
    #[arg(long, global = true)]
    log_file: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.log_file {
        if let Some(path) = logging::init_file() {
            eprintln!("Logging to {}", path.display());
        }
    } else {
        logging::init_cli();
    }

    if let Err(e) = cli::dispatch(cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
