//! CLI command definitions
//!
//! Defines the clap commands for the debug front-end CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Execute a test scenario defined in a YAML file
    Test {
        /// Path to the YAML test scenario file
        path: PathBuf,

        /// Verbose output
        #[arg(long, short)]
        verbose: bool,
    },

    /// Show persisted front-end state (panel and breakpoints)
    State {
        /// State file to read (default: from config, then the data directory)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Print the repaired state as JSON
        #[arg(long)]
        json: bool,
    },

    /// List front-end commands and their bindings
    Commands,
}
