//! CLI command handling
//!
//! Dispatches CLI commands and formats output.

use std::path::PathBuf;

use colored::Colorize;

use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{file_and_line, Error, Result};
use crate::frontend::{all_commands, keyboard_commands, panel_commands, CommandId, Frontend};
use crate::store::{PersistedDebugger, PersistedState};
use crate::testing;

/// Dispatch a CLI command
pub async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Test { path, verbose } => {
            let result = testing::run_scenario(&path, verbose).await?;
            if result.passed {
                Ok(())
            } else {
                Err(Error::TestAssertion(format!(
                    "'{}' failed at step {}/{}: {}",
                    result.name,
                    result.steps_run,
                    result.steps_total,
                    result.error.unwrap_or_default()
                )))
            }
        }

        Commands::State { path, json } => {
            let config = Config::load()?;
            let path = resolve_state_path(path, &config)?;
            let frontend = Frontend::load(&config, &path)?;
            let persisted = frontend.serialize();

            if json {
                println!("{}", serde_json::to_string_pretty(&persisted)?);
            } else {
                println!("State file: {}", path.display());
                print_state(&persisted);
            }

            Ok(())
        }

        Commands::Commands => {
            let bindings = keyboard_commands();
            let panel: Vec<CommandId> = panel_commands().map(|spec| spec.id).collect();

            for spec in all_commands() {
                let binding = bindings
                    .iter()
                    .find(|(_, id)| *id == spec.id)
                    .map(|(b, _)| b.as_str())
                    .unwrap_or("-");
                let marker = if panel.contains(&spec.id) { "▣" } else { " " };
                let title = spec.title.or(spec.text).unwrap_or("");
                println!(
                    "  {} {:18} {:24} {}",
                    marker,
                    spec.cmd,
                    binding,
                    title.dimmed()
                );
            }

            Ok(())
        }
    }
}

fn resolve_state_path(path: Option<PathBuf>, config: &Config) -> Result<PathBuf> {
    path.or_else(|| config.state_path())
        .ok_or_else(|| Error::Config("Could not determine state file location".to_string()))
}

fn print_state(state: &PersistedState) {
    let visible = match state.panel.visible {
        Some(true) => "visible",
        Some(false) => "hidden",
        None => "unset",
    };
    match state.panel.width {
        Some(width) => println!("Panel: {} ({}px)", visible, width),
        None => println!("Panel: {}", visible),
    }

    if state.debuggers.is_empty() {
        println!("No debuggers recorded");
        return;
    }

    for (name, debugger) in &state.debuggers {
        println!("\n{}:", name.bold());
        if debugger.breakpoints.is_empty() {
            println!("  No breakpoints set");
            continue;
        }
        for location in breakpoint_locations(debugger) {
            println!("  {} {}", "○".dimmed(), location);
        }
    }
}

/// Persisted breakpoints carry no live state; only their locations are shown
fn breakpoint_locations(debugger: &PersistedDebugger) -> Vec<String> {
    debugger
        .breakpoints
        .iter()
        .map(|bp| file_and_line(&bp.file, bp.line))
        .collect()
}
