//! Platform configuration and data paths
//!
//! Uses the directories crate for platform-appropriate locations:
//! - Linux: `~/.config/debug-frontend/` and `~/.local/share/debug-frontend/`
//! - macOS: `~/Library/Application Support/debug-frontend/`
//! - Windows: `%APPDATA%\debug-frontend\`

use std::path::PathBuf;

/// Application name used for every platform directory
const APP_NAME: &str = "debug-frontend";

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", APP_NAME)
}

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the data directory path
pub fn data_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
}

/// Get the path to the log directory
pub fn log_dir() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("logs"))
}

/// Default location of the persisted front-end state
pub fn state_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("state.json"))
}
