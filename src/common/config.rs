//! Configuration file handling

use serde::Deserialize;
use std::path::PathBuf;

use super::paths::{config_path, state_path};
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Side panel settings
    #[serde(default)]
    pub panel: PanelConfig,

    /// Output log settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Persisted state settings
    #[serde(default)]
    pub state: StateConfig,
}

/// Side panel settings
#[derive(Debug, Deserialize, Clone)]
pub struct PanelConfig {
    /// Visibility used for a fresh store and when a persisted flag is unusable
    #[serde(default = "default_initial_visible")]
    pub initial_visible: bool,

    /// Initial panel width in pixels
    #[serde(default)]
    pub initial_width: Option<u32>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            initial_visible: default_initial_visible(),
            initial_width: None,
        }
    }
}

fn default_initial_visible() -> bool {
    true
}

/// Output log settings
#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    /// Maximum number of messages kept in the output log
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
        }
    }
}

fn default_max_messages() -> usize {
    10_000
}

/// Persisted state settings
#[derive(Debug, Deserialize, Default, Clone)]
pub struct StateConfig {
    /// Where the CLI reads and writes the persisted state
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                let content = std::fs::read_to_string(&path)
                    .map_err(|e| super::Error::file_read(&path, e))?;
                return Self::parse(&content);
            }
        }
        Ok(Self::default())
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }

    /// Resolve the persisted state location
    pub fn state_path(&self) -> Option<PathBuf> {
        self.state.path.clone().or_else(state_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert!(config.panel.initial_visible);
        assert_eq!(config.panel.initial_width, None);
        assert_eq!(config.output.max_messages, 10_000);
        assert!(config.state.path.is_none());
    }

    #[test]
    fn test_partial_config() {
        let config = Config::parse(
            r#"
            [panel]
            initial_visible = false
            initial_width = 320

            [output]
            max_messages = 50
            "#,
        )
        .unwrap();
        assert!(!config.panel.initial_visible);
        assert_eq!(config.panel.initial_width, Some(320));
        assert_eq!(config.output.max_messages, 50);
    }

    #[test]
    fn test_invalid_config_is_parse_error() {
        let err = Config::parse("[panel]\ninitial_visible = \"yes\"").unwrap_err();
        assert!(matches!(err, super::super::Error::ConfigParse(_)));
    }

    #[test]
    fn test_explicit_state_path_wins() {
        let config = Config::parse("[state]\npath = \"/tmp/dbg.json\"").unwrap();
        assert_eq!(config.state_path(), Some(PathBuf::from("/tmp/dbg.json")));
    }
}
