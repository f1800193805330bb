//! Error types for the debug front-end
//!
//! Back-end failures are carried as [`Error::Backend`] and turned into
//! session/breakpoint state by the session layer. Everything else surfaces
//! from the I/O edges: configuration, persisted state and scenario files.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the debug front-end
#[derive(Error, Debug)]
pub enum Error {
    // === Back-end Errors ===
    /// A debugger back-end rejected a call. The message is shown verbatim
    /// to the user (breakpoint tooltip, output log).
    #[error("{0}")]
    Backend(String),

    // === Session Errors ===
    #[error("Unknown debugger '{0}'")]
    UnknownDebugger(String),

    #[error("Launch configuration '{config}' not found for debugger '{debugger}'")]
    ConfigNotFound { debugger: String, config: String },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === Persisted State Errors ===
    #[error("Invalid persisted state '{path}': {error}")]
    StateParse { path: String, error: String },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid scenario: {0}")]
    Scenario(String),

    // === Test Errors ===
    #[error("Test assertion failed: {0}")]
    TestAssertion(String),
}

impl Error {
    /// Create a back-end error from anything displayable
    pub fn backend(message: impl std::fmt::Display) -> Self {
        Self::Backend(message.to_string())
    }

    /// Create a config-not-found error
    pub fn config_not_found(debugger: &str, config: &str) -> Self {
        Self::ConfigNotFound {
            debugger: debugger.to_string(),
            config: config.to_string(),
        }
    }

    /// Create a file read error
    pub fn file_read(path: &std::path::Path, error: impl std::fmt::Display) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_displays_raw_message() {
        assert_eq!(Error::backend("denied").to_string(), "denied");
    }

    #[test]
    fn test_config_not_found_message() {
        let err = Error::config_not_found("py", "cfg");
        assert_eq!(
            err.to_string(),
            "Launch configuration 'cfg' not found for debugger 'py'"
        );
    }
}
