//! Common utilities shared by the library and the CLI

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Error, Result};

/// Render a zero-based line as `file:line` with a one-based line number
pub fn file_and_line(file: &str, line: u32) -> String {
    format!("{}:{}", file, line + 1)
}
