//! Debugger back-end capability
//!
//! A back-end is whatever actually debugs the program: a DAP adapter, an
//! in-process interpreter hook, a test double. The front-end only sees the
//! [`DebuggerApi`] trait; each session owns exactly one implementation.

mod types;

pub use types::{ExecState, Frame, LaunchConfig, StartArgs, Thread, Variable, VariableMap};

use async_trait::async_trait;

use crate::common::Result;
use crate::store::Breakpoint;

/// Asynchronous operations a debugger back-end exposes
///
/// Every call may fail with [`crate::Error::Backend`]; the session layer
/// turns failures into state and output-log lines, so implementations should
/// put a human-readable reason in the message.
#[async_trait]
pub trait DebuggerApi: Send + Sync {
    /// Launch the debuggee
    async fn start(&self, args: StartArgs) -> Result<()>;

    /// Terminate the debuggee
    async fn stop(&self) -> Result<()>;

    /// Set a breakpoint, returning the back-end's identifier for it
    async fn add_breakpoint(&self, file: &str, line: u32) -> Result<String>;

    /// Clear a breakpoint previously set
    async fn remove_breakpoint(&self, bp: &Breakpoint) -> Result<()>;

    async fn resume(&self) -> Result<ExecState>;

    async fn next(&self) -> Result<ExecState>;

    async fn step_in(&self) -> Result<ExecState>;

    async fn step_out(&self) -> Result<ExecState>;

    async fn restart(&self) -> Result<()>;

    async fn select_stacktrace(&self, index: usize) -> Result<()>;

    async fn select_thread(&self, id: i64) -> Result<()>;

    async fn get_stacktrace(&self, thread_id: i64) -> Result<Vec<Frame>>;

    async fn get_threads(&self) -> Result<Vec<Thread>>;

    /// Load the children of the variable at `path`
    async fn load_variable(&self, path: &str, variable: &Variable) -> Result<VariableMap>;
}
