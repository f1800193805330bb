//! Debug front-end core
//!
//! A debugger-agnostic front-end: a versioned state store, a session
//! command layer that drives pluggable debugger back-ends, a breakpoint
//! registry and a table of named commands for editor bindings.

pub mod backend;
pub mod cli;
pub mod commands;
pub mod common;
pub mod frontend;
pub mod session;
pub mod store;
pub mod testing;

// Re-export commonly used types for tests
pub use backend::{DebuggerApi, ExecState, Frame, LaunchConfig, Thread, Variable, VariableMap};
pub use common::{Error, Result};
pub use frontend::{DebuggerDefinition, Frontend, Registration};
pub use session::Debugger;
pub use store::{Action, Breakpoint, BreakpointState, SessionState, State, Store, StoreConfig};
