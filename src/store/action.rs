//! Store actions

use std::fmt;
use std::sync::Arc;

use crate::backend::{DebuggerApi, Frame, LaunchConfig, Thread, VariableMap};

use super::state::{Breakpoint, SessionState};

/// Everything that can change the state tree
#[derive(Clone)]
pub enum Action {
    /// Upgrade freshly restored state so it is usable again
    InitStore,

    // === Registration ===
    AddDebugger {
        name: String,
        api: Option<Arc<dyn DebuggerApi>>,
        configs: Vec<LaunchConfig>,
        scopes: Vec<String>,
    },
    RemoveDebugger {
        name: String,
    },
    SetSelectedDebugger {
        name: String,
    },
    UpdateConfigs {
        name: String,
        configs: Vec<LaunchConfig>,
    },
    SetSelectedConfig {
        name: String,
        config: String,
    },

    // === Breakpoints ===
    /// Insert, or replace the breakpoint at the same `(file, line)`
    AddBreakpoint {
        name: String,
        bp: Breakpoint,
    },
    /// Delete when `bp.state` is `Removed`, otherwise update in place
    RemoveBreakpoint {
        name: String,
        bp: Breakpoint,
    },
    UpdateBreakpointLine {
        name: String,
        file: String,
        line: u32,
        new_line: u32,
    },

    // === Session ===
    SetState {
        name: String,
        state: SessionState,
    },
    SetSelectedStacktrace {
        name: String,
        index: usize,
        state: SessionState,
    },
    SetSelectedThread {
        name: String,
        id: i64,
        state: SessionState,
    },
    UpdateStacktrace {
        name: String,
        stacktrace: Vec<Frame>,
        state: SessionState,
    },
    UpdateThreads {
        name: String,
        threads: Vec<Thread>,
        state: SessionState,
    },
    UpdateVariables {
        name: String,
        stacktrace_index: usize,
        /// Variable whose children these are
        path: Option<String>,
        variables: VariableMap,
        state: SessionState,
    },
    Stop {
        name: String,
    },
    Restart {
        name: String,
    },

    // === Panel ===
    TogglePanel {
        visible: Option<bool>,
    },
    SetPanelWidth {
        width: u32,
    },

    // === Output ===
    ToggleOutput {
        visible: Option<bool>,
    },
    CleanOutput,
    AddOutputMessage {
        name: String,
        message: String,
    },
    ToggleOutputFilter {
        filter: String,
    },

    // === Variables view ===
    ToggleVariable {
        path: String,
        expanded: Option<bool>,
    },
}

impl Action {
    /// Session a session-scoped action is routed to
    pub fn session_name(&self) -> Option<&str> {
        match self {
            Self::AddBreakpoint { name, .. }
            | Self::RemoveBreakpoint { name, .. }
            | Self::UpdateBreakpointLine { name, .. }
            | Self::SetState { name, .. }
            | Self::SetSelectedStacktrace { name, .. }
            | Self::SetSelectedThread { name, .. }
            | Self::UpdateStacktrace { name, .. }
            | Self::UpdateThreads { name, .. }
            | Self::UpdateVariables { name, .. }
            | Self::UpdateConfigs { name, .. }
            | Self::SetSelectedConfig { name, .. }
            | Self::Stop { name }
            | Self::Restart { name } => Some(name),
            _ => None,
        }
    }

    /// Action type name, for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InitStore => "INIT_STORE",
            Self::AddDebugger { .. } => "ADD_DEBUGGER",
            Self::RemoveDebugger { .. } => "REMOVE_DEBUGGER",
            Self::SetSelectedDebugger { .. } => "SET_SELECTED_DEBUGGER",
            Self::UpdateConfigs { .. } => "UPDATE_CONFIGS",
            Self::SetSelectedConfig { .. } => "SET_SELECTED_CONFIG",
            Self::AddBreakpoint { .. } => "ADD_BREAKPOINT",
            Self::RemoveBreakpoint { .. } => "REMOVE_BREAKPOINT",
            Self::UpdateBreakpointLine { .. } => "UPDATE_BREAKPOINT_LINE",
            Self::SetState { .. } => "SET_STATE",
            Self::SetSelectedStacktrace { .. } => "SET_SELECTED_STACKTRACE",
            Self::SetSelectedThread { .. } => "SET_SELECTED_THREAD",
            Self::UpdateStacktrace { .. } => "UPDATE_STACKTRACE",
            Self::UpdateThreads { .. } => "UPDATE_THREADS",
            Self::UpdateVariables { .. } => "UPDATE_VARIABLES",
            Self::Stop { .. } => "STOP",
            Self::Restart { .. } => "RESTART",
            Self::TogglePanel { .. } => "TOGGLE_PANEL",
            Self::SetPanelWidth { .. } => "SET_PANEL_WIDTH",
            Self::ToggleOutput { .. } => "TOGGLE_OUTPUT",
            Self::CleanOutput => "CLEAN_OUTPUT",
            Self::AddOutputMessage { .. } => "ADD_OUTPUT_MESSAGE",
            Self::ToggleOutputFilter { .. } => "TOGGLE_OUTPUT_FILTER",
            Self::ToggleVariable { .. } => "TOGGLE_VARIABLE",
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.session_name() {
            Some(name) => write!(f, "{}({})", self.kind(), name),
            None => write!(f, "{}", self.kind()),
        }
    }
}
