//! State tree held by the store
//!
//! Every subtree sits behind an `Arc`. A reducer that does not touch a
//! subtree hands back the same `Arc`, so listeners detect change with
//! `Arc::ptr_eq` instead of deep comparison.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::backend::{DebuggerApi, Frame, LaunchConfig, Thread};

/// Lifecycle state of a debugger session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    #[default]
    NotStarted,
    Starting,
    Started,
    /// A back-end call is in flight
    Busy,
    /// Stopped and waiting for the user
    Waiting,
}

impl SessionState {
    /// Execution-control operations are permitted
    pub fn is_started(self) -> bool {
        !matches!(self, Self::NotStarted | Self::Starting)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "notStarted"),
            Self::Starting => write!(f, "starting"),
            Self::Started => write!(f, "started"),
            Self::Busy => write!(f, "busy"),
            Self::Waiting => write!(f, "waiting"),
        }
    }
}

/// State of a single breakpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BreakpointState {
    /// Recorded locally, not known to any back-end
    #[default]
    NotStarted,
    Busy,
    Valid,
    /// The back-end rejected it; `message` says why
    Invalid,
    Removed,
}

impl fmt::Display for BreakpointState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "notStarted"),
            Self::Busy => write!(f, "busy"),
            Self::Valid => write!(f, "valid"),
            Self::Invalid => write!(f, "invalid"),
            Self::Removed => write!(f, "removed"),
        }
    }
}

/// A breakpoint, identified by `(file, line)`
///
/// `line` is zero-based. `id` is opaque back-end metadata and is only set
/// while the breakpoint is `Valid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub file: String,
    pub line: u32,
    pub state: BreakpointState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Breakpoint {
    pub fn new(file: impl Into<String>, line: u32, state: BreakpointState) -> Self {
        Self {
            file: file.into(),
            line,
            state,
            id: None,
            message: None,
        }
    }

    pub fn valid(file: impl Into<String>, line: u32, id: String) -> Self {
        Self {
            id: Some(id),
            ..Self::new(file, line, BreakpointState::Valid)
        }
    }

    pub fn invalid(file: impl Into<String>, line: u32, message: String) -> Self {
        Self {
            message: Some(message),
            ..Self::new(file, line, BreakpointState::Invalid)
        }
    }

    pub fn is_at(&self, file: &str, line: u32) -> bool {
        self.file == file && self.line == line
    }
}

/// One named debugger session
#[derive(Clone, Default)]
pub struct Session {
    pub name: String,
    /// Back-end handle; `None` while the session is only a definition
    pub api: Option<Arc<dyn DebuggerApi>>,
    pub state: SessionState,
    pub configs: Arc<Vec<LaunchConfig>>,
    /// Name of the chosen configuration; empty when none is chosen
    pub selected_config: String,
    /// Source languages this session can debug
    pub scopes: Arc<Vec<String>>,
    /// Sorted by `(file, line)`
    pub breakpoints: Arc<Vec<Breakpoint>>,
    pub threads: Arc<Vec<Thread>>,
    pub selected_thread: i64,
    pub stacktrace: Arc<Vec<Frame>>,
    pub selected_stacktrace: usize,
    /// Advanced on stop, restart and back-end removal; completions issued
    /// under an older generation are discarded
    pub generation: u64,
}

impl Session {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// A back-end is registered for this session
    pub fn is_live(&self) -> bool {
        self.api.is_some()
    }

    pub fn is_started(&self) -> bool {
        self.state.is_started()
    }

    /// Configuration with the selected name
    pub fn selected_launch_config(&self) -> Option<&LaunchConfig> {
        if self.selected_config.is_empty() {
            return None;
        }
        self.configs.iter().find(|c| c.name == self.selected_config)
    }

    /// Currently selected stacktrace entry
    pub fn selected_frame(&self) -> Option<&Frame> {
        self.stacktrace.get(self.selected_stacktrace)
    }

    pub fn breakpoint(&self, file: &str, line: u32) -> Option<&Breakpoint> {
        super::breakpoints::index_of(&self.breakpoints, file, line).map(|i| &self.breakpoints[i])
    }

    /// Breakpoints, optionally restricted to one file
    pub fn breakpoints_in(&self, file: Option<&str>) -> Vec<Breakpoint> {
        self.breakpoints
            .iter()
            .filter(|bp| file.map_or(true, |f| bp.file == f))
            .cloned()
            .collect()
    }

    /// Field-wise identity: subtrees by pointer, scalars by value
    pub(crate) fn same_as(&self, other: &Session) -> bool {
        let api_same = match (&self.api, &other.api) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        api_same
            && self.name == other.name
            && self.state == other.state
            && Arc::ptr_eq(&self.configs, &other.configs)
            && self.selected_config == other.selected_config
            && Arc::ptr_eq(&self.scopes, &other.scopes)
            && Arc::ptr_eq(&self.breakpoints, &other.breakpoints)
            && Arc::ptr_eq(&self.threads, &other.threads)
            && self.selected_thread == other.selected_thread
            && Arc::ptr_eq(&self.stacktrace, &other.stacktrace)
            && self.selected_stacktrace == other.selected_stacktrace
            && self.generation == other.generation
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("name", &self.name)
            .field("live", &self.api.is_some())
            .field("state", &self.state)
            .field("selected_config", &self.selected_config)
            .field("breakpoints", &self.breakpoints)
            .field("threads", &self.threads.len())
            .field("selected_thread", &self.selected_thread)
            .field("stacktrace", &self.stacktrace.len())
            .field("selected_stacktrace", &self.selected_stacktrace)
            .field("generation", &self.generation)
            .finish()
    }
}

/// Side panel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Panel {
    /// `None` only before the store was initialised from unusable data
    pub visible: Option<bool>,
    pub width: Option<u32>,
}

impl Panel {
    pub fn is_visible(&self) -> bool {
        self.visible.unwrap_or(false)
    }
}

/// A line in the output log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputMessage {
    /// Source of the message: `debug` for front-end lines, otherwise a
    /// debugger name
    pub name: String,
    pub message: String,
    pub timestamp: SystemTime,
}

/// Output log and its view settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub messages: Vec<OutputMessage>,
    pub visible: bool,
    pub filters: BTreeMap<String, bool>,
}

impl Default for Output {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            visible: false,
            filters: BTreeMap::from([("debug".to_string(), true), ("output".to_string(), true)]),
        }
    }
}

impl Output {
    /// A filter that was never toggled counts as enabled
    pub fn filter_enabled(&self, filter: &str) -> bool {
        self.filters.get(filter).copied().unwrap_or(true)
    }

    /// Messages passing the current filters
    pub fn visible_messages(&self) -> impl Iterator<Item = &OutputMessage> {
        self.messages.iter().filter(|m| self.filter_enabled(&m.name))
    }
}

/// UI-only expansion state of the variable tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariablesView {
    pub expanded: BTreeMap<String, bool>,
}

impl VariablesView {
    pub fn is_expanded(&self, path: &str) -> bool {
        self.expanded.get(path).copied().unwrap_or(false)
    }
}

/// Root of the state tree
#[derive(Debug, Clone, Default)]
pub struct State {
    pub panel: Arc<Panel>,
    pub debuggers: Arc<BTreeMap<String, Arc<Session>>>,
    /// Name of the selected session; empty when none is selected
    pub selected_debugger: String,
    pub output: Arc<Output>,
    pub variables: Arc<VariablesView>,
}

impl State {
    /// Sessions that have a back-end registered
    pub fn get_debuggers(&self) -> impl Iterator<Item = &Arc<Session>> {
        self.debuggers.values().filter(|s| s.is_live())
    }

    /// Live session by name, falling back to the selected session
    pub fn get_debugger(&self, name: Option<&str>) -> Option<&Arc<Session>> {
        let name = match name {
            Some(n) if !n.is_empty() => n,
            _ => self.selected_debugger.as_str(),
        };
        self.debuggers.get(name).filter(|s| s.is_live())
    }

    /// Session by name, live or not
    pub fn session(&self, name: &str) -> Option<&Arc<Session>> {
        self.debuggers.get(name)
    }

    /// First live session able to debug `scope`, preferring the selected one
    pub fn debugger_for_scope(&self, scope: &str) -> Option<&Arc<Session>> {
        let handles = |s: &&Arc<Session>| s.scopes.iter().any(|sc| sc == scope);
        self.get_debugger(None)
            .filter(handles)
            .or_else(|| self.get_debuggers().find(handles))
    }

    pub fn get_breakpoints(&self, name: Option<&str>, file: Option<&str>) -> Vec<Breakpoint> {
        self.get_debugger(name)
            .map(|s| s.breakpoints_in(file))
            .unwrap_or_default()
    }

    pub fn get_breakpoint(&self, name: Option<&str>, file: &str, line: u32) -> Option<Breakpoint> {
        self.get_debugger(name)
            .and_then(|s| s.breakpoint(file, line).cloned())
    }

    /// A session exists, is live and has started
    pub fn is_started(&self, name: Option<&str>) -> bool {
        self.get_debugger(name).map_or(false, |s| s.is_started())
    }

    /// Every subtree is the same allocation as in `other`
    pub(crate) fn same_as(&self, other: &State) -> bool {
        Arc::ptr_eq(&self.panel, &other.panel)
            && Arc::ptr_eq(&self.debuggers, &other.debuggers)
            && self.selected_debugger == other.selected_debugger
            && Arc::ptr_eq(&self.output, &other.output)
            && Arc::ptr_eq(&self.variables, &other.variables)
    }
}
