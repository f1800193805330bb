//! Pure reducers
//!
//! Each subtree has its own `(old, action) -> new` function. A reducer that
//! ignores an action returns its input `Arc` untouched.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::SystemTime;

use crate::backend::{Frame, LaunchConfig, Thread};

use super::action::Action;
use super::breakpoints;
use super::state::{Output, OutputMessage, Panel, Session, SessionState, State, VariablesView};
use super::StoreConfig;

/// Root reducer
pub fn reduce(state: &State, action: &Action, config: &StoreConfig) -> State {
    State {
        panel: panel(&state.panel, action, config),
        debuggers: debuggers(&state.debuggers, action),
        selected_debugger: selected_debugger(&state.selected_debugger, action),
        output: output(&state.output, action, config),
        variables: variables(&state.variables, action),
    }
}

fn panel(state: &Arc<Panel>, action: &Action, config: &StoreConfig) -> Arc<Panel> {
    match action {
        Action::TogglePanel { visible } => Arc::new(Panel {
            visible: Some(visible.unwrap_or(!state.is_visible())),
            ..state.as_ref().clone()
        }),
        Action::SetPanelWidth { width } => Arc::new(Panel {
            width: Some(*width),
            ..state.as_ref().clone()
        }),
        Action::InitStore if state.visible.is_none() => Arc::new(Panel {
            visible: Some(config.panel_visible),
            width: state.width.or(config.panel_width),
        }),
        _ => Arc::clone(state),
    }
}

fn selected_debugger(state: &str, action: &Action) -> String {
    match action {
        Action::SetSelectedDebugger { name } => name.clone(),
        Action::RemoveDebugger { name } if name == state => String::new(),
        _ => state.to_string(),
    }
}

fn output(state: &Arc<Output>, action: &Action, config: &StoreConfig) -> Arc<Output> {
    match action {
        Action::ToggleOutput { visible } => Arc::new(Output {
            visible: visible.unwrap_or(!state.visible),
            ..state.as_ref().clone()
        }),
        Action::CleanOutput => Arc::new(Output {
            messages: Vec::new(),
            ..state.as_ref().clone()
        }),
        Action::AddOutputMessage { name, message } => {
            let mut next = state.as_ref().clone();
            next.messages.push(OutputMessage {
                name: name.clone(),
                message: message.clone(),
                timestamp: SystemTime::now(),
            });
            if next.messages.len() > config.max_output_messages {
                let excess = next.messages.len() - config.max_output_messages;
                next.messages.drain(..excess);
            }
            Arc::new(next)
        }
        Action::ToggleOutputFilter { filter } => {
            let mut next = state.as_ref().clone();
            let enabled = state.filter_enabled(filter);
            next.filters.insert(filter.clone(), !enabled);
            Arc::new(next)
        }
        _ => Arc::clone(state),
    }
}

fn variables(state: &Arc<VariablesView>, action: &Action) -> Arc<VariablesView> {
    match action {
        Action::ToggleVariable { path, expanded } => {
            let mut next = state.as_ref().clone();
            let value = expanded.unwrap_or(!state.is_expanded(path));
            next.expanded.insert(path.clone(), value);
            Arc::new(next)
        }
        _ => Arc::clone(state),
    }
}

fn debuggers(
    state: &Arc<BTreeMap<String, Arc<Session>>>,
    action: &Action,
) -> Arc<BTreeMap<String, Arc<Session>>> {
    match action {
        Action::AddDebugger { name, .. } => {
            let base = state
                .get(name)
                .cloned()
                .unwrap_or_else(|| Arc::new(Session::new(name.clone())));
            let mut next = state.as_ref().clone();
            next.insert(name.clone(), session(&base, action));
            Arc::new(next)
        }

        Action::RemoveDebugger { name } => replace_session(state, name, action),

        Action::InitStore => {
            let mut next = state.as_ref().clone();
            let mut changed = false;
            for entry in next.values_mut() {
                let updated = session(entry, action);
                if !Arc::ptr_eq(entry, &updated) {
                    *entry = updated;
                    changed = true;
                }
            }
            if changed {
                Arc::new(next)
            } else {
                Arc::clone(state)
            }
        }

        _ => match action.session_name() {
            Some(name) => replace_session(state, name, action),
            None => Arc::clone(state),
        },
    }
}

/// Route an action to one session; unknown names leave the map untouched
fn replace_session(
    state: &Arc<BTreeMap<String, Arc<Session>>>,
    name: &str,
    action: &Action,
) -> Arc<BTreeMap<String, Arc<Session>>> {
    let Some(existing) = state.get(name) else {
        return Arc::clone(state);
    };
    let updated = session(existing, action);
    if Arc::ptr_eq(existing, &updated) {
        return Arc::clone(state);
    }
    let mut next = state.as_ref().clone();
    next.insert(name.to_string(), updated);
    Arc::new(next)
}

/// Per-session reducer
pub fn session(state: &Arc<Session>, action: &Action) -> Arc<Session> {
    let next = Session {
        name: session_name(&state.name, action),
        api: api(state, action),
        state: session_state(state.state, action),
        configs: configs(&state.configs, action),
        selected_config: selected_config(&state.selected_config, action),
        scopes: scopes(&state.scopes, action),
        breakpoints: breakpoints::reduce(&state.breakpoints, action),
        threads: threads(&state.threads, action),
        selected_thread: selected_thread(state.selected_thread, action),
        stacktrace: stacktrace(&state.stacktrace, action),
        selected_stacktrace: selected_stacktrace(state.selected_stacktrace, action),
        generation: generation(state.generation, action),
    };
    if next.same_as(state) {
        Arc::clone(state)
    } else {
        Arc::new(next)
    }
}

fn session_name(state: &str, action: &Action) -> String {
    match action {
        Action::AddDebugger { name, .. } => name.clone(),
        _ => state.to_string(),
    }
}

fn api(state: &Session, action: &Action) -> Option<Arc<dyn crate::backend::DebuggerApi>> {
    match action {
        Action::AddDebugger { api, .. } => api.clone().or_else(|| state.api.clone()),
        Action::RemoveDebugger { .. } => None,
        _ => state.api.clone(),
    }
}

fn session_state(state: SessionState, action: &Action) -> SessionState {
    match action {
        Action::Stop { .. } | Action::RemoveDebugger { .. } => SessionState::NotStarted,
        Action::Restart { .. } => SessionState::Started,
        Action::SetState { state, .. }
        | Action::SetSelectedThread { state, .. }
        | Action::SetSelectedStacktrace { state, .. }
        | Action::UpdateStacktrace { state, .. }
        | Action::UpdateThreads { state, .. }
        | Action::UpdateVariables { state, .. } => *state,
        _ => state,
    }
}

fn configs(state: &Arc<Vec<LaunchConfig>>, action: &Action) -> Arc<Vec<LaunchConfig>> {
    match action {
        Action::AddDebugger { configs, .. } | Action::UpdateConfigs { configs, .. } => {
            Arc::new(configs.clone())
        }
        _ => Arc::clone(state),
    }
}

fn selected_config(state: &str, action: &Action) -> String {
    match action {
        Action::SetSelectedConfig { config, .. } => config.clone(),
        _ => state.to_string(),
    }
}

fn scopes(state: &Arc<Vec<String>>, action: &Action) -> Arc<Vec<String>> {
    match action {
        Action::AddDebugger { scopes, .. } => Arc::new(scopes.clone()),
        _ => Arc::clone(state),
    }
}

fn threads(state: &Arc<Vec<Thread>>, action: &Action) -> Arc<Vec<Thread>> {
    match action {
        Action::Stop { .. } | Action::Restart { .. } | Action::RemoveDebugger { .. }
            if !state.is_empty() =>
        {
            Arc::new(Vec::new())
        }
        Action::UpdateThreads { threads, .. } => Arc::new(threads.clone()),
        _ => Arc::clone(state),
    }
}

fn selected_thread(state: i64, action: &Action) -> i64 {
    match action {
        Action::Stop { .. } | Action::Restart { .. } | Action::RemoveDebugger { .. } => 0,
        Action::SetSelectedThread { id, .. } => *id,
        _ => state,
    }
}

fn stacktrace(state: &Arc<Vec<Frame>>, action: &Action) -> Arc<Vec<Frame>> {
    match action {
        Action::Stop { .. } | Action::Restart { .. } | Action::RemoveDebugger { .. }
            if !state.is_empty() =>
        {
            Arc::new(Vec::new())
        }

        Action::UpdateStacktrace { stacktrace, .. } => Arc::new(
            stacktrace
                .iter()
                .map(|frame| {
                    let mut frame = frame.clone();
                    if frame.variables.is_none() {
                        // carry lazily loaded variables over from the frame with the same id
                        frame.variables = state
                            .iter()
                            .find(|existing| existing.id == frame.id)
                            .and_then(|existing| existing.variables.clone());
                    }
                    frame
                })
                .collect(),
        ),

        Action::UpdateVariables {
            stacktrace_index,
            path,
            variables,
            ..
        } => {
            let Some(frame) = state.get(*stacktrace_index) else {
                return Arc::clone(state);
            };
            let tree = frame
                .variables
                .as_deref()
                .cloned()
                .unwrap_or_default()
                .merged(variables.clone(), path.as_deref());
            let mut next = state.as_ref().clone();
            next[*stacktrace_index].variables = Some(Arc::new(tree));
            Arc::new(next)
        }

        _ => Arc::clone(state),
    }
}

fn selected_stacktrace(state: usize, action: &Action) -> usize {
    match action {
        Action::Stop { .. }
        | Action::Restart { .. }
        | Action::RemoveDebugger { .. }
        | Action::UpdateStacktrace { .. } => 0,
        Action::SetSelectedStacktrace { index, .. } => *index,
        _ => state,
    }
}

fn generation(state: u64, action: &Action) -> u64 {
    match action {
        Action::Stop { .. } | Action::Restart { .. } | Action::RemoveDebugger { .. } => state + 1,
        _ => state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Variable, VariableMap};
    use crate::store::state::{Breakpoint, BreakpointState};

    fn config() -> StoreConfig {
        StoreConfig::default()
    }

    fn with_session(name: &str) -> State {
        let state = State::default();
        reduce(
            &state,
            &Action::AddDebugger {
                name: name.to_string(),
                api: None,
                configs: vec![LaunchConfig::named("cfg")],
                scopes: vec!["python".to_string()],
            },
            &config(),
        )
    }

    fn dispatch(state: &State, action: Action) -> State {
        reduce(state, &action, &config())
    }

    #[test]
    fn test_unrelated_action_keeps_every_subtree() {
        let state = with_session("py");
        let next = dispatch(&state, Action::SetPanelWidth { width: 300 });
        assert!(!Arc::ptr_eq(&state.panel, &next.panel));
        assert!(Arc::ptr_eq(&state.debuggers, &next.debuggers));
        assert!(Arc::ptr_eq(&state.output, &next.output));
        assert!(Arc::ptr_eq(&state.variables, &next.variables));
    }

    #[test]
    fn test_unknown_session_is_noop() {
        let state = with_session("py");
        let next = dispatch(
            &state,
            Action::SetState {
                name: "go".to_string(),
                state: SessionState::Started,
            },
        );
        assert!(next.same_as(&state));
        assert!(next.session("go").is_none());
    }

    #[test]
    fn test_add_debugger_keeps_breakpoints() {
        let state = dispatch(
            &with_session("py"),
            Action::AddBreakpoint {
                name: "py".to_string(),
                bp: Breakpoint::new("/a.py", 1, BreakpointState::NotStarted),
            },
        );
        let next = dispatch(
            &state,
            Action::AddDebugger {
                name: "py".to_string(),
                api: None,
                configs: Vec::new(),
                scopes: Vec::new(),
            },
        );
        let session = next.session("py").unwrap();
        assert_eq!(session.breakpoints.len(), 1);
        assert!(session.configs.is_empty());
    }

    #[test]
    fn test_remove_debugger_clears_selection() {
        let state = dispatch(
            &with_session("py"),
            Action::SetSelectedDebugger {
                name: "py".to_string(),
            },
        );
        let next = dispatch(
            &state,
            Action::RemoveDebugger {
                name: "py".to_string(),
            },
        );
        assert_eq!(next.selected_debugger, "");
        assert!(next.session("py").is_some());
    }

    #[test]
    fn test_stop_clears_session() {
        let mut state = with_session("py");
        state = dispatch(
            &state,
            Action::UpdateThreads {
                name: "py".to_string(),
                threads: vec![Thread {
                    id: 1,
                    func: "main".to_string(),
                    file: "/a.py".to_string(),
                    line: 1,
                }],
                state: SessionState::Waiting,
            },
        );
        state = dispatch(
            &state,
            Action::UpdateStacktrace {
                name: "py".to_string(),
                stacktrace: vec![Frame::new(1, "main", "/a.py", 1)],
                state: SessionState::Waiting,
            },
        );
        state = dispatch(
            &state,
            Action::SetSelectedThread {
                name: "py".to_string(),
                id: 1,
                state: SessionState::Waiting,
            },
        );

        let next = dispatch(&state, Action::Stop { name: "py".to_string() });
        let session = next.session("py").unwrap();
        assert_eq!(session.state, SessionState::NotStarted);
        assert!(session.threads.is_empty());
        assert!(session.stacktrace.is_empty());
        assert_eq!(session.selected_thread, 0);
        assert_eq!(session.generation, 1);
    }

    #[test]
    fn test_remove_debugger_resets_live_state() {
        let mut state = with_session("py");
        state = dispatch(
            &state,
            Action::SetState {
                name: "py".to_string(),
                state: SessionState::Waiting,
            },
        );
        state = dispatch(
            &state,
            Action::AddBreakpoint {
                name: "py".to_string(),
                bp: Breakpoint::valid("/a.py", 4, "1".to_string()),
            },
        );
        state = dispatch(
            &state,
            Action::UpdateStacktrace {
                name: "py".to_string(),
                stacktrace: vec![Frame::new(1, "main", "/a.py", 4)],
                state: SessionState::Waiting,
            },
        );
        state = dispatch(
            &state,
            Action::SetSelectedThread {
                name: "py".to_string(),
                id: 3,
                state: SessionState::Waiting,
            },
        );

        let next = dispatch(&state, Action::RemoveDebugger { name: "py".to_string() });
        let session = next.session("py").unwrap();
        assert_eq!(session.state, SessionState::NotStarted);
        assert!(session.api.is_none());
        assert!(session.stacktrace.is_empty());
        assert_eq!(session.selected_thread, 0);
        assert_eq!(session.selected_stacktrace, 0);
        assert_eq!(
            session.breakpoints.as_slice(),
            &[Breakpoint::new("/a.py", 4, BreakpointState::NotStarted)]
        );
    }

    #[test]
    fn test_restart_sets_started() {
        let state = with_session("py");
        let next = dispatch(&state, Action::Restart { name: "py".to_string() });
        assert_eq!(next.session("py").unwrap().state, SessionState::Started);
    }

    #[test]
    fn test_stacktrace_update_carries_variables_forward() {
        let mut vars = VariableMap::new();
        vars.insert("x".to_string(), Variable::new("x", "1", ""));
        let mut state = dispatch(
            &with_session("py"),
            Action::UpdateStacktrace {
                name: "py".to_string(),
                stacktrace: vec![Frame::new(10, "f", "/a.py", 1).with_variables(vars)],
                state: SessionState::Waiting,
            },
        );
        state = dispatch(
            &state,
            Action::SetSelectedStacktrace {
                name: "py".to_string(),
                index: 1,
                state: SessionState::Waiting,
            },
        );
        let next = dispatch(
            &state,
            Action::UpdateStacktrace {
                name: "py".to_string(),
                stacktrace: vec![Frame::new(11, "g", "/a.py", 5), Frame::new(10, "f", "/a.py", 2)],
                state: SessionState::Waiting,
            },
        );
        let session = next.session("py").unwrap();
        assert_eq!(session.selected_stacktrace, 0);
        assert!(session.stacktrace[0].variables.is_none());
        let carried = session.stacktrace[1].variables.as_ref().unwrap();
        assert_eq!(carried.get("x").unwrap().value, "1");
        assert_eq!(session.stacktrace[1].line, 2);
    }

    #[test]
    fn test_update_variables_targets_given_frame() {
        let mut state = dispatch(
            &with_session("py"),
            Action::UpdateStacktrace {
                name: "py".to_string(),
                stacktrace: vec![Frame::new(1, "f", "/a.py", 1), Frame::new(2, "g", "/a.py", 2)],
                state: SessionState::Waiting,
            },
        );
        let mut vars = VariableMap::new();
        vars.insert("obj".to_string(), Variable::new("obj", "{}", "").expandable());
        state = dispatch(
            &state,
            Action::UpdateVariables {
                name: "py".to_string(),
                stacktrace_index: 1,
                path: None,
                variables: vars,
                state: SessionState::Waiting,
            },
        );
        let mut children = VariableMap::new();
        children.insert("obj.a".to_string(), Variable::new("a", "1", "obj"));
        state = dispatch(
            &state,
            Action::UpdateVariables {
                name: "py".to_string(),
                stacktrace_index: 1,
                path: Some("obj".to_string()),
                variables: children,
                state: SessionState::Waiting,
            },
        );
        let session = state.session("py").unwrap();
        assert!(session.stacktrace[0].variables.is_none());
        let tree = session.stacktrace[1].variables.as_ref().unwrap();
        assert!(tree.get("obj").unwrap().loaded);
        assert_eq!(tree.children("obj").len(), 1);
    }

    #[test]
    fn test_update_variables_out_of_range_is_noop() {
        let state = with_session("py");
        let next = dispatch(
            &state,
            Action::UpdateVariables {
                name: "py".to_string(),
                stacktrace_index: 3,
                path: None,
                variables: VariableMap::new(),
                state: SessionState::Busy,
            },
        );
        let before = state.session("py").unwrap();
        let after = next.session("py").unwrap();
        assert!(Arc::ptr_eq(&before.stacktrace, &after.stacktrace));
        assert_eq!(after.state, SessionState::Busy);
    }

    #[test]
    fn test_init_store_repairs_panel_and_breakpoints() {
        let mut state = with_session("py");
        state.panel = Arc::new(Panel {
            visible: None,
            width: Some(200),
        });
        state = dispatch(
            &state,
            Action::AddBreakpoint {
                name: "py".to_string(),
                bp: Breakpoint::valid("/a.py", 3, "1".to_string()),
            },
        );
        let next = reduce(
            &state,
            &Action::InitStore,
            &StoreConfig {
                panel_visible: false,
                ..StoreConfig::default()
            },
        );
        assert_eq!(next.panel.visible, Some(false));
        assert_eq!(next.panel.width, Some(200));
        let bp = &next.session("py").unwrap().breakpoints[0];
        assert_eq!(bp.state, BreakpointState::NotStarted);
        assert_eq!(bp.id, None);
    }

    #[test]
    fn test_init_store_on_clean_state_is_identity() {
        let mut state = with_session("py");
        state.panel = Arc::new(Panel {
            visible: Some(true),
            width: None,
        });
        let next = dispatch(&state, Action::InitStore);
        assert!(next.same_as(&state));
    }

    #[test]
    fn test_output_is_capped() {
        let cfg = StoreConfig {
            max_output_messages: 2,
            ..StoreConfig::default()
        };
        let mut state = State::default();
        for i in 0..3 {
            state = reduce(
                &state,
                &Action::AddOutputMessage {
                    name: "debug".to_string(),
                    message: format!("m{i}"),
                },
                &cfg,
            );
        }
        let messages: Vec<_> = state.output.messages.iter().map(|m| m.message.as_str()).collect();
        assert_eq!(messages, vec!["m1", "m2"]);
    }

    #[test]
    fn test_output_filter_toggle() {
        let state = State::default();
        assert!(state.output.filter_enabled("debug"));
        let next = dispatch(
            &state,
            Action::ToggleOutputFilter {
                filter: "debug".to_string(),
            },
        );
        assert!(!next.output.filter_enabled("debug"));
        let custom = dispatch(
            &next,
            Action::ToggleOutputFilter {
                filter: "py".to_string(),
            },
        );
        assert!(!custom.output.filter_enabled("py"));
    }

    #[test]
    fn test_toggle_panel_and_variable() {
        let state = State::default();
        let shown = dispatch(&state, Action::TogglePanel { visible: None });
        assert_eq!(shown.panel.visible, Some(true));
        let hidden = dispatch(&shown, Action::TogglePanel { visible: Some(false) });
        assert_eq!(hidden.panel.visible, Some(false));

        let expanded = dispatch(
            &state,
            Action::ToggleVariable {
                path: "obj".to_string(),
                expanded: None,
            },
        );
        assert!(expanded.variables.is_expanded("obj"));
    }
}
