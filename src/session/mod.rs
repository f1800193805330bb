//! Session command layer
//!
//! [`Debugger`] turns user intents into back-end calls and store updates.
//! Every operation is safe to call whatever the session's state: missing
//! sessions, missing breakpoints and unmet preconditions resolve as no-ops,
//! and back-end failures become breakpoint/session state plus a line in the
//! output log. Nothing here returns an error to the caller.
//!
//! Each back-end completion is applied only if the session's generation is
//! the one captured when the call was issued; a stop or restart in between
//! makes the result stale and it is dropped.

use std::sync::Arc;

use futures_util::future::join_all;

use crate::backend::{DebuggerApi, ExecState, LaunchConfig, StartArgs, Variable};
use crate::common::{file_and_line, Error};
use crate::store::{Action, Breakpoint, BreakpointState, Session, SessionState, Store};

/// Output log source for front-end messages
pub const LOG_SOURCE: &str = "debug";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Resume,
    Next,
    StepIn,
    StepOut,
}

impl Step {
    fn label(self) -> &'static str {
        match self {
            Self::Resume => "Resume",
            Self::Next => "Next",
            Self::StepIn => "Step in",
            Self::StepOut => "Step out",
        }
    }
}

/// Session operations against a store
#[derive(Clone)]
pub struct Debugger {
    store: Store,
}

impl Debugger {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    fn session(&self, name: &str) -> Option<Arc<Session>> {
        self.store.get_state().session(name).cloned()
    }

    /// Session with a registered back-end
    fn live(&self, name: &str) -> Option<(Arc<Session>, Arc<dyn DebuggerApi>)> {
        let session = self.session(name)?;
        let api = session.api.clone()?;
        Some((session, api))
    }

    /// Started session with a registered back-end
    fn started(&self, name: &str) -> Option<(Arc<Session>, Arc<dyn DebuggerApi>)> {
        self.live(name).filter(|(session, _)| session.is_started())
    }

    /// The session still runs under `generation`
    fn is_current(&self, name: &str, generation: u64) -> bool {
        let current = self
            .session(name)
            .map_or(false, |s| s.is_live() && s.generation == generation);
        if !current {
            tracing::warn!(debugger = %name, generation, "Dropping stale back-end completion");
        }
        current
    }

    fn log(&self, message: impl Into<String>) {
        self.store.add_output_message(LOG_SOURCE, message);
    }

    fn set_state(&self, name: &str, state: SessionState) {
        self.store.dispatch(Action::SetState {
            name: name.to_string(),
            state,
        });
    }

    pub fn is_started(&self, name: &str) -> bool {
        self.store.get_state().is_started(Some(name))
    }

    pub fn select_debugger(&self, name: &str) {
        self.store.dispatch(Action::SetSelectedDebugger {
            name: name.to_string(),
        });
    }

    pub fn select_config(&self, name: &str, config: &str) {
        self.store.dispatch(Action::SetSelectedConfig {
            name: name.to_string(),
            config: config.to_string(),
        });
    }

    // === Lifecycle ===

    /// Launch the session with `config`
    ///
    /// Breakpoints recorded before the launch are sent to the back-end once
    /// it is up, then execution resumes. A failed launch leaves the session
    /// `NotStarted`.
    pub async fn start(&self, name: &str, config: &LaunchConfig, file: Option<&str>) {
        let Some((session, api)) = self.live(name) else {
            tracing::debug!(debugger = %name, "start: no back-end registered");
            return;
        };
        let generation = session.generation;

        self.store.dispatch(Action::TogglePanel { visible: Some(true) });
        self.set_state(name, SessionState::Starting);
        self.log(format!(
            "Starting debugger \"{}\" with config \"{}\"",
            name, config.name
        ));
        tracing::info!(debugger = %name, config = %config.name, "Starting debugger");

        let args = StartArgs {
            config: config.clone(),
            file: file.map(str::to_string),
        };
        if let Err(e) = api.start(args).await {
            tracing::warn!(debugger = %name, error = %e, "Debugger failed to start");
            self.log(format!(
                "Failed to start debugger \"{}\" with config \"{}\"\r\n  Error: {}",
                name, config.name, e
            ));
            // the session never got past `starting`, so nothing to stop remotely
            self.store.dispatch(Action::Stop {
                name: name.to_string(),
            });
            return;
        }
        if !self.is_current(name, generation) {
            return;
        }

        self.log(format!(
            "Started debugger \"{}\" with config \"{}\"",
            name, config.name
        ));
        tracing::info!(debugger = %name, "Debugger started");
        self.set_state(name, SessionState::Started);

        let breakpoints = self
            .session(name)
            .map(|s| s.breakpoints_in(None))
            .unwrap_or_default();
        tracing::debug!(debugger = %name, count = breakpoints.len(), "Replaying breakpoints");
        join_all(
            breakpoints
                .iter()
                .map(|bp| self.add_breakpoint(name, &bp.file, bp.line)),
        )
        .await;

        self.resume(name).await;
    }

    /// Terminate a started session; a no-op otherwise
    pub async fn stop(&self, name: &str) {
        let Some((session, api)) = self.started(name) else {
            return;
        };
        let generation = session.generation;

        tracing::debug!(debugger = %name, "Stopping debugger");
        match api.stop().await {
            Ok(()) => {
                if self.is_current(name, generation) {
                    self.store.dispatch(Action::Stop {
                        name: name.to_string(),
                    });
                    tracing::info!(debugger = %name, "Debugger stopped");
                }
            }
            Err(e) => {
                tracing::warn!(debugger = %name, error = %e, "Failed to stop debugger");
                self.log(format!("Stopping debugger \"{}\" failed!\r\n  Error: {}", name, e));
            }
        }
    }

    /// Restart a started session and resume it
    pub async fn restart(&self, name: &str) {
        let Some((_, api)) = self.started(name) else {
            return;
        };

        tracing::debug!(debugger = %name, "Restarting debugger");
        if let Err(e) = api.restart().await {
            tracing::warn!(debugger = %name, error = %e, "Failed to restart debugger");
            self.log(format!("Restarting debugger \"{}\" failed!\r\n  Error: {}", name, e));
            return;
        }
        self.store.dispatch(Action::Restart {
            name: name.to_string(),
        });
        tracing::info!(debugger = %name, "Debugger restarted");
        self.resume(name).await;
    }

    // === Execution control ===

    pub async fn resume(&self, name: &str) {
        self.step(name, Step::Resume).await;
    }

    pub async fn next(&self, name: &str) {
        self.step(name, Step::Next).await;
    }

    pub async fn step_in(&self, name: &str) {
        self.step(name, Step::StepIn).await;
    }

    pub async fn step_out(&self, name: &str) {
        self.step(name, Step::StepOut).await;
    }

    async fn step(&self, name: &str, step: Step) {
        let Some((session, api)) = self.started(name) else {
            return;
        };
        let generation = session.generation;

        tracing::debug!(debugger = %name, ?step, "Execution control");
        let result = match step {
            Step::Resume => api.resume().await,
            Step::Next => api.next().await,
            Step::StepIn => api.step_in().await,
            Step::StepOut => api.step_out().await,
        };
        match result {
            Ok(exec) => {
                if self.is_current(name, generation) {
                    self.after_step(name, exec).await;
                }
            }
            Err(e) => {
                tracing::warn!(debugger = %name, ?step, error = %e, "Execution control failed");
                self.log(format!("{} failed!\r\n  Error: {}", step.label(), e));
            }
        }
    }

    /// Follow the execution state a step reported
    async fn after_step(&self, name: &str, exec: ExecState) {
        if exec.exited {
            tracing::info!(debugger = %name, "Debuggee exited");
            self.stop(name).await;
            return;
        }
        self.get_threads(name).await;
        self.select_thread(name, exec.thread_id).await;
        self.select_stacktrace(name, 0).await;
    }

    // === Threads and stacktrace ===

    async fn get_threads(&self, name: &str) {
        let Some((session, api)) = self.started(name) else {
            return;
        };
        let generation = session.generation;

        self.set_state(name, SessionState::Busy);
        match api.get_threads().await {
            Ok(threads) => {
                if self.is_current(name, generation) {
                    tracing::debug!(debugger = %name, count = threads.len(), "Threads updated");
                    self.store.dispatch(Action::UpdateThreads {
                        name: name.to_string(),
                        threads,
                        state: SessionState::Waiting,
                    });
                }
            }
            Err(e) => self.backend_failed(name, generation, "get threads", &e),
        }
    }

    async fn get_stacktrace(&self, name: &str, thread_id: i64) {
        let Some((session, api)) = self.started(name) else {
            return;
        };
        let generation = session.generation;

        self.set_state(name, SessionState::Busy);
        match api.get_stacktrace(thread_id).await {
            Ok(stacktrace) => {
                if self.is_current(name, generation) {
                    tracing::debug!(debugger = %name, thread_id, frames = stacktrace.len(), "Stacktrace updated");
                    self.store.dispatch(Action::UpdateStacktrace {
                        name: name.to_string(),
                        stacktrace,
                        state: SessionState::Waiting,
                    });
                }
            }
            Err(e) => self.backend_failed(name, generation, "get stacktrace", &e),
        }
    }

    /// Select the thread `id` and fetch its stacktrace
    ///
    /// Selecting the thread that is already selected skips the back-end
    /// selection but still refreshes the stacktrace.
    pub async fn select_thread(&self, name: &str, id: i64) {
        let Some((session, api)) = self.started(name) else {
            return;
        };
        if session.selected_thread == id {
            self.get_stacktrace(name, id).await;
            return;
        }
        let generation = session.generation;

        self.set_state(name, SessionState::Busy);
        if let Err(e) = api.select_thread(id).await {
            self.backend_failed(name, generation, "select thread", &e);
            return;
        }
        if !self.is_current(name, generation) {
            return;
        }
        self.store.dispatch(Action::SetSelectedThread {
            name: name.to_string(),
            id,
            state: SessionState::Waiting,
        });
        self.get_stacktrace(name, id).await;
    }

    /// Select stacktrace entry `index`; selecting the current entry makes
    /// no back-end call
    pub async fn select_stacktrace(&self, name: &str, index: usize) {
        let Some((session, api)) = self.live(name) else {
            return;
        };
        if session.selected_stacktrace == index {
            return;
        }
        let generation = session.generation;

        self.set_state(name, SessionState::Busy);
        match api.select_stacktrace(index).await {
            Ok(()) => {
                if self.is_current(name, generation) {
                    self.store.dispatch(Action::SetSelectedStacktrace {
                        name: name.to_string(),
                        index,
                        state: SessionState::Waiting,
                    });
                }
            }
            Err(e) => self.backend_failed(name, generation, "select stacktrace", &e),
        }
    }

    // === Variables ===

    /// Load the children of `variable` into the frame selected at call time
    pub async fn load_variable(&self, name: &str, path: &str, variable: &Variable) {
        let Some((session, api)) = self.live(name) else {
            return;
        };
        let generation = session.generation;
        let stacktrace_index = session.selected_stacktrace;

        self.set_state(name, SessionState::Busy);
        tracing::debug!(debugger = %name, path = %path, stacktrace_index, "Loading variable");
        match api.load_variable(path, variable).await {
            Ok(variables) => {
                if self.is_current(name, generation) {
                    self.store.dispatch(Action::UpdateVariables {
                        name: name.to_string(),
                        stacktrace_index,
                        path: Some(path.to_string()),
                        variables,
                        state: SessionState::Waiting,
                    });
                }
            }
            Err(e) => self.backend_failed(name, generation, "load variable", &e),
        }
    }

    /// Log a failed query and hand control back to the user
    fn backend_failed(&self, name: &str, generation: u64, operation: &str, error: &Error) {
        tracing::warn!(debugger = %name, operation, error = %error, "Back-end call failed");
        self.log(format!(
            "Failed to {} for debugger \"{}\"\r\n  Error: {}",
            operation, name, error
        ));
        if self.is_current(name, generation) {
            self.set_state(name, SessionState::Waiting);
        }
    }

    // === Breakpoints ===

    /// Add a breakpoint at zero-based `line`
    ///
    /// Before the session starts this only records the location. On a
    /// started session a breakpoint already `Busy` at the same location is
    /// left alone so the back-end sees one request.
    pub async fn add_breakpoint(&self, name: &str, file: &str, line: u32) {
        let Some(session) = self.session(name) else {
            return;
        };
        let api = match &session.api {
            Some(api) if session.is_started() => Arc::clone(api),
            _ => {
                self.store.dispatch(Action::AddBreakpoint {
                    name: name.to_string(),
                    bp: Breakpoint::new(file, line, BreakpointState::NotStarted),
                });
                return;
            }
        };
        if session
            .breakpoint(file, line)
            .map_or(false, |bp| bp.state == BreakpointState::Busy)
        {
            tracing::debug!(debugger = %name, location = %file_and_line(file, line), "Breakpoint already in flight");
            return;
        }
        let generation = session.generation;
        let location = file_and_line(file, line);

        self.store.dispatch(Action::AddBreakpoint {
            name: name.to_string(),
            bp: Breakpoint::new(file, line, BreakpointState::Busy),
        });
        self.log(format!("Adding breakpoint @ {}", location));

        let result = api.add_breakpoint(file, line).await;
        if !self.is_current(name, generation) {
            return;
        }
        // removed locally while the request was out
        if self.session(name).and_then(|s| s.breakpoint(file, line).cloned()).is_none() {
            return;
        }
        match result {
            Ok(id) => {
                tracing::debug!(debugger = %name, location = %location, id = %id, "Breakpoint added");
                self.store.dispatch(Action::AddBreakpoint {
                    name: name.to_string(),
                    bp: Breakpoint::valid(file, line, id),
                });
                self.log(format!("Added breakpoint @ {}", location));
            }
            Err(e) => {
                tracing::warn!(debugger = %name, location = %location, error = %e, "Breakpoint rejected");
                self.log(format!(
                    "Adding breakpoint @ {} failed!\r\n  Error: {}",
                    location, e
                ));
                self.store.dispatch(Action::AddBreakpoint {
                    name: name.to_string(),
                    bp: Breakpoint::invalid(file, line, e.to_string()),
                });
            }
        }
    }

    /// Remove the breakpoint at `(file, line)`
    ///
    /// Invalid breakpoints and breakpoints of a session that is not started
    /// are dropped locally. A back-end failure keeps the breakpoint, marked
    /// invalid with the reason.
    pub async fn remove_breakpoint(&self, name: &str, file: &str, line: u32) {
        let Some(session) = self.session(name) else {
            return;
        };
        let Some(bp) = session.breakpoint(file, line).cloned() else {
            return;
        };
        let api = match &session.api {
            Some(api) if session.is_started() && bp.state != BreakpointState::Invalid => {
                Arc::clone(api)
            }
            _ => {
                self.store.dispatch(Action::RemoveBreakpoint {
                    name: name.to_string(),
                    bp: Breakpoint::new(file, line, BreakpointState::Removed),
                });
                return;
            }
        };
        let generation = session.generation;
        let location = file_and_line(file, line);

        self.store.dispatch(Action::RemoveBreakpoint {
            name: name.to_string(),
            bp: Breakpoint {
                state: BreakpointState::Busy,
                ..bp.clone()
            },
        });
        self.log(format!("Removing breakpoint @ {}", location));

        match api.remove_breakpoint(&bp).await {
            Ok(()) => {
                tracing::debug!(debugger = %name, location = %location, "Breakpoint removed");
                self.store.dispatch(Action::RemoveBreakpoint {
                    name: name.to_string(),
                    bp: Breakpoint::new(file, line, BreakpointState::Removed),
                });
                self.log(format!("Removed breakpoint @ {}", location));
            }
            Err(e) => {
                tracing::warn!(debugger = %name, location = %location, error = %e, "Failed to remove breakpoint");
                self.log(format!(
                    "Removing breakpoint @ {} failed!\r\n  Error: {}",
                    location, e
                ));
                if self.is_current(name, generation) {
                    self.store.dispatch(Action::RemoveBreakpoint {
                        name: name.to_string(),
                        bp: Breakpoint::invalid(file, line, e.to_string()),
                    });
                }
            }
        }
    }

    /// Remove the breakpoint at `(file, line)` if there is one, else add it
    pub async fn toggle_breakpoint(&self, name: &str, file: &str, line: u32) {
        let exists = self
            .session(name)
            .map_or(false, |s| s.breakpoint(file, line).is_some());
        if exists {
            self.remove_breakpoint(name, file, line).await;
        } else {
            self.add_breakpoint(name, file, line).await;
        }
    }

    /// Move a breakpoint whose line shifted with edited text
    pub fn update_breakpoint_line(&self, name: &str, file: &str, line: u32, new_line: u32) {
        self.store.dispatch(Action::UpdateBreakpointLine {
            name: name.to_string(),
            file: file.to_string(),
            line,
            new_line,
        });
    }

    /// Whether a breakpoint's file still exists on disk
    pub async fn locate_breakpoint(&self, file: &str) -> bool {
        tokio::fs::try_exists(file).await.unwrap_or(false)
    }

    /// Remove every breakpoint in `file`, returning how many there were
    pub async fn remove_file_breakpoints(&self, name: &str, file: &str) -> usize {
        let breakpoints = self
            .session(name)
            .map(|s| s.breakpoints_in(Some(file)))
            .unwrap_or_default();
        for bp in &breakpoints {
            self.remove_breakpoint(name, &bp.file, bp.line).await;
        }
        breakpoints.len()
    }
}
