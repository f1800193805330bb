//! Host-facing entry point
//!
//! A [`Frontend`] owns one store and everything built on it. The host
//! creates it from configuration and previously persisted state, registers
//! debugger back-ends through [`Registration`], binds commands through
//! [`CommandRegistry`], and asks for the persisted form when it saves.

pub mod commands;

pub use commands::{
    all_commands, keyboard_commands, panel_commands, CommandId, CommandOutcome, CommandRegistry,
    CommandSpec, EditorContext, NoEditor,
};

use std::path::Path;
use std::sync::Arc;

use futures_util::future::join_all;

use crate::backend::{DebuggerApi, LaunchConfig};
use crate::common::config::Config;
use crate::common::Result;
use crate::session::Debugger;
use crate::store::{self, Action, PersistedState, State, Store, StoreConfig};

/// What a host supplies when registering a debugger
#[derive(Clone)]
pub struct DebuggerDefinition {
    pub api: Arc<dyn DebuggerApi>,
    pub configs: Vec<LaunchConfig>,
    /// Source scopes (languages) the debugger handles
    pub scopes: Vec<String>,
}

/// The debug front-end
pub struct Frontend {
    debugger: Debugger,
}

impl Frontend {
    /// Build a front-end, restoring `persisted` when given
    pub fn new(config: &Config, persisted: Option<PersistedState>) -> Self {
        let state = persisted.map(State::restore).unwrap_or_default();
        let store = Store::new(state, StoreConfig::from(config));
        store.dispatch(Action::InitStore);
        tracing::debug!(
            debuggers = store.get_state().debuggers.len(),
            "Front-end initialised"
        );
        Self {
            debugger: Debugger::new(store),
        }
    }

    /// Build a front-end from the state file at `path`
    ///
    /// A missing file starts fresh; an unreadable one is an error.
    pub fn load(config: &Config, path: &Path) -> Result<Self> {
        let persisted = store::load_state(path)?;
        Ok(Self::new(config, persisted))
    }

    pub fn store(&self) -> &Store {
        self.debugger.store()
    }

    pub fn debugger(&self) -> &Debugger {
        &self.debugger
    }

    /// Registration handle for debugger providers
    pub fn provide(&self) -> Registration {
        Registration {
            store: self.store().clone(),
        }
    }

    pub fn commands<E: EditorContext>(&self, editor: E) -> CommandRegistry<E> {
        CommandRegistry::new(self.debugger.clone(), editor)
    }

    /// Persisted form of the current state
    pub fn serialize(&self) -> PersistedState {
        self.store().get_state().serialize()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        store::save_state(path, &self.serialize())
    }

    /// Stop every running debugger
    pub async fn shutdown(&self) {
        let names: Vec<String> = self
            .store()
            .get_state()
            .get_debuggers()
            .map(|s| s.name.clone())
            .collect();
        tracing::info!(count = names.len(), "Shutting down debuggers");
        join_all(names.iter().map(|name| self.debugger.stop(name))).await;
    }
}

/// Interface handed to debugger providers
#[derive(Clone)]
pub struct Registration {
    store: Store,
}

impl Registration {
    /// Register a back-end under `name`, keeping breakpoints already
    /// recorded for that name
    pub fn add_debugger(&self, name: &str, definition: DebuggerDefinition) {
        tracing::info!(debugger = %name, configs = definition.configs.len(), "Debugger registered");
        self.store.dispatch(Action::AddDebugger {
            name: name.to_string(),
            api: Some(definition.api),
            configs: definition.configs,
            scopes: definition.scopes,
        });
    }

    /// Detach the back-end registered under `name`
    pub fn remove_debugger(&self, name: &str) {
        tracing::info!(debugger = %name, "Debugger removed");
        self.store.dispatch(Action::RemoveDebugger {
            name: name.to_string(),
        });
    }

    pub fn update_configs(&self, name: &str, configs: Vec<LaunchConfig>) {
        self.store.dispatch(Action::UpdateConfigs {
            name: name.to_string(),
            configs,
        });
    }

    /// Append debuggee or debugger output to the log under `name`
    pub fn add_output_message(&self, name: &str, message: impl Into<String>) {
        self.store.add_output_message(name, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{BreakpointState, SessionState};
    use crate::testing::{FakeApi, Op};

    fn definition(fake: &Arc<FakeApi>) -> DebuggerDefinition {
        DebuggerDefinition {
            api: fake.clone() as Arc<dyn DebuggerApi>,
            configs: vec![LaunchConfig::named("cfg")],
            scopes: vec!["source.python".to_string()],
        }
    }

    fn persisted() -> PersistedState {
        serde_json::from_str(
            r#"{
                "panel": {"visible": 1, "width": 320},
                "debuggers": {"py": {"name": "py", "breakpoints": [
                    {"file": "/a.py", "line": 3, "state": "valid"}
                ]}}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_new_repairs_persisted_state() {
        let frontend = Frontend::new(&Config::default(), Some(persisted()));
        let state = frontend.store().get_state();

        assert_eq!(state.panel.visible, Some(true));
        assert_eq!(state.panel.width, Some(320));
        let session = state.session("py").unwrap();
        assert!(!session.is_live());
        assert_eq!(session.breakpoints[0].state, BreakpointState::NotStarted);
        // definitions are not offered as debuggers
        assert_eq!(state.get_debuggers().count(), 0);
    }

    #[test]
    fn test_fresh_panel_uses_config_default() {
        let mut config = Config::default();
        config.panel.initial_visible = false;
        let frontend = Frontend::new(&config, None);
        assert_eq!(frontend.store().get_state().panel.visible, Some(false));
    }

    #[test]
    fn test_registration_keeps_restored_breakpoints() {
        let frontend = Frontend::new(&Config::default(), Some(persisted()));
        let fake = FakeApi::new();
        let registration = frontend.provide();
        registration.add_debugger("py", definition(&fake));

        let state = frontend.store().get_state();
        let session = state.get_debugger(Some("py")).unwrap();
        assert_eq!(session.breakpoints.len(), 1);
        assert_eq!(session.configs[0].name, "cfg");

        registration.update_configs("py", vec![LaunchConfig::named("a"), LaunchConfig::named("b")]);
        assert_eq!(frontend.store().get_state().session("py").unwrap().configs.len(), 2);

        registration.add_output_message("py", "hello from py");
        let state = frontend.store().get_state();
        assert_eq!(state.output.messages[0].name, "py");

        registration.remove_debugger("py");
        assert!(frontend.store().get_state().get_debugger(Some("py")).is_none());
    }

    #[test]
    fn test_serialize_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let frontend = Frontend::new(&Config::default(), Some(persisted()));
        frontend.save(&path).unwrap();

        let reloaded = Frontend::load(&Config::default(), &path).unwrap();
        assert_eq!(reloaded.serialize(), frontend.serialize());
    }

    #[tokio::test]
    async fn test_shutdown_stops_running_debuggers() {
        let frontend = Frontend::new(&Config::default(), None);
        let running = FakeApi::new();
        let idle = FakeApi::new();
        frontend.provide().add_debugger("py", definition(&running));
        frontend.provide().add_debugger("go", definition(&idle));
        frontend.store().dispatch(Action::SetState {
            name: "py".to_string(),
            state: SessionState::Waiting,
        });

        frontend.shutdown().await;

        assert_eq!(running.count(Op::Stop), 1);
        assert_eq!(idle.count(Op::Stop), 0);
        assert!(!frontend.debugger().is_started("py"));
    }
}
