//! Versioned state store
//!
//! One [`Store`] owns the whole state tree: debugger sessions, breakpoints,
//! UI selection, the output log and panel visibility. State only changes
//! through [`Store::dispatch`], which runs the pure reducers and never
//! suspends. Handles are cheap clones of the same store; independent stores
//! can coexist (tests create one per case).

mod action;
pub mod breakpoints;
mod persist;
mod reducer;
mod state;
pub mod variables;

pub use action::Action;
pub use persist::{
    load_state, save_state, PersistedBreakpoint, PersistedDebugger, PersistedPanel,
    PersistedState,
};
pub use reducer::reduce;
pub use state::{
    Breakpoint, BreakpointState, Output, OutputMessage, Panel, Session, SessionState, State,
    VariablesView,
};
pub use variables::VariableTree;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use crate::common::config::Config;

/// Settings the reducers need besides the action itself
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Panel visibility used when the stored flag is unusable
    pub panel_visible: bool,
    pub panel_width: Option<u32>,
    /// Oldest output messages are dropped beyond this count
    pub max_output_messages: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            panel_visible: true,
            panel_width: None,
            max_output_messages: 10_000,
        }
    }
}

impl From<&Config> for StoreConfig {
    fn from(config: &Config) -> Self {
        Self {
            panel_visible: config.panel.initial_visible,
            panel_width: config.panel.initial_width,
            max_output_messages: config.output.max_messages,
        }
    }
}

/// Callback invoked after a dispatch changed the state
pub type Listener = Arc<dyn Fn(&State) + Send + Sync>;

struct Inner {
    state: RwLock<Arc<State>>,
    version: AtomicU64,
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_listener: AtomicU64,
    config: StoreConfig,
}

/// Handle to a state store
#[derive(Clone)]
pub struct Store {
    inner: Arc<Inner>,
}

impl Store {
    /// Create a store holding `initial`
    ///
    /// The state is used as given; dispatch [`Action::InitStore`] when it
    /// was restored from persisted data.
    pub fn new(initial: State, config: StoreConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(Arc::new(initial)),
                version: AtomicU64::new(0),
                listeners: Mutex::new(Vec::new()),
                next_listener: AtomicU64::new(1),
                config,
            }),
        }
    }

    /// Current snapshot
    pub fn get_state(&self) -> Arc<State> {
        let state = self.inner.state.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*state)
    }

    /// Number of dispatches that changed the state
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::Acquire)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Apply an action and return the resulting snapshot
    ///
    /// Listeners run after the new state is in place and only when some
    /// subtree changed. They may dispatch again.
    pub fn dispatch(&self, action: Action) -> Arc<State> {
        let (next, changed) = {
            let mut current = self.inner.state.write().unwrap_or_else(PoisonError::into_inner);
            let next = reduce(&current, &action, &self.inner.config);
            if next.same_as(&current) {
                (Arc::clone(&*current), false)
            } else {
                let next = Arc::new(next);
                *current = Arc::clone(&next);
                self.inner.version.fetch_add(1, Ordering::AcqRel);
                (next, true)
            }
        };

        tracing::trace!(action = ?action, changed, "dispatch");

        if changed {
            let listeners: Vec<Listener> = self
                .inner
                .listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .iter()
                .map(|(_, l)| Arc::clone(l))
                .collect();
            for listener in listeners {
                listener(&next);
            }
        }

        next
    }

    /// Register a listener; dropping or unsubscribing the returned handle
    /// removes it
    #[must_use = "the listener is removed when the subscription is dropped"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&State) + Send + Sync + 'static,
    {
        let id = self.inner.next_listener.fetch_add(1, Ordering::Relaxed);
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        Subscription {
            id,
            store: Arc::downgrade(&self.inner),
        }
    }

    /// Append a line to the output log
    pub fn add_output_message(&self, name: &str, message: impl Into<String>) {
        self.dispatch(Action::AddOutputMessage {
            name: name.to_string(),
            message: message.into(),
        });
    }
}

/// Active store subscription
pub struct Subscription {
    id: u64,
    store: Weak<Inner>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.store.upgrade() {
            inner
                .listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn store() -> Store {
        Store::new(State::default(), StoreConfig::default())
    }

    #[test]
    fn test_listener_called_once_per_change() {
        let store = store();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let _sub = store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        store.dispatch(Action::TogglePanel { visible: Some(true) });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.version(), 1);

        // unknown session: nothing changes, nobody is told
        store.dispatch(Action::Stop {
            name: "nope".to_string(),
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let store = store();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let sub = store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        store.dispatch(Action::CleanOutput);
        sub.unsubscribe();
        store.add_output_message("debug", "hello");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listener_may_dispatch() {
        let store = store();
        let inner = store.clone();
        let _sub = store.subscribe(move |state| {
            if state.output.messages.len() == 1 {
                inner.add_output_message("debug", "echo");
            }
        });
        store.add_output_message("debug", "first");
        assert_eq!(store.get_state().output.messages.len(), 2);
    }

    #[test]
    fn test_get_state_is_latest_snapshot() {
        let store = store();
        let before = store.get_state();
        let returned = store.dispatch(Action::SetPanelWidth { width: 10 });
        let after = store.get_state();
        assert!(Arc::ptr_eq(&returned, &after));
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(before.panel.width, None);
        assert_eq!(after.panel.width, Some(10));
    }
}
