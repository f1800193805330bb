//! Named front-end commands
//!
//! Commands are what editor key bindings and panel buttons invoke. Each one
//! resolves its target session from the store and checks its guard before
//! calling into the session layer.

use std::fmt;
use std::str::FromStr;

use crate::common::{Error, Result};
use crate::session::Debugger;
use crate::store::Action;

/// Command identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandId {
    Start,
    Resume,
    Next,
    StepIn,
    StepOut,
    Restart,
    Stop,
    ToggleBreakpoint,
    TogglePanel,
}

impl CommandId {
    pub fn spec(self) -> &'static CommandSpec {
        // the table is indexed in declaration order
        &COMMANDS[self as usize]
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.spec().cmd)
    }
}

impl FromStr for CommandId {
    type Err = Error;

    /// Accepts both `stepIn` and the binding form `debug:stepIn`
    fn from_str(s: &str) -> Result<Self> {
        let cmd = s.strip_prefix(BINDING_PREFIX).unwrap_or(s);
        COMMANDS
            .iter()
            .find(|spec| spec.cmd == cmd)
            .map(|spec| spec.id)
            .ok_or_else(|| Error::Config(format!("Unknown command '{}'", s)))
    }
}

/// Display metadata for a command
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub id: CommandId,
    /// Command name used in bindings
    pub cmd: &'static str,
    /// Button label, for commands shown as text
    pub text: Option<&'static str>,
    /// Octicon name, for commands shown as icons
    pub icon: Option<&'static str>,
    pub title: Option<&'static str>,
}

const BINDING_PREFIX: &str = "debug:";

static COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        id: CommandId::Start,
        cmd: "start",
        text: Some("Start"),
        icon: None,
        title: Some("Start this configuration"),
    },
    CommandSpec {
        id: CommandId::Resume,
        cmd: "resume",
        text: None,
        icon: Some("triangle-right"),
        title: Some("Resume"),
    },
    CommandSpec {
        id: CommandId::Next,
        cmd: "next",
        text: None,
        icon: Some("arrow-right"),
        title: Some("Next"),
    },
    CommandSpec {
        id: CommandId::StepIn,
        cmd: "stepIn",
        text: None,
        icon: Some("arrow-down"),
        title: Some("Step in"),
    },
    CommandSpec {
        id: CommandId::StepOut,
        cmd: "stepOut",
        text: None,
        icon: Some("arrow-up"),
        title: Some("Step out"),
    },
    CommandSpec {
        id: CommandId::Restart,
        cmd: "restart",
        text: None,
        icon: Some("sync"),
        title: Some("Restart"),
    },
    CommandSpec {
        id: CommandId::Stop,
        cmd: "stop",
        text: None,
        icon: Some("primitive-square"),
        title: Some("Stop"),
    },
    CommandSpec {
        id: CommandId::ToggleBreakpoint,
        cmd: "toggle-breakpoint",
        text: None,
        icon: None,
        title: None,
    },
    CommandSpec {
        id: CommandId::TogglePanel,
        cmd: "toggle-panel",
        text: None,
        icon: None,
        title: None,
    },
];

const PANEL_COMMANDS: &[CommandId] = &[
    CommandId::Resume,
    CommandId::Next,
    CommandId::StepIn,
    CommandId::StepOut,
    CommandId::Restart,
    CommandId::Stop,
];

/// Every command, in table order
pub fn all_commands() -> &'static [CommandSpec] {
    COMMANDS
}

/// Key binding names (`debug:<cmd>`) for every command but toggle-panel
pub fn keyboard_commands() -> Vec<(String, CommandId)> {
    COMMANDS
        .iter()
        .filter(|spec| spec.id != CommandId::TogglePanel)
        .map(|spec| (format!("{}{}", BINDING_PREFIX, spec.cmd), spec.id))
        .collect()
}

/// Buttons shown in the debug panel toolbar, in order
pub fn panel_commands() -> impl Iterator<Item = &'static CommandSpec> {
    PANEL_COMMANDS.iter().map(|id| id.spec())
}

/// Where the user currently is in the editor
pub trait EditorContext: Send + Sync {
    /// Path of the active file
    fn current_file(&self) -> Option<String>;

    /// Zero-based cursor line
    fn current_line(&self) -> Option<u32>;

    /// Language scope of the active file, used to pick a debugger
    fn current_scope(&self) -> Option<String> {
        None
    }
}

/// Editor with nothing open
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEditor;

impl EditorContext for NoEditor {
    fn current_file(&self) -> Option<String> {
        None
    }

    fn current_line(&self) -> Option<u32> {
        None
    }
}

/// Result of executing a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Executed,
    /// A guard failed; nothing was called
    Skipped(&'static str),
}

/// Executes commands against the selected session
pub struct CommandRegistry<E> {
    debugger: Debugger,
    editor: E,
}

impl<E: EditorContext> CommandRegistry<E> {
    pub fn new(debugger: Debugger, editor: E) -> Self {
        Self { debugger, editor }
    }

    pub fn editor(&self) -> &E {
        &self.editor
    }

    /// Execute a command by binding name (`debug:stop`) or plain name
    pub async fn execute_named(&self, name: &str) -> Result<CommandOutcome> {
        let id = name.parse()?;
        Ok(self.execute(id).await)
    }

    pub async fn execute(&self, id: CommandId) -> CommandOutcome {
        let outcome = self.run(id).await;
        match &outcome {
            CommandOutcome::Executed => tracing::debug!(command = %id, "Command executed"),
            CommandOutcome::Skipped(reason) => {
                tracing::debug!(command = %id, reason, "Command skipped")
            }
        }
        outcome
    }

    async fn run(&self, id: CommandId) -> CommandOutcome {
        let state = self.debugger.store().get_state();

        match id {
            CommandId::TogglePanel => {
                self.debugger
                    .store()
                    .dispatch(Action::TogglePanel { visible: None });
                CommandOutcome::Executed
            }

            CommandId::ToggleBreakpoint => {
                let (Some(file), Some(line)) =
                    (self.editor.current_file(), self.editor.current_line())
                else {
                    return CommandOutcome::Skipped("no editor location");
                };
                let session = match self.editor.current_scope() {
                    Some(scope) => state.debugger_for_scope(&scope),
                    None => state.get_debugger(None),
                };
                let Some(session) = session else {
                    return CommandOutcome::Skipped("no debugger for this file");
                };
                let name = session.name.clone();
                self.debugger.toggle_breakpoint(&name, &file, line).await;
                CommandOutcome::Executed
            }

            CommandId::Start => {
                let Some(session) = state.get_debugger(None) else {
                    return CommandOutcome::Skipped("no debugger selected");
                };
                let Some(config) = session.selected_launch_config().cloned() else {
                    return CommandOutcome::Skipped("no configuration selected");
                };
                let name = session.name.clone();
                let file = self.editor.current_file();
                self.debugger.start(&name, &config, file.as_deref()).await;
                CommandOutcome::Executed
            }

            CommandId::Stop => {
                let Some(session) = state.get_debugger(None) else {
                    return CommandOutcome::Skipped("no debugger selected");
                };
                let name = session.name.clone();
                self.debugger.stop(&name).await;
                CommandOutcome::Executed
            }

            CommandId::Resume
            | CommandId::Next
            | CommandId::StepIn
            | CommandId::StepOut
            | CommandId::Restart => {
                let Some(session) = state.get_debugger(None).filter(|s| s.is_started()) else {
                    return CommandOutcome::Skipped("debugger not started");
                };
                let name = session.name.clone();
                match id {
                    CommandId::Resume => self.debugger.resume(&name).await,
                    CommandId::Next => self.debugger.next(&name).await,
                    CommandId::StepIn => self.debugger.step_in(&name).await,
                    CommandId::StepOut => self.debugger.step_out(&name).await,
                    _ => self.debugger.restart(&name).await,
                }
                CommandOutcome::Executed
            }
        }
    }
}
