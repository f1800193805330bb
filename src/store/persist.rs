//! Persisted form of the state
//!
//! Only what is meaningful across restarts is kept: panel layout and each
//! debugger's breakpoint locations. Live session fields never persist.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

use crate::common::{Error, Result};

use super::state::{Breakpoint, BreakpointState, Panel, Session, State};

/// Serializable snapshot handed to the host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub panel: PersistedPanel,
    #[serde(default)]
    pub debuggers: BTreeMap<String, PersistedDebugger>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedPanel {
    /// Anything but a boolean reads as missing and is repaired on init
    #[serde(default, deserialize_with = "lenient_bool")]
    pub visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedDebugger {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub breakpoints: Vec<PersistedBreakpoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedBreakpoint {
    pub file: String,
    pub line: u32,
    /// Written by older versions; read back but never written
    #[serde(default, skip_serializing)]
    pub state: Option<BreakpointState>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MaybeBool {
    Bool(bool),
    Other(serde::de::IgnoredAny),
}

fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<MaybeBool>::deserialize(deserializer)? {
        Some(MaybeBool::Bool(b)) => Some(b),
        Some(MaybeBool::Other(_)) | None => None,
    })
}

impl State {
    /// Rebuild a state tree from persisted data
    ///
    /// Sessions come back as definitions without a back-end. Dispatch
    /// `InitStore` afterwards to normalise breakpoints and the panel.
    pub fn restore(persisted: PersistedState) -> Self {
        let debuggers = persisted
            .debuggers
            .into_iter()
            .map(|(key, dbg)| {
                let name = if dbg.name.is_empty() { key.clone() } else { dbg.name };
                let mut breakpoints: Vec<Breakpoint> = Vec::new();
                for bp in dbg.breakpoints {
                    if super::breakpoints::index_of(&breakpoints, &bp.file, bp.line).is_none() {
                        breakpoints.push(Breakpoint::new(bp.file, bp.line, bp.state.unwrap_or_default()));
                    }
                }
                breakpoints.sort_by(|a, b| a.file.cmp(&b.file).then(a.line.cmp(&b.line)));
                let session = Session {
                    breakpoints: Arc::new(breakpoints),
                    ..Session::new(name.clone())
                };
                (name, Arc::new(session))
            })
            .collect();

        Self {
            panel: Arc::new(Panel {
                visible: persisted.panel.visible,
                width: persisted.panel.width,
            }),
            debuggers: Arc::new(debuggers),
            ..Self::default()
        }
    }

    /// Persisted form of this state
    pub fn serialize(&self) -> PersistedState {
        let debuggers = self
            .debuggers
            .values()
            .filter(|dbg| !dbg.name.is_empty())
            .map(|dbg| {
                let breakpoints = dbg
                    .breakpoints
                    .iter()
                    .map(|bp| PersistedBreakpoint {
                        file: bp.file.clone(),
                        line: bp.line,
                        state: None,
                    })
                    .collect();
                (
                    dbg.name.clone(),
                    PersistedDebugger {
                        name: dbg.name.clone(),
                        breakpoints,
                    },
                )
            })
            .collect();

        PersistedState {
            panel: PersistedPanel {
                visible: self.panel.visible,
                width: self.panel.width,
            },
            debuggers,
        }
    }
}

/// Read persisted state; a missing file yields `None`
pub fn load_state(path: &Path) -> Result<Option<PersistedState>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| Error::StateParse {
            path: path.display().to_string(),
            error: e.to_string(),
        })
}

/// Write persisted state as pretty JSON, creating parent directories
pub fn save_state(path: &Path, state: &PersistedState) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(state)?;
    std::fs::write(path, json)?;
    Ok(())
}
