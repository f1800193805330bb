//! Values exchanged with a debugger back-end
//!
//! Field names follow the camelCase shape hosts already use for their
//! back-ends (`threadID`, `hasChildren`, `parentPath`).

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::store::variables::VariableTree;

/// A named launch configuration
///
/// Only `name` is interpreted by the front-end; every other key is handed to
/// the back-end untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchConfig {
    pub name: String,
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl LaunchConfig {
    /// Create a configuration with no back-end options
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: Map::new(),
        }
    }
}

/// Arguments for starting a back-end
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartArgs {
    pub config: LaunchConfig,
    /// File that was active when the session was started
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

/// Execution state reported after resume or a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecState {
    /// The debuggee has exited
    #[serde(default)]
    pub exited: bool,
    /// Thread that stopped
    #[serde(rename = "threadID", default)]
    pub thread_id: i64,
}

impl ExecState {
    pub fn stopped(thread_id: i64) -> Self {
        Self {
            exited: false,
            thread_id,
        }
    }

    pub fn exited() -> Self {
        Self {
            exited: true,
            thread_id: 0,
        }
    }
}

/// A debuggee thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: i64,
    #[serde(default)]
    pub func: String,
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub line: u32,
}

/// One stacktrace entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub id: i64,
    #[serde(default)]
    pub func: String,
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub line: u32,
    /// Lazily loaded variables; `None` until something was loaded
    #[serde(
        default,
        skip_serializing,
        deserialize_with = "deserialize_variables"
    )]
    pub variables: Option<Arc<VariableTree>>,
}

impl Frame {
    pub fn new(id: i64, func: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Self {
            id,
            func: func.into(),
            file: file.into(),
            line,
            variables: None,
        }
    }

    /// Attach an initial set of variables
    pub fn with_variables(mut self, variables: VariableMap) -> Self {
        self.variables = Some(Arc::new(VariableTree::from_map(variables)));
        self
    }
}

fn deserialize_variables<'de, D>(deserializer: D) -> Result<Option<Arc<VariableTree>>, D::Error>
where
    D: Deserializer<'de>,
{
    let map = Option::<VariableMap>::deserialize(deserializer)?;
    Ok(map.map(|m| Arc::new(VariableTree::from_map(m))))
}

/// A variable node as delivered by a back-end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub has_children: bool,
    /// Path of the parent node; empty for top-level variables
    #[serde(default)]
    pub parent_path: String,
    /// Children have been fetched
    #[serde(default)]
    pub loaded: bool,
}

impl Variable {
    pub fn new(name: impl Into<String>, value: impl Into<String>, parent_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            has_children: false,
            parent_path: parent_path.into(),
            loaded: false,
        }
    }

    /// Mark this variable as having children that can be loaded
    pub fn expandable(mut self) -> Self {
        self.has_children = true;
        self
    }
}

/// Variables keyed by their path
pub type VariableMap = BTreeMap<String, Variable>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_config_keeps_backend_options() {
        let config: LaunchConfig =
            serde_json::from_str(r#"{"name":"cfg","program":"/a.py","stopOnEntry":true}"#)
                .unwrap();
        assert_eq!(config.name, "cfg");
        assert_eq!(config.options.get("program"), Some(&Value::from("/a.py")));
        assert_eq!(config.options.get("stopOnEntry"), Some(&Value::from(true)));
    }

    #[test]
    fn test_exec_state_wire_names() {
        let state: ExecState = serde_json::from_str(r#"{"exited":false,"threadID":7}"#).unwrap();
        assert_eq!(state, ExecState::stopped(7));
        let exited: ExecState = serde_json::from_str(r#"{"exited":true}"#).unwrap();
        assert!(exited.exited);
    }

    #[test]
    fn test_frame_deserializes_variables_into_tree() {
        let frame: Frame = serde_json::from_str(
            r#"{"id":1,"func":"main","file":"/a.py","line":3,
                "variables":{"x":{"name":"x","value":"1"}}}"#,
        )
        .unwrap();
        let tree = frame.variables.expect("variables");
        assert_eq!(tree.get("x").map(|v| v.value.as_str()), Some("1"));
    }
}
