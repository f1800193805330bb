//! Test scenario configuration types
//!
//! Defines the data structures for deserializing YAML test scenarios.

use serde::Deserialize;

use crate::store::{BreakpointState, SessionState};

use super::fake::{Op, Response};

/// A complete test scenario loaded from a YAML file
#[derive(Deserialize, Debug)]
pub struct TestScenario {
    /// Name of the test scenario
    pub name: String,
    /// Optional description of what the test verifies
    pub description: Option<String>,
    /// Debuggers registered before the first step, each backed by a fake
    #[serde(default)]
    pub debuggers: Vec<DebuggerSetup>,
    /// Editor location seen by commands such as toggle-breakpoint
    pub editor: Option<EditorSetup>,
    /// The sequence of test steps to execute
    pub steps: Vec<TestStep>,
}

/// A fake debugger to register
#[derive(Deserialize, Debug)]
pub struct DebuggerSetup {
    pub name: String,
    /// Launch configuration names
    #[serde(default)]
    pub configs: Vec<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Responses queued on the fake back-end up front
    #[serde(default)]
    pub script: Vec<ScriptedResponse>,
}

/// One queued back-end response
#[derive(Deserialize, Debug, Clone)]
pub struct ScriptedResponse {
    pub op: Op,
    pub response: Response,
}

/// Cursor position in the simulated editor
#[derive(Deserialize, Debug, Clone)]
pub struct EditorSetup {
    pub file: String,
    /// Zero-based line
    pub line: u32,
    pub scope: Option<String>,
}

/// A single test step in the execution flow
#[derive(Deserialize, Debug)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TestStep {
    SelectDebugger {
        debugger: String,
    },
    SelectConfig {
        debugger: String,
        config: String,
    },
    /// Execute a named command (e.g. "debug:start")
    Command {
        command: String,
        /// Whether the command's guards should let it through (default: true)
        executed: Option<bool>,
    },
    Start {
        debugger: String,
        config: String,
        file: Option<String>,
    },
    Stop {
        debugger: String,
    },
    Resume {
        debugger: String,
    },
    Next {
        debugger: String,
    },
    StepIn {
        debugger: String,
    },
    StepOut {
        debugger: String,
    },
    Restart {
        debugger: String,
    },
    AddBreakpoint {
        debugger: String,
        file: String,
        line: u32,
    },
    RemoveBreakpoint {
        debugger: String,
        file: String,
        line: u32,
    },
    ToggleBreakpoint {
        debugger: String,
        file: String,
        line: u32,
    },
    SelectThread {
        debugger: String,
        id: i64,
    },
    SelectStacktrace {
        debugger: String,
        index: usize,
    },
    /// Queue more back-end responses
    Script {
        debugger: String,
        #[serde(flatten)]
        response: ScriptedResponse,
    },
    /// Assert on a session's state
    ExpectSession {
        debugger: String,
        #[serde(flatten)]
        expect: SessionExpectation,
    },
    /// Assert on the calls the fake back-end received
    ExpectCalls {
        debugger: String,
        /// Exact sequence of every call so far
        ops: Option<Vec<Op>>,
        /// Operation to count, together with `count`
        op: Option<Op>,
        count: Option<usize>,
    },
    /// Check the output log
    CheckOutput {
        /// Expected substring in some message
        contains: Option<String>,
        /// Expected number of messages
        count: Option<usize>,
    },
}

/// Expectations for a session
#[derive(Deserialize, Debug, Default)]
pub struct SessionExpectation {
    pub state: Option<SessionState>,
    /// The complete breakpoint list, in order
    pub breakpoints: Option<Vec<BreakpointAssertion>>,
    /// Expected thread count
    pub threads: Option<usize>,
    /// Expected stacktrace length
    pub stacktrace: Option<usize>,
    pub selected_thread: Option<i64>,
    pub selected_stacktrace: Option<usize>,
}

/// Assertion for a breakpoint
#[derive(Deserialize, Debug)]
pub struct BreakpointAssertion {
    pub file: String,
    pub line: u32,
    pub state: Option<BreakpointState>,
    /// Expected failure message (exact match)
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scenario() {
        let yaml = r#"
name: Rejected breakpoint
debuggers:
  - name: py
    configs: [cfg]
    script:
      - op: add_breakpoint
        response: {fail: denied}
steps:
  - action: start
    debugger: py
    config: cfg
  - action: add_breakpoint
    debugger: py
    file: /a.py
    line: 3
  - action: expect_session
    debugger: py
    state: waiting
    breakpoints:
      - {file: /a.py, line: 3, state: invalid, message: denied}
  - action: expect_calls
    debugger: py
    op: add_breakpoint
    count: 1
"#;
        let scenario: TestScenario = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(scenario.debuggers[0].script[0].op, Op::AddBreakpoint);
        assert_eq!(scenario.steps.len(), 4);
        match &scenario.steps[2] {
            TestStep::ExpectSession { expect, .. } => {
                assert_eq!(expect.state, Some(SessionState::Waiting));
                let bps = expect.breakpoints.as_ref().unwrap();
                assert_eq!(bps[0].state, Some(BreakpointState::Invalid));
            }
            other => panic!("Expected ExpectSession, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_script_step() {
        let step: TestStep = serde_yaml::from_str(
            "action: script\ndebugger: py\nop: resume\nresponse: {exec: {exited: true}}\n",
        )
        .unwrap();
        assert!(matches!(
            step,
            TestStep::Script { response: ScriptedResponse { op: Op::Resume, .. }, .. }
        ));
    }
}
