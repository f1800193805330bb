//! Test runner implementation
//!
//! Executes test scenarios against a fresh front-end whose debuggers are
//! backed by [`FakeApi`]s, asserting on structured store state rather than
//! on rendered output.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use colored::Colorize;

use crate::backend::{DebuggerApi, LaunchConfig};
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::frontend::{CommandOutcome, CommandRegistry, DebuggerDefinition, EditorContext, Frontend};

use super::config::{
    BreakpointAssertion, EditorSetup, ScriptedResponse, SessionExpectation, TestScenario, TestStep,
};
use super::fake::{FakeApi, Op};

/// Result of a test run
#[derive(Debug)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub steps_run: usize,
    pub steps_total: usize,
    pub error: Option<String>,
}

/// Editor backed by the scenario's `editor` section
struct ScenarioEditor(Option<EditorSetup>);

impl EditorContext for ScenarioEditor {
    fn current_file(&self) -> Option<String> {
        self.0.as_ref().map(|e| e.file.clone())
    }

    fn current_line(&self) -> Option<u32> {
        self.0.as_ref().map(|e| e.line)
    }

    fn current_scope(&self) -> Option<String> {
        self.0.as_ref().and_then(|e| e.scope.clone())
    }
}

struct Harness {
    frontend: Frontend,
    commands: CommandRegistry<ScenarioEditor>,
    fakes: HashMap<String, Arc<FakeApi>>,
}

impl Harness {
    fn new(scenario: &TestScenario) -> Self {
        let frontend = Frontend::new(&Config::default(), None);
        let registration = frontend.provide();
        let mut fakes = HashMap::new();

        for setup in &scenario.debuggers {
            let fake = FakeApi::new();
            for scripted in &setup.script {
                fake.push(scripted.op, scripted.response.clone());
            }
            registration.add_debugger(
                &setup.name,
                DebuggerDefinition {
                    api: fake.clone() as Arc<dyn DebuggerApi>,
                    configs: setup.configs.iter().map(LaunchConfig::named).collect(),
                    scopes: setup.scopes.clone(),
                },
            );
            fakes.insert(setup.name.clone(), fake);
        }

        let commands = frontend.commands(ScenarioEditor(scenario.editor.clone()));
        Self {
            frontend,
            commands,
            fakes,
        }
    }

    fn fake(&self, debugger: &str) -> Result<&Arc<FakeApi>> {
        self.fakes
            .get(debugger)
            .ok_or_else(|| Error::Scenario(format!("Debugger '{}' is not declared", debugger)))
    }
}

/// Load a scenario file
pub fn load_scenario(path: &Path) -> Result<TestScenario> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
    serde_yaml::from_str(&content)
        .map_err(|e| Error::Scenario(format!("Failed to parse test scenario: {}", e)))
}

/// Run a test scenario from a YAML file
pub async fn run_scenario(path: &Path, verbose: bool) -> Result<TestResult> {
    let scenario = load_scenario(path)?;
    Ok(execute_scenario(&scenario, verbose).await)
}

/// Run an already parsed scenario, printing progress
pub async fn execute_scenario(scenario: &TestScenario, verbose: bool) -> TestResult {
    let steps_total = scenario.steps.len();

    println!(
        "\n{} {}",
        "Running Test:".blue().bold(),
        scenario.name.white().bold()
    );

    if let Some(desc) = &scenario.description {
        println!("  {}", desc.dimmed());
    }

    let harness = Harness::new(scenario);
    if verbose {
        for setup in &scenario.debuggers {
            println!(
                "  Debugger: {} ({} scripted responses)",
                setup.name.dimmed(),
                setup.script.len()
            );
        }
    }

    println!("\n{}", "Steps:".cyan());

    for (i, step) in scenario.steps.iter().enumerate() {
        let step_num = i + 1;

        if let Err(e) = execute_step(&harness, step, verbose).await {
            println!("  {} Step {}: {}", "✗".red(), step_num, e);
            harness.frontend.shutdown().await;

            return TestResult {
                name: scenario.name.clone(),
                passed: false,
                steps_run: step_num,
                steps_total,
                error: Some(e.to_string()),
            };
        }
        println!("  {} Step {}: {}", "✓".green(), step_num, describe(step).dimmed());
    }

    harness.frontend.shutdown().await;

    println!(
        "\n{} {}\n",
        "✓".green().bold(),
        "Test Passed".green().bold()
    );

    TestResult {
        name: scenario.name.clone(),
        passed: true,
        steps_run: steps_total,
        steps_total,
        error: None,
    }
}

fn describe(step: &TestStep) -> String {
    match step {
        TestStep::SelectDebugger { debugger } => format!("select debugger {}", debugger),
        TestStep::SelectConfig { debugger, config } => {
            format!("select config {} on {}", config, debugger)
        }
        TestStep::Command { command, .. } => format!("command {}", command),
        TestStep::Start { debugger, config, .. } => format!("start {} with {}", debugger, config),
        TestStep::Stop { debugger } => format!("stop {}", debugger),
        TestStep::Resume { debugger } => format!("resume {}", debugger),
        TestStep::Next { debugger } => format!("next {}", debugger),
        TestStep::StepIn { debugger } => format!("step in {}", debugger),
        TestStep::StepOut { debugger } => format!("step out {}", debugger),
        TestStep::Restart { debugger } => format!("restart {}", debugger),
        TestStep::AddBreakpoint { file, line, .. } => format!("add breakpoint {}:{}", file, line),
        TestStep::RemoveBreakpoint { file, line, .. } => {
            format!("remove breakpoint {}:{}", file, line)
        }
        TestStep::ToggleBreakpoint { file, line, .. } => {
            format!("toggle breakpoint {}:{}", file, line)
        }
        TestStep::SelectThread { id, .. } => format!("select thread {}", id),
        TestStep::SelectStacktrace { index, .. } => format!("select stacktrace {}", index),
        TestStep::Script { response, .. } => format!("script {:?}", response.op),
        TestStep::ExpectSession { debugger, .. } => format!("expect session {}", debugger),
        TestStep::ExpectCalls { debugger, .. } => format!("expect calls on {}", debugger),
        TestStep::CheckOutput { .. } => "check output".to_string(),
    }
}

/// Execute a single test step
async fn execute_step(harness: &Harness, step: &TestStep, verbose: bool) -> Result<()> {
    let debugger = harness.frontend.debugger();

    match step {
        TestStep::SelectDebugger { debugger: name } => debugger.select_debugger(name),
        TestStep::SelectConfig {
            debugger: name,
            config,
        } => debugger.select_config(name, config),
        TestStep::Command { command, executed } => {
            let outcome = harness.commands.execute_named(command).await?;
            let expected = executed.unwrap_or(true);
            let did_execute = outcome == CommandOutcome::Executed;
            if expected != did_execute {
                return Err(Error::TestAssertion(format!(
                    "Command '{}' expected executed={}, got {:?}",
                    command, expected, outcome
                )));
            }
        }
        TestStep::Start {
            debugger: name,
            config,
            file,
        } => {
            let session = harness.frontend.store().get_state().session(name).cloned();
            let config = session
                .and_then(|s| s.configs.iter().find(|c| &c.name == config).cloned())
                .ok_or_else(|| Error::config_not_found(name, config))?;
            debugger.start(name, &config, file.as_deref()).await;
        }
        TestStep::Stop { debugger: name } => debugger.stop(name).await,
        TestStep::Resume { debugger: name } => debugger.resume(name).await,
        TestStep::Next { debugger: name } => debugger.next(name).await,
        TestStep::StepIn { debugger: name } => debugger.step_in(name).await,
        TestStep::StepOut { debugger: name } => debugger.step_out(name).await,
        TestStep::Restart { debugger: name } => debugger.restart(name).await,
        TestStep::AddBreakpoint {
            debugger: name,
            file,
            line,
        } => debugger.add_breakpoint(name, file, *line).await,
        TestStep::RemoveBreakpoint {
            debugger: name,
            file,
            line,
        } => debugger.remove_breakpoint(name, file, *line).await,
        TestStep::ToggleBreakpoint {
            debugger: name,
            file,
            line,
        } => debugger.toggle_breakpoint(name, file, *line).await,
        TestStep::SelectThread { debugger: name, id } => debugger.select_thread(name, *id).await,
        TestStep::SelectStacktrace {
            debugger: name,
            index,
        } => debugger.select_stacktrace(name, *index).await,
        TestStep::Script {
            debugger: name,
            response: ScriptedResponse { op, response },
        } => {
            harness.fake(name)?.push(*op, response.clone());
        }
        TestStep::ExpectSession {
            debugger: name,
            expect,
        } => check_session(harness, name, expect, verbose)?,
        TestStep::ExpectCalls {
            debugger: name,
            ops,
            op,
            count,
        } => check_calls(harness.fake(name)?, ops.as_deref(), *op, *count, verbose)?,
        TestStep::CheckOutput { contains, count } => {
            check_output(harness, contains.as_deref(), *count, verbose)?
        }
    }
    Ok(())
}

fn check_session(
    harness: &Harness,
    name: &str,
    expect: &SessionExpectation,
    verbose: bool,
) -> Result<()> {
    let state = harness.frontend.store().get_state();
    let session = state
        .session(name)
        .ok_or_else(|| Error::UnknownDebugger(name.to_string()))?;

    if verbose {
        println!("    {}", format!("{:?}", session).dimmed());
    }

    if let Some(expected) = expect.state {
        if session.state != expected {
            return Err(Error::TestAssertion(format!(
                "Debugger '{}' expected state {}, got {}",
                name, expected, session.state
            )));
        }
    }

    if let Some(expected) = expect.threads {
        if session.threads.len() != expected {
            return Err(Error::TestAssertion(format!(
                "Debugger '{}' expected {} threads, got {}",
                name,
                expected,
                session.threads.len()
            )));
        }
    }

    if let Some(expected) = expect.stacktrace {
        if session.stacktrace.len() != expected {
            return Err(Error::TestAssertion(format!(
                "Debugger '{}' expected {} stacktrace entries, got {}",
                name,
                expected,
                session.stacktrace.len()
            )));
        }
    }

    if let Some(expected) = expect.selected_thread {
        if session.selected_thread != expected {
            return Err(Error::TestAssertion(format!(
                "Debugger '{}' expected thread {} selected, got {}",
                name, expected, session.selected_thread
            )));
        }
    }

    if let Some(expected) = expect.selected_stacktrace {
        if session.selected_stacktrace != expected {
            return Err(Error::TestAssertion(format!(
                "Debugger '{}' expected stacktrace entry {} selected, got {}",
                name, expected, session.selected_stacktrace
            )));
        }
    }

    if let Some(expected) = &expect.breakpoints {
        check_breakpoints(name, &session.breakpoints, expected)?;
    }

    Ok(())
}

fn check_breakpoints(
    name: &str,
    actual: &[crate::store::Breakpoint],
    expected: &[BreakpointAssertion],
) -> Result<()> {
    if actual.len() != expected.len() {
        return Err(Error::TestAssertion(format!(
            "Debugger '{}' expected {} breakpoints, got {}",
            name,
            expected.len(),
            actual.len()
        )));
    }

    for (i, (bp, exp)) in actual.iter().zip(expected).enumerate() {
        if bp.file != exp.file || bp.line != exp.line {
            return Err(Error::TestAssertion(format!(
                "Breakpoint {} expected at {}:{}, got {}:{}",
                i, exp.file, exp.line, bp.file, bp.line
            )));
        }
        if let Some(state) = exp.state {
            if bp.state != state {
                return Err(Error::TestAssertion(format!(
                    "Breakpoint {}:{} expected state {}, got {}",
                    bp.file, bp.line, state, bp.state
                )));
            }
        }
        if let Some(message) = &exp.message {
            if bp.message.as_deref() != Some(message.as_str()) {
                return Err(Error::TestAssertion(format!(
                    "Breakpoint {}:{} expected message '{}', got {:?}",
                    bp.file, bp.line, message, bp.message
                )));
            }
        }
    }

    Ok(())
}

fn check_calls(
    fake: &FakeApi,
    ops: Option<&[Op]>,
    op: Option<Op>,
    count: Option<usize>,
    verbose: bool,
) -> Result<()> {
    let actual = fake.ops();
    if verbose {
        println!("    {}", format!("{:?}", actual).dimmed());
    }

    if let Some(expected) = ops {
        if actual != expected {
            return Err(Error::TestAssertion(format!(
                "Expected calls {:?}, got {:?}",
                expected, actual
            )));
        }
    }

    match (op, count) {
        (Some(op), Some(count)) => {
            let seen = fake.count(op);
            if seen != count {
                return Err(Error::TestAssertion(format!(
                    "Expected {} {:?} calls, got {}",
                    count, op, seen
                )));
            }
        }
        (None, Some(count)) if actual.len() != count => {
            return Err(Error::TestAssertion(format!(
                "Expected {} calls, got {}",
                count,
                actual.len()
            )));
        }
        (Some(_), None) => {
            return Err(Error::Scenario(
                "expect_calls with 'op' requires 'count'".to_string(),
            ));
        }
        _ => {}
    }

    Ok(())
}

fn check_output(
    harness: &Harness,
    contains: Option<&str>,
    count: Option<usize>,
    verbose: bool,
) -> Result<()> {
    let state = harness.frontend.store().get_state();
    let messages = &state.output.messages;

    if verbose {
        for message in messages {
            println!("    [{}] {}", message.name.dimmed(), message.message.dimmed());
        }
    }

    if let Some(expected) = count {
        if messages.len() != expected {
            return Err(Error::TestAssertion(format!(
                "Expected {} output messages, got {}",
                expected,
                messages.len()
            )));
        }
    }

    if let Some(needle) = contains {
        if !messages.iter().any(|m| m.message.contains(needle)) {
            return Err(Error::TestAssertion(format!(
                "Output does not contain '{}'",
                needle
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario(yaml: &str) -> TestScenario {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[tokio::test]
    async fn test_passing_scenario() {
        let result = execute_scenario(
            &scenario(
                r#"
name: start and exit
debuggers:
  - name: py
    configs: [cfg]
    script:
      - op: resume
        response: {exec: {exited: true}}
steps:
  - action: start
    debugger: py
    config: cfg
  - action: expect_session
    debugger: py
    state: notStarted
    threads: 0
  - action: expect_calls
    debugger: py
    ops: [start, resume, stop]
  - action: check_output
    count: 2
    contains: Started
"#,
            ),
            false,
        )
        .await;
        assert!(result.passed, "{:?}", result.error);
        assert_eq!(result.steps_run, 4);
    }

    #[tokio::test]
    async fn test_failing_assertion_stops_run() {
        let result = execute_scenario(
            &scenario(
                r#"
name: wrong expectation
debuggers:
  - name: py
steps:
  - action: add_breakpoint
    debugger: py
    file: /a.py
    line: 1
  - action: expect_session
    debugger: py
    breakpoints:
      - {file: /a.py, line: 2}
  - action: stop
    debugger: py
"#,
            ),
            false,
        )
        .await;
        assert!(!result.passed);
        assert_eq!(result.steps_run, 2);
        assert!(result.error.unwrap().contains("expected at /a.py:2"));
    }

    #[tokio::test]
    async fn test_command_guard_expectation() {
        let result = execute_scenario(
            &scenario(
                r#"
name: guarded start
debuggers:
  - name: py
    configs: [cfg]
steps:
  - action: command
    command: debug:start
    executed: false
  - action: select_debugger
    debugger: py
  - action: select_config
    debugger: py
    config: cfg
  - action: command
    command: debug:start
  - action: expect_calls
    debugger: py
    op: start
    count: 1
"#,
            ),
            false,
        )
        .await;
        assert!(result.passed, "{:?}", result.error);
    }

    #[tokio::test]
    async fn test_expectation_on_unknown_debugger_fails() {
        let result = execute_scenario(
            &scenario(
                r#"
name: unknown debugger
debuggers:
  - name: py
steps:
  - action: expect_session
    debugger: go
    state: notStarted
"#,
            ),
            false,
        )
        .await;
        assert!(!result.passed);
        assert_eq!(result.error.as_deref(), Some("Unknown debugger 'go'"));
    }

    #[tokio::test]
    async fn test_missing_file_is_read_error() {
        let err = run_scenario(Path::new("/no/such/scenario.yaml"), false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }
}
