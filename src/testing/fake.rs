//! Scriptable in-memory back-end
//!
//! [`FakeApi`] answers every [`DebuggerApi`] call from a per-operation queue
//! of scripted responses and records each call it receives. Calls can be
//! held at the back-end boundary with [`FakeApi::hold`] to exercise
//! overlapping operations.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Notify;

use crate::backend::{DebuggerApi, ExecState, Frame, StartArgs, Thread, Variable, VariableMap};
use crate::common::{Error, Result};
use crate::store::Breakpoint;

/// Back-end operation names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    Start,
    Stop,
    AddBreakpoint,
    RemoveBreakpoint,
    Resume,
    Next,
    StepIn,
    StepOut,
    Restart,
    SelectStacktrace,
    SelectThread,
    GetStacktrace,
    GetThreads,
    LoadVariable,
}

/// A recorded call with its arguments
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Start(StartArgs),
    Stop,
    AddBreakpoint { file: String, line: u32 },
    RemoveBreakpoint { file: String, line: u32 },
    Resume,
    Next,
    StepIn,
    StepOut,
    Restart,
    SelectStacktrace(usize),
    SelectThread(i64),
    GetStacktrace(i64),
    GetThreads,
    LoadVariable(String),
}

impl Call {
    pub fn op(&self) -> Op {
        match self {
            Self::Start(_) => Op::Start,
            Self::Stop => Op::Stop,
            Self::AddBreakpoint { .. } => Op::AddBreakpoint,
            Self::RemoveBreakpoint { .. } => Op::RemoveBreakpoint,
            Self::Resume => Op::Resume,
            Self::Next => Op::Next,
            Self::StepIn => Op::StepIn,
            Self::StepOut => Op::StepOut,
            Self::Restart => Op::Restart,
            Self::SelectStacktrace(_) => Op::SelectStacktrace,
            Self::SelectThread(_) => Op::SelectThread,
            Self::GetStacktrace(_) => Op::GetStacktrace,
            Self::GetThreads => Op::GetThreads,
            Self::LoadVariable(_) => Op::LoadVariable,
        }
    }
}

/// Scripted answer to one call
///
/// A response whose kind does not fit the operation is treated like an
/// empty queue and the default answer is used.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Response {
    Ok,
    Fail(String),
    Exec(ExecState),
    Id(String),
    Frames(Vec<Frame>),
    Threads(Vec<Thread>),
    Variables(VariableMap),
}

#[derive(Default)]
struct Script {
    queues: HashMap<Op, VecDeque<Response>>,
    holds: HashMap<Op, Arc<Notify>>,
    calls: Vec<Call>,
}

/// In-memory [`DebuggerApi`]
///
/// Defaults when nothing is scripted: unit calls succeed, stepping stops on
/// thread 1, breakpoints get increasing numeric ids and queries return empty
/// lists.
#[derive(Default)]
pub struct FakeApi {
    script: Mutex<Script>,
    next_id: AtomicU64,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a response for the next unanswered call of `op`
    pub fn push(&self, op: Op, response: Response) -> &Self {
        self.script().queues.entry(op).or_default().push_back(response);
        self
    }

    pub fn fail(&self, op: Op, message: impl Into<String>) -> &Self {
        self.push(op, Response::Fail(message.into()))
    }

    /// Make calls of `op` wait until [`FakeApi::release`]
    pub fn hold(&self, op: Op) {
        self.script().holds.insert(op, Arc::new(Notify::new()));
    }

    /// Let held calls of `op` through, including one that has not arrived yet
    pub fn release(&self, op: Op) {
        if let Some(gate) = self.script().holds.remove(&op) {
            gate.notify_waiters();
            gate.notify_one();
        }
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<Call> {
        self.script().calls.clone()
    }

    pub fn count(&self, op: Op) -> usize {
        self.script().calls.iter().filter(|c| c.op() == op).count()
    }

    pub fn ops(&self) -> Vec<Op> {
        self.script().calls.iter().map(Call::op).collect()
    }

    async fn enter(&self, call: Call) -> Option<Response> {
        let op = call.op();
        let gate = {
            let mut script = self.script();
            script.calls.push(call);
            script.holds.get(&op).cloned()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.script().queues.get_mut(&op).and_then(VecDeque::pop_front)
    }

    async fn unit(&self, call: Call) -> Result<()> {
        match self.enter(call).await {
            Some(Response::Fail(message)) => Err(Error::backend(message)),
            _ => Ok(()),
        }
    }

    async fn exec(&self, call: Call) -> Result<ExecState> {
        match self.enter(call).await {
            Some(Response::Fail(message)) => Err(Error::backend(message)),
            Some(Response::Exec(state)) => Ok(state),
            _ => Ok(ExecState::stopped(1)),
        }
    }
}

#[async_trait]
impl DebuggerApi for FakeApi {
    async fn start(&self, args: StartArgs) -> Result<()> {
        self.unit(Call::Start(args)).await
    }

    async fn stop(&self) -> Result<()> {
        self.unit(Call::Stop).await
    }

    async fn add_breakpoint(&self, file: &str, line: u32) -> Result<String> {
        let call = Call::AddBreakpoint {
            file: file.to_string(),
            line,
        };
        match self.enter(call).await {
            Some(Response::Fail(message)) => Err(Error::backend(message)),
            Some(Response::Id(id)) => Ok(id),
            _ => Ok((self.next_id.fetch_add(1, Ordering::Relaxed) + 1).to_string()),
        }
    }

    async fn remove_breakpoint(&self, bp: &Breakpoint) -> Result<()> {
        self.unit(Call::RemoveBreakpoint {
            file: bp.file.clone(),
            line: bp.line,
        })
        .await
    }

    async fn resume(&self) -> Result<ExecState> {
        self.exec(Call::Resume).await
    }

    async fn next(&self) -> Result<ExecState> {
        self.exec(Call::Next).await
    }

    async fn step_in(&self) -> Result<ExecState> {
        self.exec(Call::StepIn).await
    }

    async fn step_out(&self) -> Result<ExecState> {
        self.exec(Call::StepOut).await
    }

    async fn restart(&self) -> Result<()> {
        self.unit(Call::Restart).await
    }

    async fn select_stacktrace(&self, index: usize) -> Result<()> {
        self.unit(Call::SelectStacktrace(index)).await
    }

    async fn select_thread(&self, id: i64) -> Result<()> {
        self.unit(Call::SelectThread(id)).await
    }

    async fn get_stacktrace(&self, thread_id: i64) -> Result<Vec<Frame>> {
        match self.enter(Call::GetStacktrace(thread_id)).await {
            Some(Response::Fail(message)) => Err(Error::backend(message)),
            Some(Response::Frames(frames)) => Ok(frames),
            _ => Ok(Vec::new()),
        }
    }

    async fn get_threads(&self) -> Result<Vec<Thread>> {
        match self.enter(Call::GetThreads).await {
            Some(Response::Fail(message)) => Err(Error::backend(message)),
            Some(Response::Threads(threads)) => Ok(threads),
            _ => Ok(Vec::new()),
        }
    }

    async fn load_variable(&self, path: &str, _variable: &Variable) -> Result<VariableMap> {
        match self.enter(Call::LoadVariable(path.to_string())).await {
            Some(Response::Fail(message)) => Err(Error::backend(message)),
            Some(Response::Variables(variables)) => Ok(variables),
            _ => Ok(VariableMap::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LaunchConfig;

    #[tokio::test]
    async fn test_scripted_responses_in_order() {
        let fake = FakeApi::new();
        fake.fail(Op::Resume, "boom")
            .push(Op::Resume, Response::Exec(ExecState::exited()));

        assert_eq!(fake.resume().await.unwrap_err().to_string(), "boom");
        assert!(fake.resume().await.unwrap().exited);
        assert_eq!(fake.resume().await.unwrap(), ExecState::stopped(1));
        assert_eq!(fake.count(Op::Resume), 3);
    }

    #[tokio::test]
    async fn test_breakpoint_ids_increase() {
        let fake = FakeApi::new();
        assert_eq!(fake.add_breakpoint("/a.py", 1).await.unwrap(), "1");
        assert_eq!(fake.add_breakpoint("/a.py", 2).await.unwrap(), "2");
        fake.push(Op::AddBreakpoint, Response::Id("x".to_string()));
        assert_eq!(fake.add_breakpoint("/a.py", 3).await.unwrap(), "x");
    }

    #[tokio::test]
    async fn test_records_arguments() {
        let fake = FakeApi::new();
        fake.start(StartArgs {
            config: LaunchConfig::named("cfg"),
            file: Some("/a.py".to_string()),
        })
        .await
        .unwrap();
        fake.get_stacktrace(7).await.unwrap();

        let calls = fake.calls();
        assert!(matches!(&calls[0], Call::Start(args) if args.config.name == "cfg"));
        assert_eq!(calls[1], Call::GetStacktrace(7));
    }

    #[tokio::test]
    async fn test_hold_until_release() {
        let fake = FakeApi::new();
        fake.hold(Op::Stop);

        let (result, ()) = tokio::join!(fake.stop(), async {
            tokio::task::yield_now().await;
            assert_eq!(fake.count(Op::Stop), 1);
            fake.release(Op::Stop);
        });
        assert!(result.is_ok());
    }

    #[test]
    fn test_response_from_yaml() {
        let response: Response = serde_yaml::from_str("exec: {exited: true}").unwrap();
        assert!(matches!(response, Response::Exec(state) if state.exited));

        let response: Response = serde_yaml::from_str("fail: denied").unwrap();
        assert!(matches!(response, Response::Fail(m) if m == "denied"));
    }
}
