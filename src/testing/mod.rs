//! Scenario test tooling
//!
//! A scriptable fake back-end plus a runner that executes declarative YAML
//! scenarios against it. Assertions are made against structured store
//! state rather than fragile string matching.

mod config;
mod fake;
mod runner;

pub use config::*;
pub use fake::{Call, FakeApi, Op, Response};
pub use runner::{execute_scenario, load_scenario, run_scenario, TestResult};
