//! Script sandbox backed by the DSL interpreter.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use courier_application::ports::ScriptSandbox;
use courier_domain::scripting::{
    ConsoleLog, ScriptContext, ScriptExecutionResult, ScriptOutcome, ScriptPhase, TestResult,
};
use indexmap::IndexMap;
use tokio::sync::mpsc;
use tracing::debug;

use super::executor::{Interpreter, ScriptEvent};
use super::parser::parse_script;

/// Runs scripts on their own task.
///
/// The task sees only its [`ScriptContext`] and talks back through a channel.
/// On timeout the task is aborted and the lines it had emitted are kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct DslSandbox;

impl DslSandbox {
    /// Creates a sandbox.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// Events received from the script task.
#[derive(Default)]
struct Collected {
    logs: Vec<ConsoleLog>,
    tests: Vec<TestResult>,
    writes: IndexMap<String, Option<String>>,
}

impl Collected {
    fn drain(&mut self, rx: &mut mpsc::UnboundedReceiver<ScriptEvent>) {
        while let Ok(event) = rx.try_recv() {
            match event {
                ScriptEvent::Log(line) => self.logs.push(line),
                ScriptEvent::Test(result) => self.tests.push(result),
                ScriptEvent::Write(name, value) => {
                    self.writes.insert(name, value);
                }
            }
        }
    }

    fn finish(self, phase: ScriptPhase, result: ScriptExecutionResult) -> ScriptOutcome {
        let mut result = ScriptExecutionResult {
            console_logs: self.logs,
            ..result
        };
        if phase == ScriptPhase::Test {
            result = result.with_test_results(self.tests);
        }
        ScriptOutcome {
            result,
            variable_writes: self.writes,
        }
    }
}

#[async_trait]
impl ScriptSandbox for DslSandbox {
    async fn run(&self, source: &str, context: ScriptContext, timeout: Duration) -> ScriptOutcome {
        let phase = context.phase;
        let started = Instant::now();
        let statements = match parse_script(source) {
            Ok(statements) => statements,
            Err(err) => {
                debug!(?phase, %err, "script rejected");
                return Collected::default()
                    .finish(phase, ScriptExecutionResult::failed(Vec::new(), err.to_string(), 0));
            }
        };

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut task = tokio::spawn(async move {
            Interpreter::new(context, tx).run(&statements).await
        });

        let finished = tokio::time::timeout(timeout, &mut task).await;
        if finished.is_err() {
            task.abort();
        }
        let mut collected = Collected::default();
        collected.drain(&mut rx);

        let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let limit_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        let result = match finished {
            Ok(Ok(Ok(()))) => ScriptExecutionResult::completed(Vec::new(), elapsed),
            Ok(Ok(Err(thrown))) => ScriptExecutionResult::failed(Vec::new(), thrown, elapsed),
            Ok(Err(join)) => {
                ScriptExecutionResult::failed(Vec::new(), format!("Script crashed: {join}"), elapsed)
            }
            Err(_) => ScriptExecutionResult::timed_out(Vec::new(), limit_ms),
        };
        collected.finish(phase, result)
    }
}
