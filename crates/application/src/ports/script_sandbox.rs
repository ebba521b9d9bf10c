//! Script sandbox port

use std::time::Duration;

use async_trait::async_trait;
use courier_domain::scripting::{ScriptContext, ScriptOutcome};

/// Port for running user scripts in isolation.
///
/// The sandbox sees only the [`ScriptContext`] it is given. Failures are
/// reported inside the outcome, never as an `Err`: a broken script must not
/// break the send.
#[async_trait]
pub trait ScriptSandbox: Send + Sync {
    /// Runs `source` and returns its result and variable writes.
    ///
    /// Implementations stop the script once `timeout` elapses and report a
    /// timeout error, keeping the console lines emitted before it.
    async fn run(&self, source: &str, context: ScriptContext, timeout: Duration) -> ScriptOutcome;
}
