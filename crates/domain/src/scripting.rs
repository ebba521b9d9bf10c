//! Pre-request and test script contract.
//!
//! These types describe what goes into a script run and what comes out of it.
//! How a script is executed is up to the sandbox adapter; the core only ever
//! sees a [`ScriptContext`] going in and a [`ScriptOutcome`] coming back.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::request::Protocol;
use crate::response::RawResponse;

/// Level attached to a console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// `[ERROR]`
    Error,
    /// `[WARN]`
    Warn,
    /// `[INFO]`
    Info,
    /// `[DEBUG]`
    Debug,
    /// Untagged, the default for `log(...)`
    #[default]
    Log,
}

impl LogLevel {
    /// Returns the bracketed tag, or `None` for untagged lines.
    #[must_use]
    pub const fn tag(&self) -> Option<&'static str> {
        match self {
            Self::Error => Some("[ERROR]"),
            Self::Warn => Some("[WARN]"),
            Self::Info => Some("[INFO]"),
            Self::Debug => Some("[DEBUG]"),
            Self::Log => None,
        }
    }
}

/// One console line, in emission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleLog {
    /// Level the line was emitted at.
    pub level: LogLevel,
    /// The text, without the tag.
    pub message: String,
}

impl ConsoleLog {
    /// Creates a console line.
    #[must_use]
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConsoleLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level.tag() {
            Some(tag) => write!(f, "{tag} {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Result of one named assertion registered by a test script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    /// Assertion name as written in the script.
    pub name: String,
    /// Whether the assertion held.
    pub passed: bool,
    /// Failure detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TestResult {
    /// A passing assertion.
    #[must_use]
    pub fn pass(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            error: None,
        }
    }

    /// A failing assertion.
    #[must_use]
    pub fn fail(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            error: Some(error.into()),
        }
    }
}

/// Everything one script run produced. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScriptExecutionResult {
    /// Console lines in emission order
    pub console_logs: Vec<ConsoleLog>,
    /// Uncaught error or timeout, if the script did not finish cleanly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock duration
    #[serde(rename = "duration")]
    pub duration_ms: u64,
    /// Assertions, present for test scripts only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_results: Option<Vec<TestResult>>,
}

impl ScriptExecutionResult {
    /// A run that finished without error.
    #[must_use]
    pub const fn completed(console_logs: Vec<ConsoleLog>, duration_ms: u64) -> Self {
        Self {
            console_logs,
            error: None,
            duration_ms,
            test_results: None,
        }
    }

    /// A run aborted by an uncaught error. Lines emitted before it are kept.
    #[must_use]
    pub fn failed(console_logs: Vec<ConsoleLog>, error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            console_logs,
            error: Some(error.into()),
            duration_ms,
            test_results: None,
        }
    }

    /// A run stopped by the wall-clock limit.
    #[must_use]
    pub fn timed_out(console_logs: Vec<ConsoleLog>, limit_ms: u64) -> Self {
        Self::failed(
            console_logs,
            format!("Script timed out after {limit_ms}ms"),
            limit_ms,
        )
    }

    /// Attaches test results.
    #[must_use]
    pub fn with_test_results(mut self, results: Vec<TestResult>) -> Self {
        self.test_results = Some(results);
        self
    }

    /// Returns true when the script ran to the end.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Number of passing assertions.
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.test_results
            .as_deref()
            .map_or(0, |r| r.iter().filter(|t| t.passed).count())
    }

    /// Number of failing assertions.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.test_results
            .as_deref()
            .map_or(0, |r| r.iter().filter(|t| !t.passed).count())
    }
}

/// Which hook a script runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptPhase {
    /// Before the transport call. Writes go to the local scope.
    PreRequest,
    /// After the transport call. Can read the response and register tests.
    Test,
}

/// Read-only facts about the request being sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRequestInfo {
    /// Request name
    pub name: String,
    /// URL as resolved so far
    pub url: String,
    /// Protocol of the request
    pub protocol: Protocol,
    /// HTTP method, when the request is `http`
    pub method: Option<String>,
}

/// Everything a script may see. Nothing else crosses into the sandbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptContext {
    /// Which hook is running
    pub phase: ScriptPhase,
    /// Effective variable values after scope precedence
    pub variables: IndexMap<String, String>,
    /// The request
    pub request: ScriptRequestInfo,
    /// The response, for test scripts
    pub response: Option<RawResponse>,
}

impl ScriptContext {
    /// Context for a pre-request script.
    #[must_use]
    pub const fn pre_request(variables: IndexMap<String, String>, request: ScriptRequestInfo) -> Self {
        Self {
            phase: ScriptPhase::PreRequest,
            variables,
            request,
            response: None,
        }
    }

    /// Context for a test script.
    #[must_use]
    pub const fn test(
        variables: IndexMap<String, String>,
        request: ScriptRequestInfo,
        response: RawResponse,
    ) -> Self {
        Self {
            phase: ScriptPhase::Test,
            variables,
            request,
            response: Some(response),
        }
    }
}

/// Result of a run plus the variable writes it made.
///
/// A `None` write means the script unset the name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScriptOutcome {
    /// The result record.
    pub result: ScriptExecutionResult,
    /// Writes in the order they were made, last write per name wins.
    pub variable_writes: IndexMap<String, Option<String>>,
}

impl ScriptOutcome {
    /// An outcome without variable writes.
    #[must_use]
    pub fn from_result(result: ScriptExecutionResult) -> Self {
        Self {
            result,
            variable_writes: IndexMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_console_log_display() {
        assert_eq!(ConsoleLog::new(LogLevel::Warn, "slow").to_string(), "[WARN] slow");
        assert_eq!(ConsoleLog::new(LogLevel::Log, "plain").to_string(), "plain");
    }

    #[test]
    fn test_timed_out_keeps_logs() {
        let logs = vec![ConsoleLog::new(LogLevel::Info, "started")];
        let result = ScriptExecutionResult::timed_out(logs.clone(), 50);
        assert!(!result.is_success());
        assert_eq!(result.console_logs, logs);
        assert_eq!(result.error.as_deref(), Some("Script timed out after 50ms"));
    }

    #[test]
    fn test_counts() {
        let result = ScriptExecutionResult::completed(vec![], 1).with_test_results(vec![
            TestResult::pass("a"),
            TestResult::fail("b", "expected 200"),
            TestResult::pass("c"),
        ]);
        assert_eq!(result.passed_count(), 2);
        assert_eq!(result.failed_count(), 1);
    }

    #[test]
    fn test_result_json_shape() {
        let result = ScriptExecutionResult::completed(vec![ConsoleLog::new(LogLevel::Error, "x")], 3);
        let json = serde_json::to_value(&result).unwrap_or_default();
        assert_eq!(
            json,
            serde_json::json!({
                "consoleLogs": [{"level": "error", "message": "x"}],
                "duration": 3
            })
        );
    }
}
