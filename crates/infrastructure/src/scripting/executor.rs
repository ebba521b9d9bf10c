//! Statement interpreter.
//!
//! The interpreter owns its copy of the script context and reports
//! everything it does as [`ScriptEvent`]s over a channel, so whatever it
//! emitted before being stopped is still visible to the caller.

use std::sync::LazyLock;
use std::time::Duration;

use courier_domain::scripting::{ConsoleLog, ScriptContext, TestResult};
use indexmap::IndexMap;
use regex::{Captures, Regex};
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;

use super::parser::Statement;

#[allow(clippy::expect_used)]
static TEMPLATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([^{}]+?)\s*\}\}").expect("valid regex"));

/// Something a running script did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptEvent {
    /// A console line.
    Log(ConsoleLog),
    /// A `test(...)` result.
    Test(TestResult),
    /// A variable write; `None` unsets.
    Write(String, Option<String>),
}

/// Runs parsed statements against one context.
pub struct Interpreter {
    context: ScriptContext,
    variables: IndexMap<String, String>,
    events: UnboundedSender<ScriptEvent>,
}

impl Interpreter {
    /// Creates an interpreter that reports to `events`.
    #[must_use]
    pub fn new(context: ScriptContext, events: UnboundedSender<ScriptEvent>) -> Self {
        Self {
            variables: context.variables.clone(),
            context,
            events,
        }
    }

    /// Runs statements in order until one throws.
    ///
    /// # Errors
    ///
    /// Returns the thrown message from `throw(...)` or a failed `assert(...)`.
    pub async fn run(&mut self, statements: &[Statement]) -> Result<(), String> {
        for statement in statements {
            self.execute(statement).await?;
        }
        Ok(())
    }

    async fn execute(&mut self, statement: &Statement) -> Result<(), String> {
        match statement {
            Statement::Set { name, value } => {
                let value = self.interpolate(value);
                self.variables.insert(name.clone(), value.clone());
                self.emit(ScriptEvent::Write(name.clone(), Some(value)));
            }
            Statement::Unset { name } => {
                self.variables.shift_remove(name);
                self.emit(ScriptEvent::Write(name.clone(), None));
            }
            Statement::Log { level, parts } => {
                let message = parts
                    .iter()
                    .map(|part| self.interpolate(part))
                    .collect::<Vec<_>>()
                    .join(" ");
                self.emit(ScriptEvent::Log(ConsoleLog::new(*level, message)));
            }
            Statement::Test { name, condition } => {
                let name = self.interpolate(name);
                let result = if self.evaluate(condition) {
                    TestResult::pass(name)
                } else {
                    TestResult::fail(name, format!("Condition not met: {condition}"))
                };
                self.emit(ScriptEvent::Test(result));
            }
            Statement::Assert { condition, message } => {
                if !self.evaluate(condition) {
                    return Err(message.as_ref().map_or_else(
                        || format!("Assertion failed: {condition}"),
                        |m| self.interpolate(m),
                    ));
                }
            }
            Statement::Throw { message } => return Err(self.interpolate(message)),
            Statement::Delay { millis } => {
                tokio::time::sleep(Duration::from_millis(*millis)).await;
            }
        }
        Ok(())
    }

    fn emit(&self, event: ScriptEvent) {
        // The receiver only goes away once the run is abandoned.
        let _ = self.events.send(event);
    }

    /// Replaces `{{name}}` references. Unknown names stay as written.
    fn interpolate(&self, template: &str) -> String {
        TEMPLATE
            .replace_all(template, |caps: &Captures<'_>| {
                self.lookup(&caps[1])
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    fn lookup(&self, name: &str) -> Option<String> {
        let Some(special) = name.strip_prefix('$') else {
            return self.variables.get(name).cloned();
        };
        let request = &self.context.request;
        match special {
            "request.url" => return Some(request.url.clone()),
            "request.name" => return Some(request.name.clone()),
            "request.method" => return request.method.clone(),
            _ => {}
        }

        let response = self.context.response.as_ref()?;
        match special {
            "status" => Some(response.status.to_string()),
            "statusText" => Some(response.status_text.clone()),
            "body" => Some(response.body.clone()),
            "time" => Some(response.time_ms.to_string()),
            _ => {
                if let Some(header) = special.strip_prefix("header.") {
                    response.header(header).map(str::to_string)
                } else if let Some(path) = special.strip_prefix("json.") {
                    json_path(&response.body_json()?, path)
                } else {
                    None
                }
            }
        }
    }

    /// Evaluates a condition. Operands are interpolated after splitting.
    fn evaluate(&self, condition: &str) -> bool {
        let condition = condition.trim();

        if let Some((left, right)) = condition.split_once("==") {
            return self.equals(left, right);
        }
        if let Some((left, right)) = condition.split_once("!=") {
            return !self.equals(left, right);
        }
        if let Some((left, right)) = condition.split_once(">=") {
            return self.compare(left, right, |a, b| a >= b);
        }
        if let Some((left, right)) = condition.split_once("<=") {
            return self.compare(left, right, |a, b| a <= b);
        }
        if let Some((left, right)) = condition.split_once('>') {
            return self.compare(left, right, |a, b| a > b);
        }
        if let Some((left, right)) = condition.split_once('<') {
            return self.compare(left, right, |a, b| a < b);
        }
        if let Some((left, right)) = condition.split_once(" contains ") {
            return self.operand(left).contains(&self.operand(right));
        }

        let value = self.operand(condition);
        !value.is_empty() && value != "false" && value != "0"
    }

    fn operand(&self, raw: &str) -> String {
        let value = self.interpolate(raw.trim());
        let quoted = value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')));
        if quoted {
            value[1..value.len() - 1].to_string()
        } else {
            value
        }
    }

    fn equals(&self, left: &str, right: &str) -> bool {
        let (left, right) = (self.operand(left), self.operand(right));
        match (left.parse::<f64>(), right.parse::<f64>()) {
            (Ok(l), Ok(r)) => (l - r).abs() < f64::EPSILON,
            _ => left == right,
        }
    }

    fn compare(&self, left: &str, right: &str, cmp: impl Fn(f64, f64) -> bool) -> bool {
        match (
            self.operand(left).parse::<f64>(),
            self.operand(right).parse::<f64>(),
        ) {
            (Ok(l), Ok(r)) => cmp(l, r),
            _ => false,
        }
    }
}

/// Follows a dot path (`data.items.0.id`) into a JSON value.
/// Strings come back unquoted, everything else as JSON text.
fn json_path(root: &Value, path: &str) -> Option<String> {
    let mut current = root;
    for segment in path.split('.') {
        current = match current {
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            Value::Object(map) => map.get(segment)?,
            _ => return None,
        };
    }
    Some(match current {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::scripting::parser::parse_script;
    use courier_domain::request::Protocol;
    use courier_domain::response::RawResponse;
    use courier_domain::scripting::{LogLevel, ScriptRequestInfo};
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc;

    fn request_info() -> ScriptRequestInfo {
        ScriptRequestInfo {
            name: "Get user".to_string(),
            url: "https://api.test/users/1".to_string(),
            protocol: Protocol::Http,
            method: Some("GET".to_string()),
        }
    }

    fn test_context() -> ScriptContext {
        let response = RawResponse::new(200, r#"{"data":{"items":[{"id":7,"name":"Ada"}]},"ok":true}"#)
            .with_header("Content-Type", "application/json")
            .with_time(42);
        let mut variables = IndexMap::new();
        variables.insert("expected".to_string(), "Ada".to_string());
        ScriptContext::test(variables, request_info(), response)
    }

    async fn run(script: &str, context: ScriptContext) -> (Result<(), String>, Vec<ScriptEvent>) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let statements = parse_script(script).unwrap();
        let result = Interpreter::new(context, tx).run(&statements).await;
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        (result, events)
    }

    fn logs(events: &[ScriptEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                ScriptEvent::Log(log) => Some(log.message.clone()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_response_interpolation() {
        let script = r#"
            log("{{$status}} {{$statusText}} in {{$time}}ms")
            log("{{$header.content-type}}")
            log("{{$json.data.items.0.name}}", "{{$json.ok}}")
            log("{{$request.method}} {{$request.url}}")
        "#;
        let (result, events) = run(script, test_context()).await;
        assert!(result.is_ok());
        assert_eq!(
            logs(&events),
            vec![
                "200 OK in 42ms",
                "application/json",
                "Ada true",
                "GET https://api.test/users/1",
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_reference_stays_literal() {
        let (_, events) = run(r#"log("{{nope}} {{$json.missing}}")"#, test_context()).await;
        assert_eq!(logs(&events), vec!["{{nope}} {{$json.missing}}"]);
    }

    #[tokio::test]
    async fn test_set_is_visible_to_later_statements() {
        let script = r#"
            set("id", "{{$json.data.items.0.id}}")
            log("user {{id}}")
            unset("id")
            log("user {{id}}")
        "#;
        let (_, events) = run(script, test_context()).await;
        assert_eq!(logs(&events), vec!["user 7", "user {{id}}"]);
        assert!(events.contains(&ScriptEvent::Write("id".to_string(), Some("7".to_string()))));
        assert!(events.contains(&ScriptEvent::Write("id".to_string(), None)));
    }

    #[tokio::test]
    async fn test_conditions() {
        let script = r#"
            test("status", "{{$status}} == 200")
            test("numeric", "{{$time}} < 1000")
            test("range", "{{$status}} >= 300")
            test("contains", "{{$body}} contains Ada")
            test("variable", "{{$json.data.items.0.name}} == {{expected}}")
            test("quoted", "{{$json.data.items.0.name}} != 'Bob'")
            test("truthy", "{{$json.ok}}")
        "#;
        let (result, events) = run(script, test_context()).await;
        assert!(result.is_ok());
        let outcomes: Vec<(String, bool)> = events
            .into_iter()
            .filter_map(|e| match e {
                ScriptEvent::Test(t) => Some((t.name, t.passed)),
                _ => None,
            })
            .collect();
        assert_eq!(
            outcomes,
            vec![
                ("status".to_string(), true),
                ("numeric".to_string(), true),
                ("range".to_string(), false),
                ("contains".to_string(), true),
                ("variable".to_string(), true),
                ("quoted".to_string(), true),
                ("truthy".to_string(), true),
            ]
        );
    }

    #[tokio::test]
    async fn test_assert_stops_script() {
        let script = r#"
            info("before")
            assert("{{$status}} == 404", "expected 404, got {{$status}}")
            info("after")
        "#;
        let (result, events) = run(script, test_context()).await;
        assert_eq!(result, Err("expected 404, got 200".to_string()));
        assert_eq!(
            events,
            vec![ScriptEvent::Log(ConsoleLog::new(LogLevel::Info, "before"))]
        );
    }

    #[tokio::test]
    async fn test_throw() {
        let context = ScriptContext::pre_request(IndexMap::new(), request_info());
        let (result, _) = run(r#"throw("no token for {{$request.name}}")"#, context).await;
        assert_eq!(result, Err("no token for Get user".to_string()));
    }

    #[tokio::test]
    async fn test_response_refs_absent_before_send() {
        let context = ScriptContext::pre_request(IndexMap::new(), request_info());
        let (_, events) = run(r#"log("{{$status}}")"#, context).await;
        assert_eq!(logs(&events), vec!["{{$status}}"]);
    }

    #[test]
    fn test_json_path() {
        let value: Value = serde_json::from_str(r#"{"a":[{"b":"x"},{"b":2}]}"#).unwrap();
        assert_eq!(json_path(&value, "a.0.b"), Some("x".to_string()));
        assert_eq!(json_path(&value, "a.1.b"), Some("2".to_string()));
        assert_eq!(json_path(&value, "a.2.b"), None);
        assert_eq!(json_path(&value, "a.x"), None);
    }
}
