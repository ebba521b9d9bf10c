//! Response types
//!
//! [`RawResponse`] is what a transport hands back. [`Response`] is the record
//! of a completed send: the raw response plus both script results. It is
//! built once and never mutated; a new send produces a new one.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::scripting::ScriptExecutionResult;

/// Returns the canonical reason phrase for common status codes.
#[must_use]
pub const fn reason_phrase(status: u16) -> &'static str {
    match status {
        100 => "Continue",
        101 => "Switching Protocols",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Unknown",
    }
}

/// Status, headers, body and timing as returned by a transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawResponse {
    /// Status code. gRPC transports map their status onto HTTP codes.
    pub status: u16,
    /// Reason phrase or protocol status text
    pub status_text: String,
    /// Headers with keys as received
    pub headers: IndexMap<String, String>,
    /// Body text
    pub body: String,
    /// Body size in bytes
    pub size: u64,
    /// Elapsed time
    #[serde(rename = "time")]
    pub time_ms: u64,
}

impl RawResponse {
    /// Creates a response with the canonical reason phrase and body size.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        Self {
            status,
            status_text: reason_phrase(status).to_string(),
            headers: IndexMap::new(),
            size: body.len() as u64,
            body,
            time_ms: 0,
        }
    }

    /// Adds a header. A repeated name joins values with `", "`.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.append_header(name, value);
        self
    }

    /// Sets the elapsed time.
    #[must_use]
    pub const fn with_time(mut self, time_ms: u64) -> Self {
        self.time_ms = time_ms;
        self
    }

    /// Adds a header in place. A repeated name joins values with `", "`.
    pub fn append_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        self.headers
            .entry(name.into())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }

    /// Looks a header up ignoring ASCII case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Parses the body as JSON.
    #[must_use]
    pub fn body_json(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.body).ok()
    }
}

/// The result of a completed send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    #[serde(flatten)]
    raw: RawResponse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pre_request_script_result: Option<ScriptExecutionResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    test_script_result: Option<ScriptExecutionResult>,
}

impl Response {
    /// Assembles the final response.
    #[must_use]
    pub const fn new(
        raw: RawResponse,
        pre_request_script_result: Option<ScriptExecutionResult>,
        test_script_result: Option<ScriptExecutionResult>,
    ) -> Self {
        Self {
            raw,
            pre_request_script_result,
            test_script_result,
        }
    }

    /// The transport response.
    #[must_use]
    pub const fn raw(&self) -> &RawResponse {
        &self.raw
    }

    /// Status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.raw.status
    }

    /// Status text.
    #[must_use]
    pub fn status_text(&self) -> &str {
        &self.raw.status_text
    }

    /// Headers as received.
    #[must_use]
    pub const fn headers(&self) -> &IndexMap<String, String> {
        &self.raw.headers
    }

    /// Body text.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.raw.body
    }

    /// Body size in bytes.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.raw.size
    }

    /// Elapsed transport time in milliseconds.
    #[must_use]
    pub const fn time_ms(&self) -> u64 {
        self.raw.time_ms
    }

    /// Result of the pre-request script, if one ran.
    #[must_use]
    pub const fn pre_request_script_result(&self) -> Option<&ScriptExecutionResult> {
        self.pre_request_script_result.as_ref()
    }

    /// Result of the test script, if one ran.
    #[must_use]
    pub const fn test_script_result(&self) -> Option<&ScriptExecutionResult> {
        self.test_script_result.as_ref()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_fills_reason_and_size() {
        let raw = RawResponse::new(404, "nope");
        assert_eq!(raw.status_text, "Not Found");
        assert_eq!(raw.size, 4);
        assert!(!raw.is_success());
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let raw = RawResponse::new(200, "")
            .with_header("Content-Type", "application/json")
            .with_header("Set-Cookie", "a=1")
            .with_header("Set-Cookie", "b=2");
        assert_eq!(raw.header("content-type"), Some("application/json"));
        assert_eq!(raw.header("set-cookie"), Some("a=1, b=2"));
        assert_eq!(raw.headers.keys().next().map(String::as_str), Some("Content-Type"));
    }

    #[test]
    fn test_response_serializes_flat() {
        let response = Response::new(RawResponse::new(200, "{}").with_time(12), None, None);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], 200);
        assert_eq!(json["statusText"], "OK");
        assert_eq!(json["time"], 12);
        assert!(json.get("testScriptResult").is_none());
    }
}
