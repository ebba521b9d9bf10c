//! The protocol-tagged request union

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{GrpcRequest, HttpMethod, HttpRequest};
use crate::error::{DomainError, DomainResult};
use crate::id::generate_id;

/// Wire protocol of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    /// HTTP/1.1 or HTTP/2 request-response
    Http,
    /// WebSocket connection
    #[serde(rename = "websocket")]
    WebSocket,
    /// Server-sent events subscription
    Sse,
    /// gRPC unary call
    Grpc,
}

impl Protocol {
    /// Returns the lower-case protocol tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::WebSocket => "websocket",
            Self::Sse => "sse",
            Self::Grpc => "grpc",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Variant-specific part of a [`Request`].
///
/// Only `http` carries headers and a body, only `grpc` carries metadata;
/// `websocket` and `sse` need nothing beyond the common URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestKind {
    /// HTTP request
    Http(HttpRequest),
    /// WebSocket handshake
    #[serde(rename = "websocket")]
    WebSocket,
    /// Server-sent events subscription
    Sse,
    /// gRPC unary call
    Grpc(GrpcRequest),
}

impl RequestKind {
    /// Returns the protocol tag of this variant.
    #[must_use]
    pub const fn protocol(&self) -> Protocol {
        match self {
            Self::Http(_) => Protocol::Http,
            Self::WebSocket => Protocol::WebSocket,
            Self::Sse => Protocol::Sse,
            Self::Grpc(_) => Protocol::Grpc,
        }
    }
}

/// A single request as authored by the user.
///
/// Identity is the `id`: two values with the same id compare equal even if
/// their content differs. Use [`Request::content_eq`] to compare content.
/// Holders share requests behind `Arc` and replace them wholesale on edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Stable identity
    pub id: String,
    /// Display name
    pub name: String,
    /// Target URL template
    #[serde(default)]
    pub url: String,
    /// Script run before the transport call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_request_script: Option<String>,
    /// Script run after the transport call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_script: Option<String>,
    /// Protocol variant and its data
    #[serde(flatten)]
    pub kind: RequestKind,
    /// Interchange-format fields this model does not interpret, kept so that
    /// an import followed by an export loses nothing.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extras: Map<String, Value>,
}

impl Request {
    fn with_kind(name: impl Into<String>, url: impl Into<String>, kind: RequestKind) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            url: url.into(),
            pre_request_script: None,
            test_script: None,
            kind,
            extras: Map::new(),
        }
    }

    /// Creates an `http` request.
    #[must_use]
    pub fn http(name: impl Into<String>, method: HttpMethod, url: impl Into<String>) -> Self {
        Self::with_kind(name, url, RequestKind::Http(HttpRequest::new(method)))
    }

    /// Creates an `http` request from a prepared HTTP part.
    #[must_use]
    pub fn http_with(name: impl Into<String>, url: impl Into<String>, http: HttpRequest) -> Self {
        Self::with_kind(name, url, RequestKind::Http(http))
    }

    /// Creates a `websocket` request.
    #[must_use]
    pub fn websocket(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::with_kind(name, url, RequestKind::WebSocket)
    }

    /// Creates an `sse` request.
    #[must_use]
    pub fn sse(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::with_kind(name, url, RequestKind::Sse)
    }

    /// Creates a `grpc` request.
    #[must_use]
    pub fn grpc(name: impl Into<String>, url: impl Into<String>, call: GrpcRequest) -> Self {
        Self::with_kind(name, url, RequestKind::Grpc(call))
    }

    /// Sets the pre-request script.
    #[must_use]
    pub fn with_pre_request_script(mut self, source: impl Into<String>) -> Self {
        self.pre_request_script = Some(source.into());
        self
    }

    /// Sets the test script.
    #[must_use]
    pub fn with_test_script(mut self, source: impl Into<String>) -> Self {
        self.test_script = Some(source.into());
        self
    }

    /// Sets the identity.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Returns the protocol of this request.
    #[must_use]
    pub const fn protocol(&self) -> Protocol {
        self.kind.protocol()
    }

    /// Returns the HTTP part, if this is an `http` request.
    #[must_use]
    pub const fn as_http(&self) -> Option<&HttpRequest> {
        match &self.kind {
            RequestKind::Http(http) => Some(http),
            _ => None,
        }
    }

    /// Returns the HTTP part or a `WrongProtocol` error.
    ///
    /// # Errors
    ///
    /// Returns an error for non-`http` requests.
    pub fn require_http(&self) -> DomainResult<&HttpRequest> {
        self.as_http().ok_or(DomainError::WrongProtocol {
            expected: Protocol::Http.as_str(),
            found: self.protocol().as_str(),
        })
    }

    /// Returns the gRPC part, if this is a `grpc` request.
    #[must_use]
    pub const fn as_grpc(&self) -> Option<&GrpcRequest> {
        match &self.kind {
            RequestKind::Grpc(call) => Some(call),
            _ => None,
        }
    }

    /// Returns a copy with a fresh id, for "duplicate" actions.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        Self {
            id: generate_id(),
            ..self.clone()
        }
    }

    /// Compares every field, where `==` only compares ids.
    #[must_use]
    pub fn content_eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.url == other.url
            && self.pre_request_script == other.pre_request_script
            && self.test_script == other.test_script
            && self.kind == other.kind
            && self.extras == other.extras
    }

    /// Rewrites every templated value in place.
    ///
    /// `f` receives a field label (`url`, `header:Accept`, `grpc.message`, ...)
    /// and the current value, and returns the replacement. Keys, names and
    /// scripts are never passed to `f`.
    pub fn map_templates(&mut self, mut f: impl FnMut(&str, &str) -> String) {
        self.url = f("url", &self.url);
        match &mut self.kind {
            RequestKind::Http(http) => {
                for header in http.headers.iter_mut() {
                    header.value = f(&format!("header:{}", header.key), &header.value);
                }
                for param in http.query_params.iter_mut() {
                    param.value = f(&format!("query:{}", param.key), &param.value);
                }
                http.body.content = f("body", &http.body.content);
                http.auth.map_values(&mut f);
            }
            RequestKind::Grpc(call) => {
                call.message = f("grpc.message", &call.message);
                for entry in call.metadata.iter_mut() {
                    entry.value = f(&format!("metadata:{}", entry.key), &entry.value);
                }
            }
            RequestKind::WebSocket | RequestKind::Sse => {}
        }
    }
}

impl PartialEq for Request {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Request {}

impl Hash for Request {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A request whose templated values have been through variable resolution.
///
/// Transports only accept this type, so an unresolved template can never
/// reach the wire by accident.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequest(Request);

impl ResolvedRequest {
    /// Wraps a request whose templates were already substituted.
    #[must_use]
    pub const fn new(request: Request) -> Self {
        Self(request)
    }

    /// Returns the underlying request.
    #[must_use]
    pub fn into_inner(self) -> Request {
        self.0
    }
}

impl Deref for ResolvedRequest {
    type Target = Request;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::request::{AuthConfig, RequestBody};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_constructors_set_protocol() {
        assert_eq!(
            Request::http("a", HttpMethod::Get, "https://x").protocol(),
            Protocol::Http
        );
        assert_eq!(
            Request::websocket("b", "wss://x").protocol(),
            Protocol::WebSocket
        );
        assert_eq!(Request::sse("c", "https://x/events").protocol(), Protocol::Sse);
        assert_eq!(
            Request::grpc("d", "grpc://x", GrpcRequest::new("a.B", "C")).protocol(),
            Protocol::Grpc
        );
    }

    #[test]
    fn test_equality_is_by_id() {
        let original = Request::http("Users", HttpMethod::Get, "https://x/users");
        let mut renamed = original.clone();
        renamed.name = "Renamed".to_string();

        assert_eq!(original, renamed);
        assert!(!original.content_eq(&renamed));
        assert_ne!(original, original.duplicate());
    }

    #[test]
    fn test_http_serializes_flat_with_type_tag() {
        let request = Request::http("Create", HttpMethod::Post, "{{base}}/users").with_id("r1");
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["type"], json!("http"));
        assert_eq!(value["method"], json!("POST"));
        assert_eq!(value["id"], json!("r1"));
        assert!(value.get("metadata").is_none());
    }

    #[test]
    fn test_every_variant_survives_json() {
        let requests = vec![
            Request::http_with(
                "h",
                "https://x",
                HttpRequest::new(HttpMethod::Put)
                    .with_header("A", "1")
                    .with_body(RequestBody::json("{}"))
                    .with_auth(AuthConfig::bearer("{{token}}")),
            )
            .with_test_script("test(\"ok\", \"{{$status}} == 200\")"),
            Request::websocket("w", "wss://x/socket"),
            Request::sse("s", "https://x/stream"),
            Request::grpc(
                "g",
                "localhost:50051",
                GrpcRequest::new("helloworld.Greeter", "SayHello")
                    .with_message(r#"{"name":"{{user}}"}"#)
                    .with_metadata("x-trace", "1"),
            ),
        ];

        for request in requests {
            let text = serde_json::to_string(&request).unwrap();
            let back: Request = serde_json::from_str(&text).unwrap();
            assert!(back.content_eq(&request), "{text}");
        }
    }

    #[test]
    fn test_map_templates_touches_values_only() {
        let mut request = Request::http_with(
            "h",
            "{{base}}/x",
            HttpRequest::new(HttpMethod::Post)
                .with_header("{{name}}", "{{value}}")
                .with_body(RequestBody::text("{{body}}")),
        )
        .with_pre_request_script("set(\"{{a}}\", \"b\")");

        let mut fields = Vec::new();
        request.map_templates(|field, value| {
            fields.push(field.to_string());
            value.replace("{{", "<").replace("}}", ">")
        });

        assert_eq!(request.url, "<base>/x");
        let http = request.as_http().unwrap();
        assert_eq!(http.headers.all()[0].key, "{{name}}");
        assert_eq!(http.headers.all()[0].value, "<value>");
        assert_eq!(http.body.content, "<body>");
        assert_eq!(
            request.pre_request_script.as_deref(),
            Some("set(\"{{a}}\", \"b\")")
        );
        assert_eq!(fields, vec!["url", "header:{{name}}", "body"]);
    }

    #[test]
    fn test_require_http_on_grpc_fails() {
        let request = Request::grpc("g", "x", GrpcRequest::default());
        assert!(matches!(
            request.require_http(),
            Err(DomainError::WrongProtocol { found: "grpc", .. })
        ));
    }
}
