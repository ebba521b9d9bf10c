//! Postman Collection v2.1 Type Definitions
//!
//! Only the import side is typed. Each item is deserialized on its own, so a
//! malformed item fails alone. Fields the native model does not interpret
//! are captured in the flattened `extras` maps.

#![allow(missing_docs)]

use courier_domain::request::{GrpcRequest, Protocol};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Schema identifier written on export and required on import.
pub const SCHEMA_V21: &str = "https://schema.getpostman.com/json/collection/v2.1.0/collection.json";

/// Vendor extension field carrying what Postman cannot express.
pub const EXTENSION_KEY: &str = "x-courier";

/// Returns true for the v2.1 schema URL, on either Postman schema host.
#[must_use]
pub fn is_v21_schema(schema: &str) -> bool {
    let schema = schema.trim_end_matches('/');
    schema == SCHEMA_V21
        || schema == "https://schema.postman.com/json/collection/v2.1.0/collection.json"
}

/// Collection metadata
#[derive(Debug, Clone, Deserialize)]
pub struct PostmanInfo {
    pub name: String,
    #[serde(rename = "_postman_id", default)]
    pub postman_id: Option<String>,
    #[serde(default)]
    pub description: Option<Value>,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

/// An item is a folder when `item` is present, a request when `request` is.
#[derive(Debug, Clone, Deserialize)]
pub struct PostmanItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub description: Option<Value>,
    /// Children, kept raw so each can fail on its own
    #[serde(default)]
    pub item: Option<Vec<Value>>,
    /// A request object, or a bare URL string
    #[serde(default)]
    pub request: Option<Value>,
    /// Events, kept raw so unrecognized ones survive
    #[serde(default)]
    pub event: Vec<Value>,
    #[serde(rename = "x-courier", default)]
    pub extension: Option<CourierExtension>,
    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

/// Postman request definition
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostmanRequest {
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub url: Option<PostmanUrl>,
    #[serde(default)]
    pub header: Vec<PostmanHeader>,
    #[serde(default)]
    pub body: Option<PostmanBody>,
    #[serde(default)]
    pub auth: Option<PostmanAuth>,
    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

/// URL can be either a simple string or a structured object
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PostmanUrl {
    Simple(String),
    Structured(PostmanUrlStructured),
}

/// Structured URL object.
///
/// `raw` is read as the URL when present. `protocol`, `host`, `port`, `path`
/// and the rest stay in `extras`, and the URL is rebuilt from them when `raw`
/// is missing.
#[derive(Debug, Clone, Deserialize)]
pub struct PostmanUrlStructured {
    #[serde(default)]
    pub raw: Option<String>,
    /// `None` when the key is absent, which differs from an empty list
    #[serde(default)]
    pub query: Option<Vec<PostmanQueryParam>>,
    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

/// Query parameter
#[derive(Debug, Clone, Deserialize)]
pub struct PostmanQueryParam {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

impl PostmanQueryParam {
    /// The parameter as it appears in a query string: `key=value`, or a bare
    /// `key` when there is no value.
    #[must_use]
    pub fn query_text(&self) -> String {
        let key = self.key.as_deref().unwrap_or_default();
        match &self.value {
            Some(value) => format!("{key}={value}"),
            None => key.to_string(),
        }
    }
}

/// Request header
#[derive(Debug, Clone, Deserialize)]
pub struct PostmanHeader {
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub disabled: bool,
    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

/// URL parts that [`base_from_parts`] reads.
pub const URL_PARTS: [&str; 4] = ["protocol", "host", "port", "path"];

/// Rebuilds a URL without its query from the structured `protocol`, `host`,
/// `port` and `path` fields. Returns `None` without a usable `host`.
#[must_use]
pub fn base_from_parts(parts: &Map<String, Value>) -> Option<String> {
    let host = match parts.get("host")? {
        Value::String(host) => host.clone(),
        Value::Array(labels) => labels
            .iter()
            .map(|label| value_text(Some(label)))
            .collect::<Vec<_>>()
            .join("."),
        _ => return None,
    };
    if host.is_empty() {
        return None;
    }

    let mut url = String::new();
    if let Some(Value::String(protocol)) = parts.get("protocol") {
        url.push_str(protocol);
        url.push_str("://");
    }
    url.push_str(&host);
    match parts.get("port") {
        None | Some(Value::Null) => {}
        Some(port) => {
            url.push(':');
            url.push_str(&value_text(Some(port)));
        }
    }
    let segments: Vec<String> = match parts.get("path") {
        Some(Value::String(path)) => vec![path.trim_start_matches('/').to_string()],
        Some(Value::Array(segments)) => segments
            .iter()
            .map(|segment| match segment {
                Value::Object(object) => value_text(object.get("value")),
                other => value_text(Some(other)),
            })
            .collect(),
        _ => Vec::new(),
    };
    if !segments.is_empty() {
        url.push('/');
        url.push_str(&segments.join("/"));
    }
    Some(url)
}

/// Request body
#[derive(Debug, Clone, Deserialize)]
pub struct PostmanBody {
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub raw: Option<String>,
    #[serde(default)]
    pub urlencoded: Vec<PostmanFormParam>,
    #[serde(default)]
    pub graphql: Option<PostmanGraphQl>,
    #[serde(default)]
    pub options: Option<PostmanBodyOptions>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

/// Form URL-encoded parameter
#[derive(Debug, Clone, Deserialize)]
pub struct PostmanFormParam {
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

/// GraphQL body
#[derive(Debug, Clone, Deserialize)]
pub struct PostmanGraphQl {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub variables: Option<Value>,
}

/// Body options (e.g., raw language)
#[derive(Debug, Clone, Deserialize)]
pub struct PostmanBodyOptions {
    #[serde(default)]
    pub raw: Option<PostmanRawOptions>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostmanRawOptions {
    #[serde(default)]
    pub language: Option<String>,
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PostmanAuth {
    #[serde(rename = "type")]
    pub auth_type: String,
    #[serde(default)]
    pub basic: Vec<PostmanAuthParam>,
    #[serde(default)]
    pub bearer: Vec<PostmanAuthParam>,
    #[serde(default)]
    pub apikey: Vec<PostmanAuthParam>,
}

impl PostmanAuth {
    /// Get a parameter value by key. Non-string values are rendered as JSON.
    #[must_use]
    pub fn get_param(params: &[PostmanAuthParam], key: &str) -> Option<String> {
        params
            .iter()
            .find(|p| p.key == key)
            .and_then(|p| p.value.as_ref())
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
    }
}

/// Auth parameter (key-value pair)
#[derive(Debug, Clone, Deserialize)]
pub struct PostmanAuthParam {
    pub key: String,
    #[serde(default)]
    pub value: Option<Value>,
}

/// Collection variable
#[derive(Debug, Clone, Deserialize)]
pub struct PostmanVariable {
    pub key: String,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub disabled: bool,
}

/// Event (pre-request or test script)
#[derive(Debug, Clone, Deserialize)]
pub struct PostmanEvent {
    pub listen: String,
    #[serde(default)]
    pub script: Option<PostmanScript>,
}

/// Script definition. `exec` is a list of lines or a single string.
#[derive(Debug, Clone, Deserialize)]
pub struct PostmanScript {
    #[serde(default)]
    pub exec: Option<Value>,
}

impl PostmanScript {
    /// The script source, lines joined with `\n`.
    #[must_use]
    pub fn source(&self) -> Option<String> {
        match self.exec.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Array(lines) => Some(
                lines
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            _ => None,
        }
    }
}

/// The `x-courier` vendor extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourierExtension {
    pub protocol: Protocol,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grpc: Option<GrpcRequest>,
}

/// Postman environment variable
#[derive(Debug, Clone, Deserialize)]
pub struct PostmanEnvVariable {
    pub key: String,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

const fn default_true() -> bool {
    true
}

/// Renders a JSON scalar as variable text.
#[must_use]
pub fn value_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
