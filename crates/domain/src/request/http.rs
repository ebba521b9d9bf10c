//! Data carried only by `http` requests

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use super::{ApiKeyLocation, AuthConfig, Headers, HttpMethod, QueryParams, RequestBody};

/// How query parameters are written when appended to a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryEncoding {
    /// `application/x-www-form-urlencoded` escaping, for the wire.
    Percent,
    /// Written exactly as authored, for display and generated code.
    Verbatim,
}

/// Method, headers, query, body and auth of an `http` request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HttpRequest {
    /// HTTP method
    #[serde(default)]
    pub method: HttpMethod,
    /// Headers in authoring order
    #[serde(default)]
    pub headers: Headers,
    /// Query parameters appended to the URL at send time
    #[serde(default)]
    pub query_params: QueryParams,
    /// Request body
    #[serde(default)]
    pub body: RequestBody,
    /// Authentication
    #[serde(default)]
    pub auth: AuthConfig,
}

impl HttpRequest {
    /// Creates a request part with the given method and nothing else.
    #[must_use]
    pub fn new(method: HttpMethod) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Adds an enabled header.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers = self.headers.with(key, value);
        self
    }

    /// Adds an enabled query parameter.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params = self.query_params.with(key, value);
        self
    }

    /// Sets the authentication.
    #[must_use]
    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    /// Returns `url` with enabled query parameters (and a query-located API key) appended.
    #[must_use]
    pub fn url_with_query(&self, url: &str, encoding: QueryEncoding) -> String {
        let mut pairs: Vec<(&str, &str)> = self
            .query_params
            .enabled()
            .map(|p| (p.key.as_str(), p.value.as_str()))
            .collect();
        if let AuthConfig::ApiKey {
            key,
            value,
            location: ApiKeyLocation::Query,
        } = &self.auth
        {
            pairs.push((key, value));
        }
        if pairs.is_empty() {
            return url.to_string();
        }

        let query = match encoding {
            QueryEncoding::Percent => serde_urlencoded::to_string(&pairs).unwrap_or_default(),
            QueryEncoding::Verbatim => pairs
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("&"),
        };
        let separator = if url.contains('?') { '&' } else { '?' };
        format!("{url}{separator}{query}")
    }

    /// Returns the headers that go on the wire, in order: enabled headers,
    /// then the auth header, then `Content-Type` from the body kind when no
    /// enabled header already sets it.
    #[must_use]
    pub fn effective_headers(&self) -> Vec<(String, String)> {
        let mut headers: Vec<(String, String)> = self
            .headers
            .enabled()
            .map(|h| (h.key.clone(), h.value.clone()))
            .collect();

        match &self.auth {
            AuthConfig::None
            | AuthConfig::ApiKey {
                location: ApiKeyLocation::Query,
                ..
            } => {}
            AuthConfig::Bearer { token } => {
                headers.push(("Authorization".to_string(), format!("Bearer {token}")));
            }
            AuthConfig::Basic { username, password } => {
                let encoded = STANDARD.encode(format!("{username}:{password}"));
                headers.push(("Authorization".to_string(), format!("Basic {encoded}")));
            }
            AuthConfig::ApiKey {
                key,
                value,
                location: ApiKeyLocation::Header,
            } => headers.push((key.clone(), value.clone())),
        }

        if let Some(content_type) = self.body.content_type()
            && !self.headers.contains_ignore_case("content-type")
        {
            headers.push(("Content-Type".to_string(), content_type));
        }

        headers
    }
}
