//! HTTP transport using reqwest.
//!
//! Implements the `Transport` port for `http` requests. Other protocols are
//! reported as unsupported so a `TransportSet` can route them elsewhere.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use courier_application::ports::{Transport, TransportError};
use courier_domain::request::{HttpMethod, QueryEncoding, ResolvedRequest};
use courier_domain::response::RawResponse;
use courier_domain::settings::EngineSettings;
use reqwest::{Client, Method, Url, Version};
use tracing::debug;

/// Maximum redirects followed before giving up.
const MAX_REDIRECTS: usize = 10;

/// Header names whose usual form is not plain capitalization.
const IRREGULAR_NAMES: [&str; 6] = [
    "ETag",
    "WWW-Authenticate",
    "DNT",
    "TE",
    "X-XSS-Protection",
    "Content-MD5",
];

/// Capitalizes each dash-separated word of a lower-cased header name.
fn capitalized_name(name: &str) -> String {
    if let Some(known) = IRREGULAR_NAMES
        .iter()
        .find(|known| known.eq_ignore_ascii_case(name))
    {
        return (*known).to_string();
    }
    name.split('-')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_ascii_uppercase().to_string() + chars.as_str()
            })
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// HTTP transport backed by a shared `reqwest::Client`.
///
/// The client hands over header names lower-cased, whatever case the server
/// wrote. HTTP/1 response names are therefore reported in their usual
/// capitalized form (`Content-Type`, `ETag`), and HTTP/2 names stay lower case
/// as they are on the wire.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    timeout_ms: u64,
}

impl ReqwestTransport {
    /// Creates a transport with the user agent and timeout from `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new(settings: &EngineSettings) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            timeout_ms: settings.transport_timeout_ms,
        })
    }

    /// Creates a transport around an existing client.
    #[must_use]
    pub const fn with_client(client: Client, timeout_ms: u64) -> Self {
        Self { client, timeout_ms }
    }

    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Head => Method::HEAD,
            HttpMethod::Options => Method::OPTIONS,
        }
    }

    fn map_error(&self, error: &reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout(self.timeout_ms)
        } else if error.is_builder() {
            TransportError::InvalidRequest(error.to_string())
        } else if error.is_connect() {
            TransportError::Connection(error.to_string())
        } else if error.is_redirect() {
            TransportError::Protocol(format!("more than {MAX_REDIRECTS} redirects"))
        } else {
            TransportError::Protocol(error.to_string())
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &ResolvedRequest) -> Result<RawResponse, TransportError> {
        let http = request
            .as_http()
            .ok_or_else(|| TransportError::Unsupported(request.protocol()))?;

        let url = http.url_with_query(&request.url, QueryEncoding::Percent);
        let parsed =
            Url::parse(&url).map_err(|e| TransportError::InvalidRequest(format!("{e}: {url}")))?;

        let mut builder = self
            .client
            .request(Self::to_reqwest_method(http.method), parsed)
            .timeout(Duration::from_millis(self.timeout_ms));
        for (name, value) in http.effective_headers() {
            builder = builder.header(name, value);
        }
        if !http.body.is_empty() {
            builder = builder.body(http.body.content.clone());
        }

        debug!(method = %http.method, %url, "sending http request");
        let start = Instant::now();
        let response = builder.send().await.map_err(|e| self.map_error(&e))?;

        let status = response.status();
        let lower_case_wire = response.version() >= Version::HTTP_2;
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(k, v)| {
                let name = if lower_case_wire {
                    k.to_string()
                } else {
                    capitalized_name(k.as_str())
                };
                (name, v.to_str().unwrap_or("<binary>").to_string())
            })
            .collect();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Connection(format!("failed to read body: {e}")))?;
        let elapsed = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        let mut raw =
            RawResponse::new(status.as_u16(), String::from_utf8_lossy(&bytes)).with_time(elapsed);
        if let Some(reason) = status.canonical_reason() {
            raw.status_text = reason.to_string();
        }
        raw.size = bytes.len() as u64;
        for (name, value) in headers {
            raw.append_header(name, value);
        }

        debug!(status = raw.status, time_ms = raw.time_ms, "http response received");
        Ok(raw)
    }
}
