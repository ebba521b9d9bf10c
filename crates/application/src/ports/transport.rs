//! Transport port
//!
//! The only way a request leaves the process.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use courier_domain::request::{Protocol, ResolvedRequest};
use courier_domain::response::RawResponse;

/// Errors a transport can report. All of them end the send.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The wire request could not be built (bad URL, bad header value).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Connection could not be established.
    #[error("connection failed: {0}")]
    Connection(String),

    /// No response within the transport timeout.
    #[error("request timed out after {0}ms")]
    Timeout(u64),

    /// The peer rejected the request at protocol level.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// No transport is registered for the protocol.
    #[error("no transport available for {0} requests")]
    Unsupported(Protocol),

    /// The call was cancelled.
    #[error("request cancelled")]
    Cancelled,
}

/// Port for executing a fully resolved request.
///
/// Called exactly once per send, never retried by the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request and returns the raw response.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure, timeout or protocol rejection.
    async fn send(&self, request: &ResolvedRequest) -> Result<RawResponse, TransportError>;
}

/// Routes each request to the transport registered for its protocol.
#[derive(Clone, Default)]
pub struct TransportSet {
    transports: HashMap<Protocol, Arc<dyn Transport>>,
}

impl TransportSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a transport for one protocol, replacing any previous one.
    #[must_use]
    pub fn with(mut self, protocol: Protocol, transport: Arc<dyn Transport>) -> Self {
        self.transports.insert(protocol, transport);
        self
    }

    /// Returns true when a transport is registered for `protocol`.
    #[must_use]
    pub fn supports(&self, protocol: Protocol) -> bool {
        self.transports.contains_key(&protocol)
    }
}

impl std::fmt::Debug for TransportSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut protocols: Vec<_> = self.transports.keys().collect();
        protocols.sort();
        f.debug_struct("TransportSet")
            .field("protocols", &protocols)
            .finish()
    }
}

#[async_trait]
impl Transport for TransportSet {
    async fn send(&self, request: &ResolvedRequest) -> Result<RawResponse, TransportError> {
        let protocol = request.protocol();
        let transport = self
            .transports
            .get(&protocol)
            .ok_or(TransportError::Unsupported(protocol))?;
        transport.send(request).await
    }
}
