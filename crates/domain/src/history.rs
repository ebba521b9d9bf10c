//! Request History Domain Model
//!
//! Defines the structure for tracking executed requests.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{Identified, generate_id};
use crate::request::{Protocol, Request};
use crate::response::Response;

/// A single entry in the request history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Unique identifier for this entry.
    pub id: String,
    /// When the send completed.
    pub timestamp: DateTime<Utc>,
    /// Id of the request that was sent.
    pub request_id: String,
    /// Name of the request.
    pub request_name: String,
    /// Protocol of the request.
    pub protocol: Protocol,
    /// HTTP method, for `http` requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// The resolved URL.
    pub url: String,
    /// Response status code.
    pub status_code: u16,
    /// Transport time in milliseconds.
    pub duration_ms: u64,
    /// Response body size in bytes.
    pub size: u64,
    /// Passing test assertions.
    #[serde(default)]
    pub tests_passed: usize,
    /// Failing test assertions.
    #[serde(default)]
    pub tests_failed: usize,
}

impl HistoryEntry {
    /// Records a completed send of `request` (as resolved) that produced `response`.
    #[must_use]
    pub fn record(request: &Request, response: &Response, timestamp: DateTime<Utc>) -> Self {
        let tests = response.test_script_result();
        Self {
            id: generate_id(),
            timestamp,
            request_id: request.id.clone(),
            request_name: request.name.clone(),
            protocol: request.protocol(),
            method: request.as_http().map(|h| h.method.as_str().to_string()),
            url: request.url.clone(),
            status_code: response.status(),
            duration_ms: response.time_ms(),
            size: response.size(),
            tests_passed: tests.map_or(0, |t| t.passed_count()),
            tests_failed: tests.map_or(0, |t| t.failed_count()),
        }
    }

    /// Returns the duration as a display string.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_display(&self) -> String {
        if self.duration_ms < 1000 {
            format!("{}ms", self.duration_ms)
        } else {
            format!("{:.1}s", self.duration_ms as f64 / 1000.0)
        }
    }
}

impl Identified for HistoryEntry {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Request history with a maximum size limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestHistory {
    /// History entries (newest first).
    entries: VecDeque<HistoryEntry>,
    /// Maximum number of entries to keep.
    #[serde(default = "default_max_entries")]
    max_entries: usize,
}

const fn default_max_entries() -> usize {
    100
}

impl Default for RequestHistory {
    fn default() -> Self {
        Self::new(default_max_entries())
    }
}

impl RequestHistory {
    /// Creates a new empty history.
    #[must_use]
    pub const fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries,
        }
    }

    /// Adds an entry to the history (at the front).
    pub fn add(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.max_entries);
    }

    /// Returns all entries (newest first).
    #[must_use]
    pub const fn entries(&self) -> &VecDeque<HistoryEntry> {
        &self.entries
    }

    /// Returns an entry by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if history is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sets the maximum number of entries and trims if needed.
    pub fn set_max_entries(&mut self, max: usize) {
        self.max_entries = max;
        self.entries.truncate(max);
    }
}
