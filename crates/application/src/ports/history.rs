//! History sink port

use async_trait::async_trait;
use courier_domain::history::HistoryEntry;

/// Errors from recording history.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Append-only record of completed sends.
#[async_trait]
pub trait HistorySink: Send + Sync {
    /// Appends one entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry could not be stored. Callers treat
    /// this as best-effort.
    async fn append(&self, entry: HistoryEntry) -> Result<(), HistoryError>;
}
