//! Request history kept in a single JSON file.
//!
//! Appends are serialized behind a lock and each one rewrites the file
//! atomically, trimmed to the configured limit.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use courier_application::ports::{HistoryError, HistorySink};
use courier_domain::history::{HistoryEntry, RequestHistory};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use super::file_system::write_atomic;
use crate::serialization::{from_json_bytes, to_json_stable_bytes};

/// File-backed [`HistorySink`].
#[derive(Debug)]
pub struct FileHistoryLog {
    path: PathBuf,
    limit: usize,
    lock: Mutex<()>,
}

impl FileHistoryLog {
    /// Creates a log at `path` that keeps at most `limit` entries.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, limit: usize) -> Self {
        Self {
            path: path.into(),
            limit,
            lock: Mutex::new(()),
        }
    }

    /// Location of the history file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the history, newest first. A missing file is an empty history.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(&self) -> Result<RequestHistory, HistoryError> {
        let mut history = match fs::read(&self.path).await {
            Ok(bytes) => from_json_bytes::<RequestHistory>(&bytes)
                .map_err(|e| HistoryError::Serialization(e.to_string()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => RequestHistory::new(self.limit),
            Err(e) => return Err(e.into()),
        };
        history.set_max_entries(self.limit);
        Ok(history)
    }
}

#[async_trait]
impl HistorySink for FileHistoryLog {
    async fn append(&self, entry: HistoryEntry) -> Result<(), HistoryError> {
        let _guard = self.lock.lock().await;
        let mut history = self.load().await?;
        history.add(entry);

        let bytes = to_json_stable_bytes(&history)
            .map_err(|e| HistoryError::Serialization(e.to_string()))?;
        write_atomic(&self.path, &bytes).await?;
        debug!(entries = history.len(), path = %self.path.display(), "history updated");
        Ok(())
    }
}
