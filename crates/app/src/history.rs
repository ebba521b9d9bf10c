//! History sink that reports completed writes.
//!
//! The send use case records history on a detached task. A short-lived
//! process waits for that write before exiting.

use std::time::Duration;

use async_trait::async_trait;
use courier_application::{HistoryError, HistorySink};
use courier_domain::history::HistoryEntry;
use tokio::sync::mpsc;

/// Wraps a sink and signals after every append attempt.
pub struct NotifyingHistory<S> {
    inner: S,
    done: mpsc::UnboundedSender<()>,
}

/// Receives the signals of a [`NotifyingHistory`].
pub struct HistoryWrites(mpsc::UnboundedReceiver<()>);

impl<S: HistorySink> NotifyingHistory<S> {
    /// Wraps `inner`.
    pub fn new(inner: S) -> (Self, HistoryWrites) {
        let (done, rx) = mpsc::unbounded_channel();
        (Self { inner, done }, HistoryWrites(rx))
    }
}

impl HistoryWrites {
    /// Waits up to `limit` for the next append to finish.
    pub async fn wait(&mut self, limit: Duration) -> bool {
        matches!(tokio::time::timeout(limit, self.0.recv()).await, Ok(Some(())))
    }
}

#[async_trait]
impl<S: HistorySink> HistorySink for NotifyingHistory<S> {
    async fn append(&self, entry: HistoryEntry) -> Result<(), HistoryError> {
        let result = self.inner.append(entry).await;
        // The receiver is gone once the caller stopped waiting.
        let _ = self.done.send(());
        result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use courier_domain::request::{HttpMethod, Request};
    use courier_domain::response::{RawResponse, Response};
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<HistoryEntry>>);

    #[async_trait]
    impl HistorySink for Recorder {
        async fn append(&self, entry: HistoryEntry) -> Result<(), HistoryError> {
            self.0.lock().unwrap().push(entry);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_signals_after_append() {
        let (sink, mut writes) = NotifyingHistory::new(Recorder::default());
        let request = Request::http("Ping", HttpMethod::Get, "https://a.test");
        let response = Response::new(RawResponse::new(204, ""), None, None);
        let entry = HistoryEntry::record(&request, &response, chrono::Utc::now());

        assert!(!writes.wait(Duration::from_millis(10)).await);
        sink.append(entry).await.unwrap();

        assert!(writes.wait(Duration::from_millis(10)).await);
        assert_eq!(sink.inner.0.lock().unwrap().len(), 1);
    }
}
