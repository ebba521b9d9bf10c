//! Save request use case.

use courier_domain::collection::Collection;
use tracing::info;

use crate::error::ApplicationResult;
use crate::orchestrator::TabHandle;
use crate::ports::Repository;

/// Output of an explicit save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequestOutput {
    /// Id of the saved request inside the collection.
    pub request_id: String,
    /// True when an existing request was overwritten, false when appended.
    pub replaced: bool,
}

/// Saves a tab's request into a collection.
///
/// Saving is the only way a tab's edits reach a collection. The request
/// replaces the saved request it was opened from, or is appended at the
/// collection root when it was never saved.
pub struct SaveRequestToCollection<R> {
    repository: R,
}

impl<R: Repository<Collection>> SaveRequestToCollection<R> {
    /// Creates a new `SaveRequestToCollection` use case.
    pub const fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Executes the use case.
    ///
    /// # Errors
    /// Returns an error if the collection cannot be loaded or stored. The
    /// tab stays dirty in that case.
    pub async fn execute(
        &self,
        tab: &TabHandle,
        collection_id: &str,
    ) -> ApplicationResult<SaveRequestOutput> {
        let (request, linked_id) =
            tab.with_tab(|t| (t.request(), t.collection_request_id.clone()));
        let request_id = linked_id.unwrap_or_else(|| request.id.clone());

        let mut collection = self.repository.get(collection_id).await?;
        let replaced = collection.upsert_request((*request).clone().with_id(request_id.clone()));
        self.repository.put(&collection).await?;

        tab.with_tab(|t| t.mark_saved(request_id.clone()));
        info!(collection = %collection.name, request = %request.name, replaced, "request saved");
        Ok(SaveRequestOutput {
            request_id,
            replaced,
        })
    }
}
