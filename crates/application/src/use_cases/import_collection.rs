//! Import collection use case.

use std::path::Path;

use courier_domain::collection::Collection;
use tracing::{info, warn};

use crate::error::ApplicationResult;
use crate::ports::{CollectionCodec, FileIo, ImportWarning, Repository};

/// Output of an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportCollectionOutput {
    /// The imported and stored collection.
    pub collection: Collection,
    /// Item-level issues. Items with an error-level warning were skipped.
    pub warnings: Vec<ImportWarning>,
}

/// Reads an interchange file, decodes it and stores the collection.
pub struct ImportCollection<R, F> {
    repository: R,
    files: F,
}

impl<R: Repository<Collection>, F: FileIo> ImportCollection<R, F> {
    /// Creates a new `ImportCollection` use case.
    pub const fn new(repository: R, files: F) -> Self {
        Self { repository, files }
    }

    /// Executes the use case.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, the document as a whole
    /// cannot be decoded, or the collection cannot be stored. Nothing is
    /// stored in any of these cases.
    pub async fn execute(
        &self,
        path: &Path,
        codec: &dyn CollectionCodec,
    ) -> ApplicationResult<ImportCollectionOutput> {
        let bytes = self.files.read(path).await?;
        let report = codec.decode(&bytes)?;
        for warning in &report.warnings {
            warn!(%warning, "import");
        }
        self.repository.put(&report.collection).await?;
        info!(
            format = codec.format_name(),
            collection = %report.collection.name,
            requests = report.collection.request_count(),
            skipped = report.skipped_count(),
            "collection imported"
        );
        Ok(ImportCollectionOutput {
            collection: report.collection,
            warnings: report.warnings,
        })
    }
}
