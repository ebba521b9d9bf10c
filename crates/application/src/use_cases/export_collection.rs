//! Export collection use case.

use std::path::Path;

use courier_domain::collection::Collection;
use tracing::info;

use crate::error::ApplicationResult;
use crate::ports::{CollectionCodec, FileIo, Repository};

/// Loads a stored collection, encodes it and writes the file.
pub struct ExportCollection<R, F> {
    repository: R,
    files: F,
}

impl<R: Repository<Collection>, F: FileIo> ExportCollection<R, F> {
    /// Creates a new `ExportCollection` use case.
    pub const fn new(repository: R, files: F) -> Self {
        Self { repository, files }
    }

    /// Executes the use case and returns the number of bytes written.
    ///
    /// # Errors
    /// Returns an error if the collection is unknown, cannot be encoded, or
    /// the file cannot be written.
    pub async fn execute(
        &self,
        collection_id: &str,
        path: &Path,
        codec: &dyn CollectionCodec,
    ) -> ApplicationResult<usize> {
        let collection = self.repository.get(collection_id).await?;
        let bytes = codec.encode(&collection)?;
        self.files.write(path, &bytes).await?;
        info!(
            format = codec.format_name(),
            collection = %collection.name,
            path = %path.display(),
            "collection exported"
        );
        Ok(bytes.len())
    }
}
