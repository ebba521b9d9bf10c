//! One JSON file per entity.
//!
//! Layout: `<root>/<id>.json`. Saves go through [`write_atomic`], so a crash
//! mid-save leaves the previous version in place.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use courier_application::ports::{PersistenceError, Repository};
use courier_domain::id::{Identified, is_valid_id};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;
use tracing::debug;

use super::file_system::write_atomic;
use crate::serialization::{from_json_bytes, to_json_stable_bytes};

const EXTENSION: &str = "json";

/// File-backed [`Repository`] for any serde entity with an id.
#[derive(Debug)]
pub struct JsonFileStore<T> {
    root: PathBuf,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for JsonFileStore<T> {
    fn clone(&self) -> Self {
        Self::new(self.root.clone())
    }
}

impl<T> JsonFileStore<T> {
    /// Creates a store rooted at `root`. The directory is created on first save.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            _entity: PhantomData,
        }
    }

    /// Directory holding the entity files.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, PersistenceError> {
        if !is_valid_id(id) {
            return Err(PersistenceError::InvalidId(id.to_string()));
        }
        Ok(self.root.join(format!("{id}.{EXTENSION}")))
    }
}

async fn read_entity<T: DeserializeOwned>(path: &Path) -> Result<T, PersistenceError> {
    let bytes = fs::read(path).await?;
    from_json_bytes(&bytes)
        .map_err(|e| PersistenceError::Serialization(format!("{}: {e}", path.display())))
}

#[async_trait]
impl<T> Repository<T> for JsonFileStore<T>
where
    T: Identified + Serialize + DeserializeOwned + Send + Sync,
{
    async fn get(&self, id: &str) -> Result<T, PersistenceError> {
        let path = self.path_for(id)?;
        if !fs::try_exists(&path).await? {
            return Err(PersistenceError::NotFound(id.to_string()));
        }
        read_entity(&path).await
    }

    async fn put(&self, entity: &T) -> Result<(), PersistenceError> {
        let path = self.path_for(entity.id())?;
        let bytes = to_json_stable_bytes(entity)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;
        write_atomic(&path, &bytes).await?;
        debug!(path = %path.display(), "entity saved");
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), PersistenceError> {
        let path = self.path_for(id)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(PersistenceError::NotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<T>, PersistenceError> {
        let mut dir = match fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut paths = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            let hidden = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_none_or(|n| n.starts_with('.'));
            if !hidden && path.extension().is_some_and(|ext| ext == EXTENSION) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut entities = Vec::with_capacity(paths.len());
        for path in paths {
            entities.push(read_entity(&path).await?);
        }
        Ok(entities)
    }
}
