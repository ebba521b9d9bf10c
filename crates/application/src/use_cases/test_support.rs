//! In-memory ports shared by the use case tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use courier_domain::collection::Collection;

use crate::ports::{FileIo, FileIoError, PersistenceError, Repository};

#[derive(Clone, Default)]
pub struct MemoryRepository {
    collections: Arc<Mutex<HashMap<String, Collection>>>,
}

impl MemoryRepository {
    pub fn insert(&self, collection: Collection) {
        self.collections
            .lock()
            .unwrap()
            .insert(collection.id.clone(), collection);
    }

    /// The single stored collection.
    pub fn only(&self) -> Collection {
        let collections = self.collections.lock().unwrap();
        assert_eq!(collections.len(), 1, "expected exactly one collection");
        collections.values().next().cloned().unwrap()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl Repository<Collection> for MemoryRepository {
    async fn get(&self, id: &str) -> Result<Collection, PersistenceError> {
        self.collections
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| PersistenceError::NotFound(id.to_string()))
    }

    async fn put(&self, entity: &Collection) -> Result<(), PersistenceError> {
        self.insert(entity.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), PersistenceError> {
        self.collections
            .lock()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| PersistenceError::NotFound(id.to_string()))
    }

    async fn list(&self) -> Result<Vec<Collection>, PersistenceError> {
        Ok(self.collections.lock().unwrap().values().cloned().collect())
    }
}

#[derive(Clone, Default)]
pub struct MemoryFiles {
    files: Arc<Mutex<HashMap<PathBuf, Vec<u8>>>>,
}

impl MemoryFiles {
    pub fn put(&self, path: &str, contents: &[u8]) {
        self.files
            .lock()
            .unwrap()
            .insert(PathBuf::from(path), contents.to_vec());
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(Path::new(path)).cloned()
    }
}

impl FileIo for MemoryFiles {
    async fn read(&self, path: &Path) -> Result<Vec<u8>, FileIoError> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| FileIoError::NotFound(path.to_path_buf()))
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> Result<(), FileIoError> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }
}
