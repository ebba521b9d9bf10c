//! Persistence port
//!
//! Whole-entity get/put keyed by id.

use async_trait::async_trait;
use courier_domain::id::Identified;

/// Errors that can occur during persistence operations.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// No entity with this id.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The id cannot be used as a key.
    #[error("Invalid id: {0:?}")]
    InvalidId(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Atomic load/save of entities keyed by id.
#[async_trait]
pub trait Repository<T: Identified + Send + Sync>: Send + Sync {
    /// Loads an entity.
    ///
    /// # Errors
    /// Returns `PersistenceError::NotFound` if no entity has this id.
    async fn get(&self, id: &str) -> Result<T, PersistenceError>;

    /// Saves an entity, replacing any previous version as a whole.
    ///
    /// # Errors
    /// Returns an error if the entity cannot be written.
    async fn put(&self, entity: &T) -> Result<(), PersistenceError>;

    /// Deletes an entity.
    ///
    /// # Errors
    /// Returns `PersistenceError::NotFound` if no entity has this id.
    async fn delete(&self, id: &str) -> Result<(), PersistenceError>;

    /// Loads every entity.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    async fn list(&self) -> Result<Vec<T>, PersistenceError>;
}
