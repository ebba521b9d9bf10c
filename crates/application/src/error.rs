//! Application error types

use courier_domain::DomainError;
use thiserror::Error;

use crate::ports::{CodecError, FileIoError, PersistenceError};

/// Application-level errors.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// A domain validation error occurred.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// A persistence operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] PersistenceError),

    /// Reading or writing a file failed.
    #[error("file error: {0}")]
    File(#[from] FileIoError),

    /// An interchange document could not be decoded or encoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
