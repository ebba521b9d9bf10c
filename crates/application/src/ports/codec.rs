//! Collection codec port
//!
//! Converts collections to and from an interchange document. A file-level
//! problem is a [`CodecError`]; an item-level problem is an [`ImportWarning`]
//! next to an otherwise successful [`ImportReport`].

use std::fmt;

use courier_domain::collection::Collection;
use serde::{Deserialize, Serialize};

/// File-level codec failure. The whole import or export is aborted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The bytes are not JSON.
    #[error("Invalid JSON: {0}")]
    Malformed(String),

    /// A required top-level field is missing or has the wrong shape.
    #[error("Invalid document: '{field}' {reason}")]
    InvalidDocument {
        /// Offending top-level field
        field: String,
        /// What is wrong with it
        reason: String,
    },

    /// `info.schema` is not the supported schema identifier.
    #[error("Unsupported schema: {0}")]
    UnsupportedSchema(String),

    /// The native document was written by a newer version.
    #[error("Unsupported version {found}, newest supported is {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u64,
        /// Newest version this build reads
        supported: u64,
    },

    /// The file exceeds the size limit.
    #[error("File too large: {size} bytes exceeds maximum of {max} bytes")]
    TooLarge {
        /// Actual file size in bytes
        size: usize,
        /// Maximum allowed size in bytes
        max: usize,
    },

    /// Encoding failed.
    #[error("Encoding failed: {0}")]
    Encode(String),
}

impl CodecError {
    /// Shorthand for [`CodecError::InvalidDocument`].
    #[must_use]
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDocument {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Warning severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningSeverity {
    /// Informational - a field was converted, not lost
    Info,
    /// Warning - a field was dropped
    Warning,
    /// Error - an item was skipped
    Error,
}

impl fmt::Display for WarningSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// An item-level import issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportWarning {
    /// Path to the problematic item (e.g., "collection/folder/request")
    pub path: String,
    /// Human-readable description of the issue
    pub message: String,
    /// Severity level
    pub severity: WarningSeverity,
}

impl ImportWarning {
    /// Create a new warning
    pub fn new(
        path: impl Into<String>,
        message: impl Into<String>,
        severity: WarningSeverity,
    ) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            severity,
        }
    }

    /// Create an info-level warning
    pub fn info(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(path, message, WarningSeverity::Info)
    }

    /// Create a warning-level warning
    pub fn warning(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(path, message, WarningSeverity::Warning)
    }

    /// Create an error-level warning, used when an item is skipped
    pub fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(path, message, WarningSeverity::Error)
    }

    /// Check if this is an error
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.severity, WarningSeverity::Error)
    }
}

impl fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.path, self.message)
    }
}

/// A decoded collection plus the item-level warnings collected on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    /// The decoded collection
    pub collection: Collection,
    /// Item-level issues
    pub warnings: Vec<ImportWarning>,
}

impl ImportReport {
    /// Number of skipped items.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.warnings.iter().filter(|w| w.is_error()).count()
    }
}

/// Port for one interchange format.
pub trait CollectionCodec: Send + Sync {
    /// Short format name for logs and messages.
    fn format_name(&self) -> &'static str;

    /// Decodes a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document as a whole cannot be read. Malformed
    /// items are skipped and reported in the report's warnings instead.
    fn decode(&self, bytes: &[u8]) -> Result<ImportReport, CodecError>;

    /// Encodes a collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be serialized.
    fn encode(&self, collection: &Collection) -> Result<Vec<u8>, CodecError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_warning_display() {
        let warning = ImportWarning::error("API/users/list", "missing 'request'");
        assert_eq!(warning.to_string(), "[error] API/users/list: missing 'request'");
        assert!(warning.is_error());
    }

    #[test]
    fn test_invalid_document_names_field() {
        let err = CodecError::invalid("item", "must be an array");
        assert_eq!(err.to_string(), "Invalid document: 'item' must be an array");
    }

    #[test]
    fn test_skipped_count() {
        let report = ImportReport {
            collection: Collection::new("c"),
            warnings: vec![
                ImportWarning::info("a", "converted"),
                ImportWarning::error("b", "skipped"),
            ],
        };
        assert_eq!(report.skipped_count(), 1);
    }
}
