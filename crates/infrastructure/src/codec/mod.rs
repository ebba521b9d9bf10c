//! Collection codecs: the native file format and Postman v2.1.

mod native;
pub mod postman;

use courier_application::{CodecError, CollectionCodec};
use courier_domain::settings::ImportLimits;
use serde_json::Value;

pub use native::{NATIVE_FORMAT, NATIVE_VERSION, NativeCodec};
pub use postman::{EnvironmentImport, PostmanCodec};

/// Interchange formats Courier reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionFormat {
    /// `courier.collection` envelope
    Native,
    /// Postman Collection v2.1
    Postman,
}

impl CollectionFormat {
    /// Guesses the format of a document from its top-level fields.
    #[must_use]
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        let document: Value = serde_json::from_slice(bytes).ok()?;
        if document.get("format").and_then(Value::as_str) == Some(NATIVE_FORMAT) {
            return Some(Self::Native);
        }
        document
            .get("info")
            .and_then(|info| info.get("schema"))
            .and_then(Value::as_str)
            .filter(|schema| schema.contains("postman.com"))
            .map(|_| Self::Postman)
    }

    /// Returns a codec for this format.
    #[must_use]
    pub fn codec(self, limits: ImportLimits) -> Box<dyn CollectionCodec> {
        match self {
            Self::Native => Box::new(NativeCodec::new(limits)),
            Self::Postman => Box::new(PostmanCodec::new(limits)),
        }
    }
}

/// Rejects files over the configured size.
pub(crate) fn check_size(bytes: &[u8], limits: &ImportLimits) -> Result<(), CodecError> {
    if bytes.len() > limits.max_file_size {
        return Err(CodecError::TooLarge {
            size: bytes.len(),
            max: limits.max_file_size,
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_detect_format() {
        let native = br#"{"format": "courier.collection", "version": 1, "collection": {}}"#;
        let postman = br#"{"info": {"name": "x", "schema": "https://schema.getpostman.com/json/collection/v2.1.0/collection.json"}, "item": []}"#;
        assert_eq!(CollectionFormat::detect(native), Some(CollectionFormat::Native));
        assert_eq!(CollectionFormat::detect(postman), Some(CollectionFormat::Postman));
        assert_eq!(CollectionFormat::detect(b"[]"), None);
        assert_eq!(CollectionFormat::detect(b"not json"), None);
    }

    #[test]
    fn test_size_limit() {
        let limits = ImportLimits {
            max_file_size: 4,
            ..ImportLimits::default()
        };
        assert!(check_size(b"1234", &limits).is_ok());
        assert_eq!(
            check_size(b"12345", &limits).unwrap_err(),
            CodecError::TooLarge { size: 5, max: 4 }
        );
    }
}
