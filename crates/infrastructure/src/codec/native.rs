//! The native collection file.
//!
//! A versioned envelope around the serde form of [`Collection`]:
//! `{"format": "courier.collection", "version": 1, "collection": {...}}`.

use courier_application::{CodecError, CollectionCodec, ImportReport};
use courier_domain::collection::Collection;
use courier_domain::settings::ImportLimits;
use serde::Serialize;
use serde_json::Value;

use super::check_size;
use crate::serialization::to_json_stable_bytes;

/// Value of the envelope's `format` field.
pub const NATIVE_FORMAT: &str = "courier.collection";

/// Newest envelope version this build reads and the one it writes.
pub const NATIVE_VERSION: u64 = 1;

#[derive(Serialize)]
struct Envelope<'a> {
    format: &'static str,
    version: u64,
    collection: &'a Collection,
}

/// Codec for the native collection file.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeCodec {
    limits: ImportLimits,
}

impl NativeCodec {
    /// Creates a codec with the given import limits.
    #[must_use]
    pub const fn new(limits: ImportLimits) -> Self {
        Self { limits }
    }
}

impl CollectionCodec for NativeCodec {
    fn format_name(&self) -> &'static str {
        "native"
    }

    fn decode(&self, bytes: &[u8]) -> Result<ImportReport, CodecError> {
        check_size(bytes, &self.limits)?;
        let document: Value =
            serde_json::from_slice(bytes).map_err(|e| CodecError::Malformed(e.to_string()))?;
        let Value::Object(mut root) = document else {
            return Err(CodecError::invalid("document", "must be a JSON object"));
        };

        if root.get("format").and_then(Value::as_str) != Some(NATIVE_FORMAT) {
            return Err(CodecError::invalid(
                "format",
                format!("must be \"{NATIVE_FORMAT}\""),
            ));
        }
        let Some(version) = root.get("version").and_then(Value::as_u64) else {
            return Err(CodecError::invalid("version", "must be a non-negative integer"));
        };
        if version > NATIVE_VERSION {
            return Err(CodecError::UnsupportedVersion {
                found: version,
                supported: NATIVE_VERSION,
            });
        }

        let collection = root
            .remove("collection")
            .ok_or_else(|| CodecError::invalid("collection", "is missing"))?;
        let collection = serde_json::from_value(collection)
            .map_err(|e| CodecError::invalid("collection", e.to_string()))?;

        Ok(ImportReport {
            collection,
            warnings: Vec::new(),
        })
    }

    fn encode(&self, collection: &Collection) -> Result<Vec<u8>, CodecError> {
        to_json_stable_bytes(&Envelope {
            format: NATIVE_FORMAT,
            version: NATIVE_VERSION,
            collection,
        })
        .map_err(|e| CodecError::Encode(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use courier_domain::collection::Folder;
    use courier_domain::request::{GrpcRequest, HttpMethod, Request};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> Collection {
        let mut request = Request::http("List", HttpMethod::Get, "{{base}}/items");
        request.extras.insert("response".into(), json!([]));
        Collection::new("Native")
            .with_folder(Folder::new("Calls").with_request(Request::grpc(
                "Hello",
                "grpc://localhost:50051",
                GrpcRequest::new("hello.Greeter", "SayHello"),
            )))
            .with_request(request)
            .with_request(Request::websocket("Socket", "wss://ws.test"))
    }

    #[test]
    fn test_envelope_fields() {
        let bytes = NativeCodec::default().encode(&sample()).unwrap();
        let document: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(document["format"], json!("courier.collection"));
        assert_eq!(document["version"], json!(1));
        assert_eq!(document["collection"]["name"], json!("Native"));
    }

    #[test]
    fn test_round_trip_is_exact() {
        let codec = NativeCodec::default();
        let collection = sample();

        let report = codec.decode(&codec.encode(&collection).unwrap()).unwrap();

        assert!(report.warnings.is_empty());
        assert_eq!(
            serde_json::to_value(&report.collection).unwrap(),
            serde_json::to_value(&collection).unwrap()
        );
        assert_eq!(codec.encode(&report.collection).unwrap(), codec.encode(&collection).unwrap());
    }

    #[test]
    fn test_newer_version_is_rejected() {
        let bytes = json!({"format": NATIVE_FORMAT, "version": 2, "collection": {}}).to_string();
        assert_eq!(
            NativeCodec::default().decode(bytes.as_bytes()).unwrap_err(),
            CodecError::UnsupportedVersion {
                found: 2,
                supported: 1,
            }
        );
    }

    #[test]
    fn test_wrong_format_is_rejected() {
        let bytes = json!({"format": "other", "version": 1, "collection": {}}).to_string();
        assert!(matches!(
            NativeCodec::default().decode(bytes.as_bytes()),
            Err(CodecError::InvalidDocument { .. })
        ));
    }

    #[test]
    fn test_bad_collection_is_a_file_error() {
        let bytes = json!({"format": NATIVE_FORMAT, "version": 1, "collection": {"items": 3}})
            .to_string();
        assert!(matches!(
            NativeCodec::default().decode(bytes.as_bytes()),
            Err(CodecError::InvalidDocument { field, .. }) if field == "collection"
        ));
    }
}
