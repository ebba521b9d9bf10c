//! Postman Collection v2.1 codec
//!
//! Imports and exports collections in the Postman v2.1 format, plus import of
//! Postman environment files. Protocols Postman has no notion of travel in the
//! `x-courier` item extension, so an export followed by an import gives back
//! the same requests.

mod environment;
mod exporter;
mod importer;
pub mod types;

use courier_application::{CodecError, CollectionCodec, ImportReport};
use courier_domain::collection::Collection;
use courier_domain::settings::ImportLimits;

use crate::serialization::to_json_stable_bytes;

pub use environment::EnvironmentImport;

/// Postman v2.1 codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostmanCodec {
    limits: ImportLimits,
}

impl PostmanCodec {
    /// Creates a codec with the given import limits.
    #[must_use]
    pub const fn new(limits: ImportLimits) -> Self {
        Self { limits }
    }

    /// Decodes a Postman environment file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is too large, not JSON, or lacks a `name`.
    pub fn decode_environment(&self, bytes: &[u8]) -> Result<EnvironmentImport, CodecError> {
        environment::decode_environment(bytes, &self.limits)
    }
}

impl CollectionCodec for PostmanCodec {
    fn format_name(&self) -> &'static str {
        "postman"
    }

    fn decode(&self, bytes: &[u8]) -> Result<ImportReport, CodecError> {
        importer::decode_collection(bytes, &self.limits)
    }

    fn encode(&self, collection: &Collection) -> Result<Vec<u8>, CodecError> {
        let document = exporter::encode_collection(collection)
            .map_err(|e| CodecError::Encode(e.to_string()))?;
        to_json_stable_bytes(&document).map_err(|e| CodecError::Encode(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use courier_domain::collection::{CollectionItem, Folder};
    use courier_domain::environment::Variable;
    use courier_domain::request::{
        ApiKeyLocation, AuthConfig, BodyKind, GrpcRequest, HttpMethod, HttpRequest, KeyValue,
        Request, RequestBody,
    };
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn round_trip(collection: &Collection) -> ImportReport {
        let codec = PostmanCodec::default();
        let bytes = codec.encode(collection).expect("encode");
        codec.decode(&bytes).expect("decode")
    }

    fn assert_same_requests(left: &Collection, right: &Collection) {
        let left = left.requests();
        let right = right.requests();
        assert_eq!(left.len(), right.len());
        for (a, b) in left.iter().zip(&right) {
            assert!(a.content_eq(b), "{a:#?}\n!=\n{b:#?}");
        }
    }

    #[test]
    fn test_other_protocols_round_trip() {
        let grpc = GrpcRequest::new("helloworld.Greeter", "SayHello")
            .with_proto_file("protos/hello.proto")
            .with_message(r#"{"name": "{{user}}"}"#)
            .with_metadata("authorization", "Bearer {{token}}");
        let collection = Collection::new("Streams")
            .with_request(Request::websocket("Chat", "wss://chat.test/socket?room=1"))
            .with_folder(
                Folder::new("Live").with_request(
                    Request::sse("Feed", "https://feed.test/events")
                        .with_pre_request_script("set(\"since\", \"0\")"),
                ),
            )
            .with_request(
                Request::grpc("Hello", "grpc://localhost:50051", grpc)
                    .with_test_script("test(\"ok\", \"true\")\n"),
            );

        let report = round_trip(&collection);

        assert!(report.warnings.is_empty());
        assert_eq!(report.collection.id, collection.id);
        assert_same_requests(&collection, &report.collection);
    }

    #[test]
    fn test_http_round_trip() {
        let mut http = HttpRequest::new(HttpMethod::Put)
            .with_header("Content-Type", "application/xml")
            .with_query("dry_run", "true")
            .with_body(RequestBody::new(BodyKind::Xml, "<user>{{name}}</user>"))
            .with_auth(AuthConfig::api_key("key", "{{key}}", ApiKeyLocation::Query));
        http.headers.add(KeyValue::disabled("X-Debug", "1"));
        let mut collection = Collection::new("API")
            .with_request(Request::http_with("Update", "{{base}}/users/1", http))
            .with_request(Request::http_with(
                "Login",
                "{{base}}/login",
                HttpRequest::new(HttpMethod::Post)
                    .with_body(RequestBody::new(BodyKind::FormUrlEncoded, "user=a&pass=b"))
                    .with_auth(AuthConfig::basic("a", "b")),
            ));
        collection.description = Some("Main API".to_string());
        collection
            .variables
            .insert("base".to_string(), Variable::new("https://api.test"));
        collection
            .variables
            .insert("stale".to_string(), Variable::disabled("x"));

        let report = round_trip(&collection);

        assert!(report.warnings.is_empty());
        assert_eq!(report.collection.description, collection.description);
        assert_eq!(report.collection.variables, collection.variables);
        assert_same_requests(&collection, &report.collection);
    }

    #[test]
    fn test_postman_document_round_trip_keeps_unknown_fields() {
        let document = json!({
            "info": {
                "_postman_id": "c-1",
                "name": "Petstore",
                "schema": types::SCHEMA_V21,
                "_exporter_id": "42"
            },
            "item": [{
                "name": "Pets",
                "id": "f-1",
                "auth": {"type": "noauth"},
                "event": [{"listen": "prerequest", "script": {"exec": [""]}}],
                "item": [{
                    "name": "List pets",
                    "id": "r-1",
                    "protocolProfileBehavior": {"disableBodyPruning": true},
                    "event": [{"listen": "other", "script": {"exec": ["x"]}}],
                    "request": {
                        "method": "GET",
                        "url": {"raw": "https://pets.test/pets"},
                        "description": "All pets"
                    },
                    "response": []
                }]
            }],
            "event": [],
            "auth": {"type": "bearer", "bearer": [{"key": "token", "value": "t"}]}
        });
        let codec = PostmanCodec::default();

        let first = codec.decode(document.to_string().as_bytes()).unwrap();
        let exported: Value =
            serde_json::from_slice(&codec.encode(&first.collection).unwrap()).unwrap();
        let second = codec.decode(&serde_json::to_vec(&exported).unwrap()).unwrap();

        assert_eq!(exported["info"]["_exporter_id"], json!("42"));
        assert_eq!(exported["auth"], document["auth"]);
        let folder = &exported["item"][0];
        assert_eq!(folder["auth"], json!({"type": "noauth"}));
        assert_eq!(folder["event"], document["item"][0]["event"]);
        let item = &folder["item"][0];
        assert_eq!(item["protocolProfileBehavior"], json!({"disableBodyPruning": true}));
        assert_eq!(item["event"][0]["listen"], json!("other"));
        assert_eq!(item["request"]["description"], json!("All pets"));
        assert_eq!(item["response"], json!([]));

        assert_eq!(first.collection.extras, second.collection.extras);
        let CollectionItem::Folder(folder) = &second.collection.items[0] else {
            panic!("expected folder");
        };
        assert_eq!(folder.id, "f-1");
        assert_same_requests(&first.collection, &second.collection);
    }

    #[test]
    fn test_inline_query_and_bare_form_fields_round_trip() {
        let collection = Collection::new("Search")
            .with_request(Request::http("Find", HttpMethod::Get, "https://api.test/search?q=rust"))
            .with_request(Request::http_with(
                "Mixed",
                "https://api.test/items?fixed=1",
                HttpRequest::new(HttpMethod::Get).with_query("page", "2"),
            ))
            .with_request(Request::http_with(
                "Flags",
                "https://api.test/flags",
                HttpRequest::new(HttpMethod::Post)
                    .with_body(RequestBody::new(BodyKind::FormUrlEncoded, "flag&x=1&&y=")),
            ));

        let report = round_trip(&collection);

        assert!(report.warnings.is_empty());
        assert_same_requests(&collection, &report.collection);
    }

    #[test]
    fn test_structured_url_parts_survive_round_trip() {
        let document = json!({
            "info": {"name": "Users", "schema": types::SCHEMA_V21},
            "item": [{
                "name": "Get user",
                "request": {
                    "method": "GET",
                    "header": [{"key": "Accept", "value": "*/*", "type": "text"}],
                    "url": {
                        "protocol": "https",
                        "host": ["api", "test"],
                        "path": ["users", ":id"],
                        "query": [{"key": "v", "value": "2", "description": "API version"}],
                        "variable": [{"key": "id", "value": "42"}]
                    }
                }
            }]
        });
        let codec = PostmanCodec::default();

        let first = codec.decode(document.to_string().as_bytes()).unwrap();
        let exported: Value =
            serde_json::from_slice(&codec.encode(&first.collection).unwrap()).unwrap();
        let second = codec.decode(&serde_json::to_vec(&exported).unwrap()).unwrap();

        assert!(first.warnings.is_empty());
        assert_eq!(first.collection.requests()[0].url, "https://api.test/users/:id");
        let request = &exported["item"][0]["request"];
        assert_eq!(request["url"]["raw"], json!("https://api.test/users/:id?v=2"));
        assert_eq!(request["url"]["host"], json!(["api", "test"]));
        assert_eq!(request["url"]["variable"], json!([{"key": "id", "value": "42"}]));
        assert_eq!(request["url"]["query"][0]["description"], json!("API version"));
        assert_eq!(request["header"][0]["type"], json!("text"));
        assert_same_requests(&first.collection, &second.collection);
        assert_eq!(
            first.collection.requests()[0].extras,
            second.collection.requests()[0].extras
        );
    }

    #[test]
    fn test_partial_import_reports_skipped_item() {
        let mut items: Vec<Value> = (1..=9)
            .map(|i| {
                json!({
                    "name": format!("Request {i}"),
                    "request": {"method": "GET", "url": {"raw": format!("https://api.test/{i}")}}
                })
            })
            .collect();
        items.push(json!({"name": "Broken", "request": {"method": 7}}));
        let document = json!({
            "info": {"name": "Ten", "schema": types::SCHEMA_V21},
            "item": items
        });

        let report = PostmanCodec::default()
            .decode(document.to_string().as_bytes())
            .unwrap();

        assert_eq!(report.collection.request_count(), 9);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.skipped_count(), 1);
        assert_eq!(report.warnings[0].path, "Ten/Broken");
    }

    #[test]
    fn test_encode_is_deterministic() {
        let collection = Collection::new("API")
            .with_request(Request::http("A", HttpMethod::Get, "https://a.test"));
        let codec = PostmanCodec::default();
        assert_eq!(codec.encode(&collection).unwrap(), codec.encode(&collection).unwrap());
        assert!(codec.encode(&collection).unwrap().ends_with(b"\n"));
    }

    #[test]
    fn test_decode_environment_through_codec() {
        let bytes = br#"{"name": "Local", "values": [{"key": "base", "value": "http://localhost"}]}"#;
        let imported = PostmanCodec::default().decode_environment(bytes).unwrap();
        assert_eq!(imported.environment.get("base"), Some("http://localhost"));
    }
}
