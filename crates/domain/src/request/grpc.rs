//! Data carried only by `grpc` requests

use serde::{Deserialize, Serialize};

use super::Metadata;

/// Where the service schema comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ProtoSource {
    /// Ask the server through gRPC server reflection.
    #[default]
    Reflection,
    /// Load a local `.proto` file.
    File {
        /// Path to the `.proto` file
        path: String,
    },
}

/// Service, method, message and metadata of a `grpc` request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GrpcRequest {
    /// Schema source
    #[serde(default)]
    pub proto: ProtoSource,
    /// Fully qualified service name, e.g. `helloworld.Greeter`
    #[serde(default)]
    pub service_name: String,
    /// Method name, e.g. `SayHello`
    #[serde(default)]
    pub method_name: String,
    /// Request message as JSON text. May contain placeholders.
    #[serde(default)]
    pub message: String,
    /// Call metadata, same shape as HTTP headers
    #[serde(default)]
    pub metadata: Metadata,
}

impl GrpcRequest {
    /// Creates a call description using server reflection.
    #[must_use]
    pub fn new(service_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            method_name: method_name.into(),
            ..Self::default()
        }
    }

    /// Loads the schema from a `.proto` file instead of reflection.
    #[must_use]
    pub fn with_proto_file(mut self, path: impl Into<String>) -> Self {
        self.proto = ProtoSource::File { path: path.into() };
        self
    }

    /// Sets the JSON request message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Adds an enabled metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata = self.metadata.with(key, value);
        self
    }

    /// Returns `/<service>/<method>`, the HTTP/2 path of the call.
    #[must_use]
    pub fn full_method(&self) -> String {
        format!("/{}/{}", self.service_name, self.method_name)
    }

    /// Returns true when reflection is used instead of a `.proto` file.
    #[must_use]
    pub const fn uses_reflection(&self) -> bool {
        matches!(self.proto, ProtoSource::Reflection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_full_method_path() {
        let call = GrpcRequest::new("helloworld.Greeter", "SayHello");
        assert_eq!(call.full_method(), "/helloworld.Greeter/SayHello");
        assert!(call.uses_reflection());
    }

    #[test]
    fn test_proto_file_source() {
        let call = GrpcRequest::new("a.B", "C").with_proto_file("protos/a.proto");
        assert_eq!(
            call.proto,
            ProtoSource::File {
                path: "protos/a.proto".to_string()
            }
        );
        assert!(!call.uses_reflection());
    }
}
