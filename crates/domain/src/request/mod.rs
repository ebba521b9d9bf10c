//! Request model: a tagged union over the supported protocols

mod auth;
mod body;
mod grpc;
mod http;
mod method;
mod model;
mod pairs;

pub use auth::{ApiKeyLocation, AuthConfig};
pub use body::{BodyKind, RequestBody};
pub use grpc::{GrpcRequest, ProtoSource};
pub use http::{HttpRequest, QueryEncoding};
pub use method::HttpMethod;
pub use model::{Protocol, Request, RequestKind, ResolvedRequest};
pub use pairs::{Headers, KeyValue, KeyValueList, Metadata, QueryParams};
