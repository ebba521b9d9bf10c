//! Courier Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer: the HTTP transport, the script
//! sandbox, code generators, collection codecs and file storage.

pub mod adapters;
pub mod codec;
pub mod codegen;
pub mod config;
pub mod persistence;
pub mod scripting;
pub mod serialization;

pub use adapters::{ReqwestTransport, SystemClock};
pub use codec::{CollectionFormat, EnvironmentImport, NativeCodec, PostmanCodec};
pub use codegen::{CodeGeneratorRegistry, GenerationError};
pub use config::{CourierConfig, SettingsError, load_settings};
pub use persistence::{FileHistoryLog, JsonFileStore, TokioFileIo};
pub use scripting::{DslSandbox, ParseError, parse_script};
pub use serialization::{SerializationError, from_json_bytes, to_json_stable, to_json_stable_bytes};
