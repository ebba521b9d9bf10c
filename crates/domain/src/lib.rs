//! Courier Domain - Core business types
//!
//! This crate defines the data model of the Courier API client core:
//! the protocol-tagged request union, layered variables, the script result
//! contract, responses, tabs, collections, history and the send state machine.
//! All types here are pure Rust with no I/O dependencies.

pub mod collection;
pub mod environment;
pub mod error;
pub mod history;
pub mod id;
pub mod request;
pub mod response;
pub mod scripting;
pub mod settings;
pub mod state;
pub mod tab;

pub use collection::{Collection, CollectionItem, Folder};
pub use environment::{
    Environment, ResolutionContext, ResolvedVariable, Variable, VariableMap, VariableScope,
};
pub use error::{DomainError, DomainResult};
pub use history::{HistoryEntry, RequestHistory};
pub use id::{Identified, generate_id, is_valid_id};
pub use request::{
    ApiKeyLocation, AuthConfig, BodyKind, GrpcRequest, HttpMethod, HttpRequest, KeyValue,
    KeyValueList, Protocol, QueryEncoding, Request, RequestBody, RequestKind, ResolvedRequest,
};
pub use response::{RawResponse, Response};
pub use scripting::{
    ConsoleLog, LogLevel, ScriptContext, ScriptExecutionResult, ScriptOutcome, ScriptPhase,
    ScriptRequestInfo, TestResult,
};
pub use settings::{EngineSettings, ImportLimits};
pub use state::{SendErrorKind, SendFailure, SendState};
pub use tab::Tab;
