//! Courier Application - Use cases and ports
//!
//! This crate defines the application layer with:
//! - Port traits (transport, script sandbox, codecs, storage, history)
//! - The variable resolver
//! - The send orchestrator
//! - Collection use cases
//! - Application-level error handling

pub mod error;
pub mod orchestrator;
pub mod ports;
pub mod use_cases;
pub mod variable_resolver;

pub use error::{ApplicationError, ApplicationResult};
pub use orchestrator::{SendOutcome, SendReport, SendRequest, TabHandle};
pub use ports::{
    Clock, CodecError, CollectionCodec, FileIo, FileIoError, HistoryError, HistorySink,
    ImportReport, ImportWarning, PersistenceError, Repository, ScriptSandbox, Transport,
    TransportError, TransportSet,
};
pub use use_cases::{
    ExportCollection, ImportCollection, ImportCollectionOutput, SaveRequestOutput,
    SaveRequestToCollection,
};
pub use variable_resolver::{ResolutionWarning, VariableResolver};
