//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the application core and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod clock;
mod codec;
mod file_io;
mod history;
mod repository;
mod script_sandbox;
mod transport;

pub use clock::Clock;
pub use codec::{CodecError, CollectionCodec, ImportReport, ImportWarning, WarningSeverity};
pub use file_io::{FileIo, FileIoError};
pub use history::{HistoryError, HistorySink};
pub use repository::{PersistenceError, Repository};
pub use script_sandbox::ScriptSandbox;
pub use transport::{Transport, TransportError, TransportSet};
