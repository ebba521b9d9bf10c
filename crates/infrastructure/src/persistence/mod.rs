//! File-based persistence adapters.

mod file_system;
mod history_log;
mod json_store;

pub use file_system::{TokioFileIo, write_atomic};
pub use history_log::FileHistoryLog;
pub use json_store::JsonFileStore;
