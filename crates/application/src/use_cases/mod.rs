//! Application use cases (business logic orchestration).

mod export_collection;
mod import_collection;
mod save_request;
#[cfg(test)]
mod test_support;

pub use export_collection::ExportCollection;
pub use import_collection::{ImportCollection, ImportCollectionOutput};
pub use save_request::{SaveRequestOutput, SaveRequestToCollection};
