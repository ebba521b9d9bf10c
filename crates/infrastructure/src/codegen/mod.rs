//! Code generation infrastructure.
//!
//! Turns an `http` request template into a runnable snippet for one of the
//! registered languages.

mod generator;
mod registry;

pub use generator::HttpSnippet;
pub use registry::{CodeGeneratorRegistry, GenerateFn, GenerationError, LanguageEntry};
