//! Environment and variable domain types

mod resolution;
mod variable;

pub use resolution::ResolutionContext;
pub use variable::{Environment, ResolvedVariable, Variable, VariableMap, VariableScope};
