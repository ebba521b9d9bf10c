//! Variable resolution module
//!
//! Provides parsing and resolution of `{{variable}}` syntax in strings.
//!
//! # Usage
//!
//! ```
//! use courier_application::variable_resolver::VariableResolver;
//! use courier_domain::environment::{Environment, ResolutionContext};
//!
//! let env = Environment::new("development").with("host", "localhost");
//! let ctx = ResolutionContext::new().with_environment(&env);
//! let mut resolver = VariableResolver::new(ctx);
//!
//! let result = resolver.resolve("http://{{host}}/api/\\{{raw}}");
//! assert_eq!(result.resolved, "http://localhost/api/{{raw}}");
//! ```

pub mod builtins;
pub mod engine;
pub mod parser;

pub use builtins::{BuiltinInfo, BuiltinVariables};
pub use engine::{RequestResolution, ResolutionResult, ResolutionWarning, VariableResolver};
pub use parser::{
    VariableReference, extract_variable_names, has_variables, is_valid_variable_name,
    parse_variables,
};
