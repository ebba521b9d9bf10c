//! Script execution infrastructure.
//!
//! A small line-oriented DSL, its interpreter, and the sandbox that runs it
//! isolated on its own task with a wall-clock limit.

mod executor;
mod parser;
mod sandbox;

pub use executor::{Interpreter, ScriptEvent};
pub use parser::{ParseError, Statement, parse_script};
pub use sandbox::DslSandbox;
