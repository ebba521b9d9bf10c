//! Environment variable types

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::id::{Identified, generate_id};

/// A single variable value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    /// The variable value, substituted literally.
    #[serde(default)]
    pub value: String,

    /// Disabled variables are treated as absent during resolution.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

const fn default_enabled() -> bool {
    true
}

impl Variable {
    /// Creates an enabled variable.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            enabled: true,
        }
    }

    /// Creates a disabled variable.
    #[must_use]
    pub fn disabled(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            enabled: false,
        }
    }

    /// Returns the value if the variable is enabled.
    #[must_use]
    pub fn enabled_value(&self) -> Option<&str> {
        self.enabled.then_some(self.value.as_str())
    }
}

/// Variables keyed by name, in insertion order.
pub type VariableMap = IndexMap<String, Variable>;

/// Layer a variable was defined in.
///
/// Declaration order is lowest to highest precedence for user scopes.
/// Built-ins sit outside the ladder: they only answer names no user scope defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableScope {
    /// Dynamic values such as `$uuid`, generated on demand
    BuiltIn,
    /// Workspace-wide globals
    Global,
    /// Variables attached to the collection the request belongs to
    Collection,
    /// The active environment
    Environment,
    /// Tab overrides and pre-request script writes for one send
    Local,
}

impl VariableScope {
    /// User scopes from highest to lowest precedence.
    pub const PRECEDENCE: [Self; 4] = [Self::Local, Self::Environment, Self::Collection, Self::Global];

    /// Returns a human-readable name for the scope.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::BuiltIn => "Built-in",
            Self::Global => "Global",
            Self::Collection => "Collection",
            Self::Environment => "Environment",
            Self::Local => "Local",
        }
    }
}

/// A variable value together with the scope it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVariable {
    /// The variable name (without braces).
    pub name: String,
    /// The substituted value.
    pub value: String,
    /// The scope that supplied the value.
    pub scope: VariableScope,
}

/// A named, ordered set of variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// Stable identity
    pub id: String,
    /// Display name, e.g. "staging"
    pub name: String,
    /// Which layer this set fills when it takes part in resolution
    #[serde(default = "default_scope")]
    pub scope: VariableScope,
    /// The variables, in authoring order
    #[serde(default)]
    pub variables: VariableMap,
}

const fn default_scope() -> VariableScope {
    VariableScope::Environment
}

impl Environment {
    /// Creates an empty environment-scoped set.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            scope: VariableScope::Environment,
            variables: VariableMap::new(),
        }
    }

    /// Creates an empty global-scoped set.
    #[must_use]
    pub fn globals() -> Self {
        Self {
            scope: VariableScope::Global,
            ..Self::new("Globals")
        }
    }

    /// Adds or replaces an enabled variable, keeping its original position.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(name.into(), Variable::new(value));
    }

    /// Builder form of [`Environment::set`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Returns the value of an enabled variable.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.variables.get(name).and_then(Variable::enabled_value)
    }
}

impl Identified for Environment {
    fn id(&self) -> &str {
        &self.id
    }
}
