//! Resolution context for variable substitution
//!
//! Holds every variable layer that takes part in one send.

use indexmap::IndexMap;

use super::variable::{Environment, ResolvedVariable, Variable, VariableMap, VariableScope};

/// All variable layers for one resolution.
///
/// Variables are resolved in order of precedence (highest wins):
/// 1. Local (tab overrides, pre-request script writes)
/// 2. Environment (the active environment)
/// 3. Collection (variables of the owning collection)
/// 4. Global
///
/// The context is a plain value: cloning it is how a send snapshots the
/// environments it started with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionContext {
    /// Tab overrides and script writes.
    pub local: VariableMap,

    /// Active environment variables.
    pub environment: VariableMap,

    /// Active environment name (for display purposes).
    pub environment_name: Option<String>,

    /// Collection-level variables.
    pub collection: VariableMap,

    /// Global variables.
    pub globals: VariableMap,
}

impl ResolutionContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the active environment.
    #[must_use]
    pub fn with_environment(mut self, environment: &Environment) -> Self {
        self.environment.clone_from(&environment.variables);
        self.environment_name = Some(environment.name.clone());
        self
    }

    /// Sets the collection variables.
    #[must_use]
    pub fn with_collection(mut self, variables: &VariableMap) -> Self {
        self.collection.clone_from(variables);
        self
    }

    /// Sets the global variables.
    #[must_use]
    pub fn with_globals(mut self, globals: &Environment) -> Self {
        self.globals.clone_from(&globals.variables);
        self
    }

    /// Places `environment` in the layer its scope tag names.
    #[must_use]
    pub fn with_layer(self, environment: &Environment) -> Self {
        match environment.scope {
            VariableScope::Global => self.with_globals(environment),
            VariableScope::Collection => self.with_collection(&environment.variables),
            VariableScope::Local => {
                let mut ctx = self;
                ctx.local.clone_from(&environment.variables);
                ctx
            }
            VariableScope::Environment | VariableScope::BuiltIn => {
                self.with_environment(environment)
            }
        }
    }

    /// Writes a local value, shadowing every other layer.
    pub fn set_local(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.local.insert(name.into(), Variable::new(value));
    }

    /// Layers plain name/value pairs over the local scope.
    pub fn extend_local<'a>(&mut self, values: impl IntoIterator<Item = (&'a String, &'a String)>) {
        for (name, value) in values {
            self.set_local(name.clone(), value.clone());
        }
    }

    /// Returns the variables of one layer.
    #[must_use]
    pub fn layer(&self, scope: VariableScope) -> Option<&VariableMap> {
        match scope {
            VariableScope::Local => Some(&self.local),
            VariableScope::Environment => Some(&self.environment),
            VariableScope::Collection => Some(&self.collection),
            VariableScope::Global => Some(&self.globals),
            VariableScope::BuiltIn => None,
        }
    }

    /// Resolves a name against the user layers.
    ///
    /// The first layer that defines an enabled variable wins; lower layers
    /// are not consulted. Built-ins are handled by the resolver engine.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<ResolvedVariable> {
        VariableScope::PRECEDENCE.iter().find_map(|&scope| {
            self.layer(scope)
                .and_then(|layer| layer.get(name))
                .and_then(Variable::enabled_value)
                .map(|value| ResolvedVariable {
                    name: name.to_string(),
                    value: value.to_string(),
                    scope,
                })
        })
    }

    /// Resolves a name to just its value.
    #[must_use]
    pub fn resolve_value(&self, name: &str) -> Option<String> {
        self.resolve(name).map(|r| r.value)
    }

    /// Returns the winning value of every defined name.
    ///
    /// Order: lowest layer first, names in each layer's own order, so the
    /// result is stable across calls.
    #[must_use]
    pub fn effective_values(&self) -> IndexMap<String, String> {
        let mut values = IndexMap::new();
        for scope in VariableScope::PRECEDENCE.iter().rev() {
            let Some(layer) = self.layer(*scope) else {
                continue;
            };
            for (name, variable) in layer {
                if let Some(value) = variable.enabled_value() {
                    values.insert(name.clone(), value.to_string());
                }
            }
        }
        values
    }
}
