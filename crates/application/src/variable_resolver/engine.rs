//! Variable resolution engine
//!
//! Resolves `{{variable}}` references according to precedence rules.
//! Substitution is a single pass: a substituted value is never scanned again.

use std::collections::HashMap;
use std::fmt;

use courier_domain::environment::{ResolutionContext, ResolvedVariable, VariableScope};
use courier_domain::request::{Request, ResolvedRequest};

use super::builtins::BuiltinVariables;
use super::parser::parse_variables;

/// Result of variable resolution for a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionResult {
    /// The resolved string with all variables substituted.
    pub resolved: String,

    /// Variables that were successfully resolved.
    pub resolved_variables: Vec<ResolvedVariable>,

    /// Variable names that could not be resolved. Their placeholders stay in `resolved`.
    pub unresolved: Vec<String>,
}

impl ResolutionResult {
    /// Creates a result for input with no variables.
    #[must_use]
    pub fn no_variables(input: &str) -> Self {
        Self {
            resolved: input.to_string(),
            resolved_variables: Vec::new(),
            unresolved: Vec::new(),
        }
    }

    /// Whether all variables were successfully resolved.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// A placeholder that no scope could answer.
///
/// Never fatal: the placeholder is sent as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionWarning {
    /// Field the placeholder was found in, e.g. `url` or `header:Authorization`.
    pub field: String,
    /// The variable name.
    pub variable: String,
}

impl fmt::Display for ResolutionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "variable '{}' not found ({})", self.variable, self.field)
    }
}

/// A request after resolution, plus everything resolution noticed.
#[derive(Debug, Clone)]
pub struct RequestResolution {
    /// The request with every templated value substituted.
    pub request: ResolvedRequest,
    /// Unresolved placeholders, in field order.
    pub warnings: Vec<ResolutionWarning>,
    /// Every substitution that happened.
    pub resolved_variables: Vec<ResolvedVariable>,
}

/// The variable resolution engine.
///
/// User scopes are consulted first (local, environment, collection, global);
/// built-ins only answer names none of them define. A built-in yields one
/// value for the lifetime of the resolver, so one send sees one `$uuid`.
#[derive(Debug, Clone, Default)]
pub struct VariableResolver {
    context: ResolutionContext,
    builtin_cache: HashMap<String, String>,
}

impl VariableResolver {
    /// Creates a new resolver with the given context.
    #[must_use]
    pub fn new(context: ResolutionContext) -> Self {
        Self {
            context,
            builtin_cache: HashMap::new(),
        }
    }

    /// Replaces the context, keeping generated built-ins.
    pub fn set_context(&mut self, context: ResolutionContext) {
        self.context = context;
    }

    /// Returns a reference to the current context.
    #[must_use]
    pub const fn context(&self) -> &ResolutionContext {
        &self.context
    }

    /// Returns a mutable reference to the current context.
    pub const fn context_mut(&mut self) -> &mut ResolutionContext {
        &mut self.context
    }

    /// Clears the built-in variable cache so the next lookup generates fresh values.
    pub fn clear_builtin_cache(&mut self) {
        self.builtin_cache.clear();
    }

    /// Resolves all variables in the input string.
    pub fn resolve(&mut self, input: &str) -> ResolutionResult {
        let references = parse_variables(input);

        if references.is_empty() {
            return ResolutionResult::no_variables(input);
        }

        let mut resolved_variables = Vec::new();
        let mut unresolved = Vec::new();
        let mut result = String::with_capacity(input.len());
        let mut last_end = 0;

        for var_ref in &references {
            result.push_str(&input[last_end..var_ref.span.start]);

            if var_ref.escaped {
                result.push_str(var_ref.literal(input));
            } else if let Some(resolved) = self.resolve_variable(&var_ref.name) {
                result.push_str(&resolved.value);
                resolved_variables.push(resolved);
            } else {
                result.push_str(&input[var_ref.span.clone()]);
                unresolved.push(var_ref.name.clone());
            }

            last_end = var_ref.span.end;
        }

        result.push_str(&input[last_end..]);

        ResolutionResult {
            resolved: result,
            resolved_variables,
            unresolved,
        }
    }

    /// Resolves every templated value of `request`.
    ///
    /// Keys, names and scripts are left untouched. Unresolved placeholders
    /// are kept verbatim and reported with the field they were found in.
    pub fn resolve_request(&mut self, request: &Request) -> RequestResolution {
        let mut resolved = request.clone();
        let mut warnings = Vec::new();
        let mut resolved_variables = Vec::new();

        resolved.map_templates(|field, value| {
            let result = self.resolve(value);
            warnings.extend(result.unresolved.into_iter().map(|variable| ResolutionWarning {
                field: field.to_string(),
                variable,
            }));
            resolved_variables.extend(result.resolved_variables);
            result.resolved
        });

        RequestResolution {
            request: ResolvedRequest::new(resolved),
            warnings,
            resolved_variables,
        }
    }

    /// Resolves just the value of a single variable.
    pub fn resolve_value(&mut self, name: &str) -> Option<String> {
        self.resolve_variable(name).map(|r| r.value)
    }

    /// Lists unescaped names in `input` that would not resolve.
    #[must_use]
    pub fn find_unresolved(&self, input: &str) -> Vec<String> {
        parse_variables(input)
            .into_iter()
            .filter(|r| !r.escaped)
            .filter(|r| self.context.resolve(&r.name).is_none() && !BuiltinVariables::is_builtin(&r.name))
            .map(|r| r.name)
            .collect()
    }

    fn resolve_variable(&mut self, name: &str) -> Option<ResolvedVariable> {
        if let Some(user) = self.context.resolve(name) {
            return Some(user);
        }

        let value = match self.builtin_cache.get(name) {
            Some(cached) => cached.clone(),
            None => {
                let generated = BuiltinVariables::resolve(name)?;
                self.builtin_cache.insert(name.to_string(), generated.clone());
                generated
            }
        };

        Some(ResolvedVariable {
            name: name.to_string(),
            value,
            scope: VariableScope::BuiltIn,
        })
    }
}
