//! Variable parser for {{variable}} syntax
//!
//! Parses strings to extract variable references with their positions.
//! A backslash directly before `{{` escapes the placeholder: `\{{x}}` is
//! reported as an escaped reference whose span covers the backslash.

use std::ops::Range;

/// Represents a parsed variable reference in a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableReference {
    /// The variable name (without {{ }}).
    pub name: String,

    /// Whether this is a built-in variable (starts with $).
    pub is_builtin: bool,

    /// Whether the placeholder was written as `\{{name}}`.
    pub escaped: bool,

    /// Byte range in the original string where this reference appears.
    pub span: Range<usize>,
}

impl VariableReference {
    /// Creates a new variable reference.
    #[must_use]
    pub fn new(name: impl Into<String>, span: Range<usize>) -> Self {
        let name = name.into();
        let is_builtin = name.starts_with('$');
        Self {
            name,
            is_builtin,
            escaped: false,
            span,
        }
    }

    /// Creates an escaped reference. `span` includes the backslash.
    #[must_use]
    pub fn escaped(name: impl Into<String>, span: Range<usize>) -> Self {
        Self {
            escaped: true,
            ..Self::new(name, span)
        }
    }

    /// The text an escaped reference stands for: the placeholder without its backslash.
    #[must_use]
    pub fn literal<'a>(&self, input: &'a str) -> &'a str {
        if self.escaped {
            &input[self.span.start + 1..self.span.end]
        } else {
            &input[self.span.clone()]
        }
    }
}

/// Parses a string and extracts all variable references.
///
/// Supports:
/// - `{{variable_name}}` - user-defined variables
/// - `{{$uuid}}` - built-in dynamic variables
/// - `\{{name}}` - an escaped, literal placeholder
///
/// # Examples
///
/// ```
/// use courier_application::variable_resolver::parser::parse_variables;
///
/// let refs = parse_variables("Hello {{name}}, your ID is {{$uuid}}");
/// assert_eq!(refs.len(), 2);
/// assert_eq!(refs[0].name, "name");
/// assert_eq!(refs[1].name, "$uuid");
/// assert!(refs[1].is_builtin);
/// ```
#[must_use]
pub fn parse_variables(input: &str) -> Vec<VariableReference> {
    let bytes = input.as_bytes();
    let mut references = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some((i, ch)) = chars.next() {
        if ch != '{' || !matches!(chars.peek(), Some((_, '{'))) {
            continue;
        }
        chars.next(); // second {

        let escaped = i > 0 && bytes[i - 1] == b'\\';
        let start = if escaped { i - 1 } else { i };
        let mut name = String::new();
        let mut end = None;

        while let Some((_, ch)) = chars.next() {
            if ch == '}'
                && let Some(&(close_idx, '}')) = chars.peek()
            {
                chars.next(); // second }
                end = Some(close_idx + 1);
                break;
            }
            name.push(ch);
        }

        // Unclosed placeholder: nothing after it can close either.
        let Some(end) = end else {
            break;
        };

        let trimmed = name.trim();
        if trimmed.is_empty() {
            continue;
        }
        references.push(if escaped {
            VariableReference::escaped(trimmed, start..end)
        } else {
            VariableReference::new(trimmed, start..end)
        });
    }

    references
}

/// Validates a variable name.
/// Valid names: alphanumeric, underscore, hyphen, dot, and optionally starting with $ for built-ins.
#[must_use]
pub fn is_valid_variable_name(name: &str) -> bool {
    let name = name.strip_prefix('$').unwrap_or(name);

    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {}
        _ => return false,
    }

    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Returns true if the input string contains any variable references.
#[must_use]
pub fn has_variables(input: &str) -> bool {
    parse_variables(input).iter().any(|r| !r.escaped)
}

/// Extracts the names of unescaped references.
#[must_use]
pub fn extract_variable_names(input: &str) -> Vec<String> {
    parse_variables(input)
        .into_iter()
        .filter(|r| !r.escaped)
        .map(|r| r.name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_simple_variable() {
        let refs = parse_variables("{{name}}");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name, "name");
        assert!(!refs[0].is_builtin);
        assert_eq!(refs[0].span, 0..8);
    }

    #[test]
    fn test_parse_builtin_variable() {
        let refs = parse_variables("{{$uuid}}");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name, "$uuid");
        assert!(refs[0].is_builtin);
    }

    #[test]
    fn test_parse_multiple_variables() {
        let refs = parse_variables("{{base_url}}/api/{{version}}/users/{{$uuid}}");
        let names: Vec<&str> = refs.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["base_url", "version", "$uuid"]);
    }

    #[test]
    fn test_parse_with_whitespace() {
        let refs = parse_variables("{{ name }}");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name, "name");
    }

    #[test]
    fn test_unclosed_and_empty() {
        assert!(parse_variables("{{name").is_empty());
        assert!(parse_variables("{{}}").is_empty());
        assert!(parse_variables("{{   }}").is_empty());
        assert!(parse_variables("{name}").is_empty());
    }

    #[test]
    fn test_adjacent_variables() {
        let refs = parse_variables("{{a}}{{b}}{{c}}");
        assert_eq!(refs.len(), 3);
        assert_eq!(refs[2].span, 10..15);
    }

    #[test]
    fn test_escaped_placeholder() {
        let input = r"path/\{{id}}/{{id}}";
        let refs = parse_variables(input);
        assert_eq!(refs.len(), 2);
        assert!(refs[0].escaped);
        assert_eq!(&input[refs[0].span.clone()], r"\{{id}}");
        assert_eq!(refs[0].literal(input), "{{id}}");
        assert!(!refs[1].escaped);
    }

    #[test]
    fn test_span_positions_with_multibyte_text() {
        let input = "héllo {{name}}!";
        let refs = parse_variables(input);
        assert_eq!(&input[refs[0].span.clone()], "{{name}}");
    }

    #[test]
    fn test_valid_variable_names() {
        assert!(is_valid_variable_name("name"));
        assert!(is_valid_variable_name("my_var"));
        assert!(is_valid_variable_name("var-name"));
        assert!(is_valid_variable_name("api.v2"));
        assert!(is_valid_variable_name("$uuid"));
        assert!(!is_valid_variable_name(""));
        assert!(!is_valid_variable_name("$"));
        assert!(!is_valid_variable_name("123var"));
    }

    #[test]
    fn test_has_variables_ignores_escaped() {
        assert!(has_variables("Hello {{name}}!"));
        assert!(!has_variables(r"\{{name}}"));
        assert!(!has_variables("{{incomplete"));
    }

    #[test]
    fn test_extract_variable_names() {
        assert_eq!(extract_variable_names(r"{{a}} \{{b}} {{c}}"), vec!["a", "c"]);
    }
}
