//! Parser for the line-oriented script DSL.
//!
//! One statement per line, written as a call:
//! - `set("name", "value")` / `unset("name")` - write a variable
//! - `log(...)`, `info(...)`, `warn(...)`, `error(...)`, `debug(...)` - console
//!   output, also accepted with a `console.` prefix
//! - `test("name", "condition")` - record an assertion result
//! - `assert("condition", "message")` - stop the script when false
//! - `throw("message")` - stop the script
//! - `delay(ms)` - sleep
//!
//! Blank lines and lines starting with `//` or `#` are skipped. A trailing `;`
//! is allowed.

use courier_domain::scripting::LogLevel;
use thiserror::Error;

/// A parsed statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Writes a variable.
    Set {
        /// Variable name
        name: String,
        /// Value template
        value: String,
    },
    /// Removes a variable.
    Unset {
        /// Variable name
        name: String,
    },
    /// Console output.
    Log {
        /// Level of the line
        level: LogLevel,
        /// Message templates, joined with a space
        parts: Vec<String>,
    },
    /// Named assertion recorded as a test result.
    Test {
        /// Test name template
        name: String,
        /// Condition template
        condition: String,
    },
    /// Assertion that aborts the script when false.
    Assert {
        /// Condition template
        condition: String,
        /// Message used when the condition fails
        message: Option<String>,
    },
    /// Aborts the script.
    Throw {
        /// Message template
        message: String,
    },
    /// Sleeps for the given number of milliseconds.
    Delay {
        /// Milliseconds
        millis: u64,
    },
}

/// Error type for script parsing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Unknown command.
    #[error("Unknown command at line {line}: {name}")]
    UnknownCommand {
        /// The line number where the command appears.
        line: usize,
        /// The command name.
        name: String,
    },
    /// Invalid syntax.
    #[error("Invalid syntax at line {line}: {message}")]
    InvalidSyntax {
        /// The line number where the error occurred.
        line: usize,
        /// The error message.
        message: String,
    },
    /// Wrong number of arguments.
    #[error("Missing argument for command {command}: expected {expected}")]
    MissingArgument {
        /// The command name.
        command: String,
        /// The expected argument description.
        expected: String,
    },
    /// Invalid argument type.
    #[error("Invalid argument type for {command}: {message}")]
    InvalidArgument {
        /// The command name.
        command: String,
        /// The error message.
        message: String,
    },
}

/// Parses a whole script. Nothing runs unless every line parses.
///
/// # Errors
///
/// Returns the first syntax error found.
pub fn parse_script(script: &str) -> Result<Vec<Statement>, ParseError> {
    let mut statements = Vec::new();

    for (line_num, line) in script.lines().enumerate() {
        let line = line.trim();

        if line.is_empty() || line.starts_with("//") || line.starts_with('#') {
            continue;
        }

        let line = line.strip_suffix(';').unwrap_or(line).trim_end();
        statements.push(parse_line(line, line_num + 1)?);
    }

    Ok(statements)
}

fn parse_line(line: &str, line_num: usize) -> Result<Statement, ParseError> {
    let Some(paren_pos) = line.find('(') else {
        return Err(ParseError::InvalidSyntax {
            line: line_num,
            message: "Expected '(' after command name".to_string(),
        });
    };

    let command_name = line[..paren_pos].trim();
    let args_str = line[paren_pos..].trim();

    if !args_str.ends_with(')') {
        return Err(ParseError::InvalidSyntax {
            line: line_num,
            message: "Missing closing ')'".to_string(),
        });
    }

    let args = parse_arguments(&args_str[1..args_str.len() - 1], line_num)?;
    let expect = |count: std::ops::RangeInclusive<usize>, expected: &str| {
        if count.contains(&args.len()) {
            Ok(())
        } else {
            Err(ParseError::MissingArgument {
                command: command_name.to_string(),
                expected: expected.to_string(),
            })
        }
    };

    let name = command_name.strip_prefix("console.").unwrap_or(command_name);
    match name {
        "set" | "setVariable" => {
            expect(2..=2, "2 arguments (name, value)")?;
            Ok(Statement::Set {
                name: args[0].clone(),
                value: args[1].clone(),
            })
        }
        "unset" | "unsetVariable" => {
            expect(1..=1, "1 argument (name)")?;
            Ok(Statement::Unset {
                name: args[0].clone(),
            })
        }
        "log" | "info" | "warn" | "error" | "debug" => {
            expect(1..=usize::MAX, "at least 1 argument (message)")?;
            Ok(Statement::Log {
                level: log_level(name),
                parts: args,
            })
        }
        "test" => {
            expect(2..=2, "2 arguments (name, condition)")?;
            Ok(Statement::Test {
                name: args[0].clone(),
                condition: args[1].clone(),
            })
        }
        "assert" => {
            expect(1..=2, "1-2 arguments (condition, optional message)")?;
            Ok(Statement::Assert {
                condition: args[0].clone(),
                message: args.get(1).cloned(),
            })
        }
        "throw" => {
            expect(1..=1, "1 argument (message)")?;
            Ok(Statement::Throw {
                message: args[0].clone(),
            })
        }
        "delay" | "sleep" => {
            expect(1..=1, "1 argument (milliseconds)")?;
            let millis = args[0].parse().map_err(|_| ParseError::InvalidArgument {
                command: command_name.to_string(),
                message: format!("'{}' is not a valid number", args[0]),
            })?;
            Ok(Statement::Delay { millis })
        }
        _ => Err(ParseError::UnknownCommand {
            line: line_num,
            name: command_name.to_string(),
        }),
    }
}

fn log_level(name: &str) -> LogLevel {
    match name {
        "info" => LogLevel::Info,
        "warn" => LogLevel::Warn,
        "error" => LogLevel::Error,
        "debug" => LogLevel::Debug,
        _ => LogLevel::Log,
    }
}

fn parse_arguments(args_str: &str, line_num: usize) -> Result<Vec<String>, ParseError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_string = false;
    let mut string_char = '"';
    let mut escape_next = false;

    for ch in args_str.chars() {
        if escape_next {
            if !matches!(ch, '"' | '\'' | '\\') {
                current.push('\\');
            }
            current.push(ch);
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' | '\'' => {
                if !in_string {
                    in_string = true;
                    string_char = ch;
                } else if ch == string_char {
                    in_string = false;
                } else {
                    current.push(ch);
                }
            }
            ',' if !in_string => {
                args.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if in_string {
        return Err(ParseError::InvalidSyntax {
            line: line_num,
            message: "Unterminated string".to_string(),
        });
    }

    let last = current.trim();
    if !last.is_empty() || !args.is_empty() {
        args.push(last.to_string());
    }

    Ok(args)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_set_variable() {
        let statements = parse_script(r#"set("token", "abc123")"#).expect("should parse");
        assert_eq!(
            statements,
            vec![Statement::Set {
                name: "token".to_string(),
                value: "abc123".to_string(),
            }]
        );
    }

    #[test]
    fn test_parse_log_levels() {
        let script = r#"
            console.log("a", "b")
            warn("careful")
            console.error("bad")
        "#;
        let levels: Vec<LogLevel> = parse_script(script)
            .unwrap()
            .into_iter()
            .map(|s| match s {
                Statement::Log { level, .. } => level,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(levels, vec![LogLevel::Log, LogLevel::Warn, LogLevel::Error]);
    }

    #[test]
    fn test_log_keeps_every_part() {
        let statements = parse_script(r#"log("status", "{{$status}}")"#).unwrap();
        assert_eq!(
            statements[0],
            Statement::Log {
                level: LogLevel::Log,
                parts: vec!["status".to_string(), "{{$status}}".to_string()],
            }
        );
    }

    #[test]
    fn test_parse_test_and_assert() {
        let script = r#"
            test("status is 200", "{{$status}} == 200");
            assert("{{$body}} contains ok", "Expected ok")
        "#;
        let statements = parse_script(script).unwrap();
        assert_eq!(
            statements,
            vec![
                Statement::Test {
                    name: "status is 200".to_string(),
                    condition: "{{$status}} == 200".to_string(),
                },
                Statement::Assert {
                    condition: "{{$body}} contains ok".to_string(),
                    message: Some("Expected ok".to_string()),
                },
            ]
        );
    }

    #[test]
    fn test_parse_delay() {
        assert_eq!(
            parse_script("delay(1000)").unwrap(),
            vec![Statement::Delay { millis: 1000 }]
        );
        assert!(matches!(
            parse_script("delay(soon)"),
            Err(ParseError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_skip_comments() {
        let script = r#"
            // This is a comment
            # This is also a comment
            log("Hello")
        "#;
        assert_eq!(parse_script(script).unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_command_reports_line() {
        let script = "log(\"ok\")\nexplode(\"now\")";
        assert_eq!(
            parse_script(script),
            Err(ParseError::UnknownCommand {
                line: 2,
                name: "explode".to_string(),
            })
        );
    }

    #[test]
    fn test_missing_parenthesis() {
        assert!(matches!(
            parse_script("set"),
            Err(ParseError::InvalidSyntax { line: 1, .. })
        ));
        assert!(matches!(
            parse_script(r#"log("x""#),
            Err(ParseError::InvalidSyntax { .. })
        ));
    }

    #[test]
    fn test_unterminated_string() {
        assert!(matches!(
            parse_script(r#"log("x)"#),
            Err(ParseError::InvalidSyntax { .. })
        ));
    }

    #[test]
    fn test_single_quoted_strings() {
        assert_eq!(
            parse_script("set('key', 'value')").unwrap(),
            vec![Statement::Set {
                name: "key".to_string(),
                value: "value".to_string(),
            }]
        );
    }

    #[test]
    fn test_escaped_quotes() {
        let statements = parse_script(r#"log("He said \"hello\"")"#).unwrap();
        assert_eq!(
            statements[0],
            Statement::Log {
                level: LogLevel::Log,
                parts: vec![r#"He said "hello""#.to_string()],
            }
        );
    }

    #[test]
    fn test_empty_string_argument_is_kept() {
        assert_eq!(
            parse_script(r#"set("token", "")"#).unwrap(),
            vec![Statement::Set {
                name: "token".to_string(),
                value: String::new(),
            }]
        );
    }

    #[test]
    fn test_wrong_arity() {
        assert!(matches!(
            parse_script(r#"set("only-name")"#),
            Err(ParseError::MissingArgument { .. })
        ));
        assert!(matches!(
            parse_script("log()"),
            Err(ParseError::MissingArgument { .. })
        ));
    }
}
