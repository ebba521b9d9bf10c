//! Built-in dynamic variables
//!
//! These variables are prefixed with $ and generate a fresh value per send.

use chrono::Utc;
use rand::Rng;
use uuid::Uuid;

/// Information about a built-in variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinInfo {
    /// Variable name (including $ prefix)
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Example output
    pub example: &'static str,
}

const AVAILABLE: &[BuiltinInfo] = &[
    BuiltinInfo {
        name: "$uuid",
        description: "Random UUID v4",
        example: "550e8400-e29b-41d4-a716-446655440000",
    },
    BuiltinInfo {
        name: "$timestamp",
        description: "Unix timestamp in seconds",
        example: "1706284800",
    },
    BuiltinInfo {
        name: "$isoTimestamp",
        description: "ISO 8601 timestamp (UTC)",
        example: "2024-01-26T12:00:00+00:00",
    },
    BuiltinInfo {
        name: "$randomInt",
        description: "Random integer 0-1000",
        example: "427",
    },
    BuiltinInfo {
        name: "$randomString",
        description: "Random alphanumeric string (16 chars)",
        example: "aB3dE5fG7hI9jK1m",
    },
    BuiltinInfo {
        name: "$randomBoolean",
        description: "Random boolean (true/false)",
        example: "true",
    },
];

/// Generates values for built-in dynamic variables.
pub struct BuiltinVariables;

impl BuiltinVariables {
    /// Resolves a built-in variable name to a freshly generated value.
    /// Returns None if the name is not a recognized built-in.
    #[must_use]
    pub fn resolve(name: &str) -> Option<String> {
        match name {
            "$uuid" => Some(Uuid::new_v4().to_string()),
            "$timestamp" => Some(Utc::now().timestamp().to_string()),
            "$isoTimestamp" => Some(Utc::now().to_rfc3339()),
            "$randomInt" => Some(rand::rng().random_range(0..=1000).to_string()),
            "$randomString" => Some(Self::random_alphanumeric_string(16)),
            "$randomBoolean" => Some(rand::rng().random_bool(0.5).to_string()),
            _ => None,
        }
    }

    /// Returns whether the name is a known built-in variable.
    #[must_use]
    pub fn is_builtin(name: &str) -> bool {
        AVAILABLE.iter().any(|b| b.name == name)
    }

    /// Returns all built-in variables with descriptions.
    #[must_use]
    pub const fn available() -> &'static [BuiltinInfo] {
        AVAILABLE
    }

    fn random_alphanumeric_string(len: usize) -> String {
        const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
        let mut rng = rand::rng();
        (0..len)
            .map(|_| char::from(CHARSET[rng.random_range(0..CHARSET.len())]))
            .collect()
    }
}
