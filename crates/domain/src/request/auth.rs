//! Authentication configuration for `http` requests

use serde::{Deserialize, Serialize};

/// Authentication applied to an `http` request at send time.
///
/// Every string field may contain `{{variable}}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    /// No authentication
    #[default]
    None,
    /// `Authorization: Bearer <token>`
    Bearer {
        /// The bearer token
        token: String,
    },
    /// `Authorization: Basic base64(username:password)`
    Basic {
        /// Username
        username: String,
        /// Password
        password: String,
    },
    /// A named key sent as a header or query parameter
    ApiKey {
        /// Header or query parameter name
        key: String,
        /// The key value
        value: String,
        /// Where to add the key
        #[serde(default)]
        location: ApiKeyLocation,
    },
}

/// Where an API key is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApiKeyLocation {
    /// Request header
    #[default]
    Header,
    /// Query parameter
    Query,
}

impl AuthConfig {
    /// Returns true if authentication is configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Creates bearer authentication.
    #[must_use]
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }

    /// Creates basic authentication.
    #[must_use]
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Creates API key authentication.
    #[must_use]
    pub fn api_key(
        key: impl Into<String>,
        value: impl Into<String>,
        location: ApiKeyLocation,
    ) -> Self {
        Self::ApiKey {
            key: key.into(),
            value: value.into(),
            location,
        }
    }

    /// Applies `f` to every templated value, leaving names untouched.
    pub fn map_values(&mut self, mut f: impl FnMut(&str, &str) -> String) {
        match self {
            Self::None => {}
            Self::Bearer { token } => *token = f("auth.token", token),
            Self::Basic { username, password } => {
                *username = f("auth.username", username);
                *password = f("auth.password", password);
            }
            Self::ApiKey { value, .. } => *value = f("auth.value", value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_map_values_skips_key_names() {
        let mut auth = AuthConfig::api_key("X-{{name}}", "{{secret}}", ApiKeyLocation::Header);
        auth.map_values(|_, v| v.replace("{{secret}}", "s3"));
        assert_eq!(
            auth,
            AuthConfig::api_key("X-{{name}}", "s3", ApiKeyLocation::Header)
        );
    }

    #[test]
    fn test_tagged_serialization() {
        let json = serde_json::to_value(AuthConfig::bearer("t")).ok();
        assert_eq!(
            json,
            Some(serde_json::json!({"type": "bearer", "token": "t"}))
        );
    }
}
