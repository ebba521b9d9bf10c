//! Engine Settings Domain Model
//!
//! Tunables for sending, scripting, history and import.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Upper bounds applied while importing interchange files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportLimits {
    /// Largest accepted file, in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,

    /// Deepest folder nesting accepted. Deeper folders are skipped.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Most items (folders plus requests) accepted. Later items are skipped.
    #[serde(default = "default_max_items")]
    pub max_items: usize,
}

const fn default_max_file_size() -> usize {
    10 * 1024 * 1024
}

const fn default_max_depth() -> usize {
    10
}

const fn default_max_items() -> usize {
    1000
}

impl Default for ImportLimits {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            max_depth: default_max_depth(),
            max_items: default_max_items(),
        }
    }
}

/// Settings for the send engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Wall-clock limit per script run.
    #[serde(default = "default_script_timeout_ms")]
    pub script_timeout_ms: u64,

    /// Transport timeout handed to transports.
    #[serde(default = "default_transport_timeout_ms")]
    pub transport_timeout_ms: u64,

    /// Maximum number of history entries to keep.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// `User-Agent` sent when a request sets none.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Import bounds.
    #[serde(default)]
    pub import: ImportLimits,
}

const fn default_script_timeout_ms() -> u64 {
    5_000
}

const fn default_transport_timeout_ms() -> u64 {
    30_000
}

const fn default_history_limit() -> usize {
    100
}

fn default_user_agent() -> String {
    concat!("courier/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            script_timeout_ms: default_script_timeout_ms(),
            transport_timeout_ms: default_transport_timeout_ms(),
            history_limit: default_history_limit(),
            user_agent: default_user_agent(),
            import: ImportLimits::default(),
        }
    }
}

impl EngineSettings {
    /// Script limit as a `Duration`.
    #[must_use]
    pub const fn script_timeout(&self) -> Duration {
        Duration::from_millis(self.script_timeout_ms)
    }

    /// Transport limit as a `Duration`.
    #[must_use]
    pub const fn transport_timeout(&self) -> Duration {
        Duration::from_millis(self.transport_timeout_ms)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_settings() {
        let settings = EngineSettings::default();
        assert_eq!(settings.script_timeout(), Duration::from_secs(5));
        assert_eq!(settings.transport_timeout_ms, 30_000);
        assert_eq!(settings.history_limit, 100);
        assert_eq!(settings.import.max_file_size, 10 * 1024 * 1024);
        assert!(settings.user_agent.starts_with("courier/"));
    }

    #[test]
    fn missing_fields_take_defaults() {
        let settings: EngineSettings =
            serde_json::from_str(r#"{"script_timeout_ms": 250, "import": {"max_depth": 2}}"#).unwrap();
        assert_eq!(settings.script_timeout_ms, 250);
        assert_eq!(settings.import.max_depth, 2);
        assert_eq!(settings.import.max_items, 1000);
        assert_eq!(settings.history_limit, 100);
    }
}
