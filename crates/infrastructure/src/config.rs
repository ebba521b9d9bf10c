//! Settings loading.
//!
//! Layers, lowest first: built-in defaults, the settings file, then
//! `COURIER_*` environment variables. Nested fields use `__`, so
//! `COURIER_IMPORT__MAX_DEPTH=4` sets `import.max_depth`.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use courier_domain::settings::EngineSettings;
use serde::Deserialize;
use tracing::debug;

const ENV_PREFIX: &str = "COURIER";
const APP_DIR: &str = "courier";

/// Error type for settings operations.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// A source could not be read or a value has the wrong type.
    #[error("Invalid settings: {0}")]
    Config(#[from] config::ConfigError),

    /// Could not determine the data directory.
    #[error("Could not determine data directory; set COURIER_DATA_DIR")]
    NoDataDir,
}

/// Everything the binary reads from settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CourierConfig {
    /// Engine tunables
    #[serde(flatten)]
    pub engine: EngineSettings,

    /// Where collections and history are stored
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl CourierConfig {
    /// The configured data directory, or the platform default.
    ///
    /// # Errors
    ///
    /// Returns an error if none is configured and the platform has no data directory.
    pub fn data_dir(&self) -> Result<PathBuf, SettingsError> {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|p| p.join(APP_DIR)))
            .ok_or(SettingsError::NoDataDir)
    }

    /// Directory of the collection store.
    ///
    /// # Errors
    ///
    /// See [`CourierConfig::data_dir`].
    pub fn collections_dir(&self) -> Result<PathBuf, SettingsError> {
        self.data_dir().map(|p| p.join("collections"))
    }

    /// Location of the history file.
    ///
    /// # Errors
    ///
    /// See [`CourierConfig::data_dir`].
    pub fn history_path(&self) -> Result<PathBuf, SettingsError> {
        self.data_dir().map(|p| p.join("history.json"))
    }
}

/// Default settings file, `<config dir>/courier/config.toml`.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(APP_DIR).join("config.toml"))
}

/// Loads settings. An explicit `path` must exist; the default file may not.
///
/// # Errors
///
/// Returns an error if a source cannot be parsed or a value has the wrong type.
pub fn load_settings(path: Option<&Path>) -> Result<CourierConfig, SettingsError> {
    load_with_env(path, None)
}

fn load_with_env(
    path: Option<&Path>,
    env: Option<config::Map<String, String>>,
) -> Result<CourierConfig, SettingsError> {
    let mut builder = Config::builder();
    match path {
        Some(path) => builder = builder.add_source(File::from(path).required(true)),
        None => {
            if let Some(default) = default_config_path() {
                builder = builder.add_source(File::from(default).required(false));
            }
        }
    }
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(env),
    );

    let settings: CourierConfig = builder.build()?.try_deserialize()?;
    debug!(?settings, "settings loaded");
    Ok(settings)
}
