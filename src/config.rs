//! Runtime configuration.
//!
//! Loads [`CoreConfig`] from an optional TOML file merged with
//! `CODECITY_*` environment overrides (e.g. `CODECITY_LOGGING__LEVEL`).

use crate::error::TreeError;
use crate::logging::LoggingConfig;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoreConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CoreConfig {
    /// Load configuration. A missing `path` falls back to defaults plus
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, TreeError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder
            .add_source(Environment::with_prefix("CODECITY").separator("__"))
            .build()
            .and_then(Config::try_deserialize)
            .map_err(|e| TreeError::ConfigError(e.to_string()))
    }
}
