//! # rtm-config
//!
//! Layered configuration loading for the `rtm` CLI using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`RTM_*` prefix, `__` as separator)
//! 2. Project-level `.rtm/config.toml`
//! 3. User-level `~/.config/rtm/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `RTM_DATABASE__PATH` -> `database.path`,
//! `RTM_IMPORT__DEFAULT_MODE` -> `import.default_mode`, etc.
//! The `__` (double underscore) separates nested config sections.
//!
//! # Usage
//!
//! ```no_run
//! use rtm_config::RtmConfig;
//!
//! let config = RtmConfig::load_with_dotenv().expect("config");
//! println!("store: {}", config.database.resolved_path().expect("path").display());
//! ```

mod database;
mod error;
mod general;
mod import;

pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use general::GeneralConfig;
pub use import::ImportConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Prefix of environment variables read into the config.
pub const ENV_PREFIX: &str = "RTM_";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RtmConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl RtmConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Figment` when a source is malformed or a value
    /// has the wrong type.
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    /// Load configuration after reading `.env` from the current directory.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        // A missing .env is normal.
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment or add providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(".rtm/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Path to the user-global config file.
    #[must_use]
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("rtm").join("config.toml"))
    }
}
