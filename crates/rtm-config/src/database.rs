//! Store location.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Used when `database.path` is empty; relative to the home directory.
const DEFAULT_RELATIVE_PATH: &str = ".rtm/rtm.db";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// libSQL database file. `~/` expands to the home directory; `:memory:`
    /// opens a throwaway in-memory store.
    #[serde(default)]
    pub path: String,
}

impl DatabaseConfig {
    /// Whether the configured store lives only in memory.
    #[must_use]
    pub fn is_memory(&self) -> bool {
        self.path == ":memory:"
    }

    /// The database path with defaults applied and `~/` expanded.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` when the home directory is needed
    /// but cannot be determined.
    pub fn resolved_path(&self) -> Result<PathBuf, ConfigError> {
        let home = || {
            dirs::home_dir().ok_or_else(|| ConfigError::InvalidValue {
                field: "database.path".into(),
                reason: "home directory is unknown; set an absolute path".into(),
            })
        };
        let path = self.path.trim();
        if path.is_empty() {
            return Ok(home()?.join(DEFAULT_RELATIVE_PATH));
        }
        if let Some(rest) = path.strip_prefix("~/") {
            return Ok(home()?.join(rest));
        }
        Ok(PathBuf::from(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_is_kept() {
        let config = DatabaseConfig {
            path: "/tmp/rtm.db".into(),
        };
        assert_eq!(config.resolved_path().unwrap(), PathBuf::from("/tmp/rtm.db"));
        assert!(!config.is_memory());
    }

    #[test]
    fn memory_path_is_kept_verbatim() {
        let config = DatabaseConfig {
            path: ":memory:".into(),
        };
        assert!(config.is_memory());
        assert_eq!(config.resolved_path().unwrap(), PathBuf::from(":memory:"));
    }

    #[test]
    fn empty_and_tilde_paths_resolve_under_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        assert_eq!(
            DatabaseConfig::default().resolved_path().unwrap(),
            home.join(".rtm/rtm.db")
        );
        let config = DatabaseConfig {
            path: "~/data/req.db".into(),
        };
        assert_eq!(config.resolved_path().unwrap(), home.join("data/req.db"));
    }
}
