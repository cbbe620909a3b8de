use std::path::PathBuf;

use anyhow::Context;
use rtm_config::{DatabaseConfig, RtmConfig};
use rtm_db::service::RtmService;

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub service: RtmService,
    pub config: RtmConfig,
    pub db_path: PathBuf,
}

impl AppContext {
    /// Open the store named by `db_override` or, failing that, by
    /// `database.path` from config.
    pub async fn init(config: RtmConfig, db_override: Option<&str>) -> anyhow::Result<Self> {
        let database = db_override.map_or_else(
            || config.database.clone(),
            |path| DatabaseConfig {
                path: path.to_string(),
            },
        );

        let db_path = if database.is_memory() {
            PathBuf::from(":memory:")
        } else {
            let path = database
                .resolved_path()
                .context("failed to resolve database path")?;
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create database directory {}", parent.display())
                })?;
            }
            path
        };

        tracing::debug!(path = %db_path.display(), "opening rtm store");
        let service = RtmService::new_local(&db_path.to_string_lossy())
            .await
            .with_context(|| format!("failed to open rtm store at {}", db_path.display()))?;

        Ok(Self {
            service,
            config,
            db_path,
        })
    }
}
