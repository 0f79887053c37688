//! Application configuration
//!
//! Values come from `WORLDS_*` environment variables (a `.env` file is read
//! first when present), layered over the defaults below.

use std::time::Duration;

use anyhow::{bail, ensure, Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment};
use serde::Deserialize;

use crate::domain::value_objects::validate_entity_tag;

const ENV_PREFIX: &str = "WORLDS";

/// Which document store adapter backs the repositories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Sqlite,
}

/// Application configuration loaded from environment
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    /// `memory` or `sqlite`
    pub store_backend: StoreBackend,
    /// SQLite database file, created if missing
    pub store_path: String,
    /// Namespace holding every document of this system
    pub bucket_name: String,
    /// Applied to repository calls that carry no deadline of their own
    #[serde(default)]
    pub operation_timeout_ms: Option<u64>,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let builder = Config::builder()
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));
        Self::from_builder(builder)
    }

    /// Load configuration from caller-supplied sources, over the defaults
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let config = builder
            .set_default("store_backend", "memory")?
            .set_default("store_path", "worlds.db")?
            .set_default("bucket_name", "worlds")?
            .build()
            .context("Failed to build configuration")?;

        let app_config: Self = config
            .try_deserialize()
            .context("Invalid WORLDS_* configuration")?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<()> {
        validate_entity_tag(&self.bucket_name)
            .with_context(|| format!("Invalid bucket name '{}'", self.bucket_name))?;
        if self.store_backend == StoreBackend::Sqlite && self.store_path.trim().is_empty() {
            bail!("WORLDS_STORE_PATH is required for the sqlite store backend");
        }
        if let Some(ms) = self.operation_timeout_ms {
            ensure!(ms > 0, "WORLDS_OPERATION_TIMEOUT_MS must be greater than zero");
        }
        Ok(())
    }

    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout_ms.map(Duration::from_millis)
    }
}
