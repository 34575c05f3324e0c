//! Bridge configuration.
//!
//! Read once at startup from, in increasing priority: built-in defaults,
//! `~/.config/morgen-bridge/config.toml` and `MORGEN_*` environment
//! variables.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::{MorgenError, MorgenResult};

pub const DEFAULT_BASE_URL: &str = "https://api.morgen.so/v3";
const DEFAULT_TIMEOUT_SECS: i64 = 30;
const DEFAULT_BATCH_CONCURRENCY: i64 = 4;

#[derive(Clone, Deserialize)]
pub struct MorgenConfig {
    #[serde(default)]
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub batch_concurrency: usize,
}

impl fmt::Debug for MorgenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MorgenConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("batch_concurrency", &self.batch_concurrency)
            .finish()
    }
}

impl MorgenConfig {
    pub fn config_path() -> MorgenResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| MorgenError::Config("Could not determine config directory".into()))?
            .join("morgen-bridge");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the user config file and the process environment.
    pub fn load() -> MorgenResult<Self> {
        let path = Self::config_path()?;
        Self::load_from(Some(&path), None)
    }

    /// `env` replaces the process environment when given.
    pub fn load_from(
        path: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> MorgenResult<Self> {
        let mut builder = Config::builder()
            .set_default("base_url", DEFAULT_BASE_URL)
            .and_then(|b| b.set_default("timeout_secs", DEFAULT_TIMEOUT_SECS))
            .and_then(|b| b.set_default("batch_concurrency", DEFAULT_BATCH_CONCURRENCY))
            .map_err(|e| MorgenError::Config(e.to_string()))?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }

        let config: MorgenConfig = builder
            .add_source(
                Environment::with_prefix("MORGEN")
                    .try_parsing(true)
                    .source(env),
            )
            .build()
            .map_err(|e| MorgenError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| MorgenError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> MorgenResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(MorgenError::Config(
                "Morgen API key is required. Set MORGEN_API_KEY or api_key in the config file."
                    .into(),
            ));
        }
        url::Url::parse(&self.base_url)
            .map_err(|e| MorgenError::Config(format!("Invalid base_url '{}': {e}", self.base_url)))?;
        if self.timeout_secs == 0 {
            return Err(MorgenError::Config("timeout_secs must be at least 1".into()));
        }
        if self.batch_concurrency == 0 {
            return Err(MorgenError::Config(
                "batch_concurrency must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
