//! Configuration management.
//!
//! Settings come from an optional TOML file, then environment overrides.
//! The LLM section carries its own `LLM_*` overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm::LlmConfig;
use crate::models::DEFAULT_MAX_FILE_SIZE;
use crate::services::{RetryPolicy, DEFAULT_CONCURRENCY};

/// Name of the config directory and file stem.
const APP_NAME: &str = "legaldoc";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse TOML config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Retry and timeout settings for collaborator calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub backoff_factor: f64,
    pub rate_limit_delay_ms: u64,
    pub max_delay_secs: u64,
    /// Per-call timeout; 0 disables it.
    pub stage_timeout_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            backoff_factor: 2.0,
            rate_limit_delay_ms: 5_000,
            max_delay_secs: 60,
            stage_timeout_secs: 120,
        }
    }
}

/// Application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Largest accepted document, in MiB.
    pub max_file_size_mb: u64,
    /// Documents analyzed at once.
    pub concurrency: usize,
    pub retry: RetrySettings,
    pub llm: LlmConfig,
    /// Path this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_file_size_mb: DEFAULT_MAX_FILE_SIZE / (1024 * 1024),
            concurrency: DEFAULT_CONCURRENCY,
            retry: RetrySettings::default(),
            llm: LlmConfig::default(),
            source_path: None,
        }
    }
}

impl Settings {
    /// Default config file location (`$XDG_CONFIG_HOME/legaldoc/config.toml`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join("config.toml"))
    }

    /// Load settings from `path` if given, else from the default location
    /// when it exists, else defaults. Environment overrides apply last.
    pub async fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let settings = match path {
            Some(path) => Self::load_from_path(&resolve_path(path)).await?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::load_from_path(&path).await?,
                None => Self::default(),
            },
        };
        Ok(settings.with_env_overrides())
    }

    /// Parse a TOML file without applying environment overrides.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
        let mut settings: Settings =
            toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        settings.source_path = Some(path.to_path_buf());
        Ok(settings)
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `LEGALDOC_MAX_FILE_SIZE_MB`
    /// - `LEGALDOC_CONCURRENCY`
    /// - `LEGALDOC_MAX_ATTEMPTS`
    /// - `LEGALDOC_BASE_DELAY_MS`
    /// - `LEGALDOC_STAGE_TIMEOUT_SECS`
    /// - the `LLM_*` family (see [`LlmConfig::with_env_overrides`])
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(n) = env_parse("LEGALDOC_MAX_FILE_SIZE_MB") {
            self.max_file_size_mb = n;
        }
        if let Some(n) = env_parse("LEGALDOC_CONCURRENCY") {
            self.concurrency = n;
        }
        if let Some(n) = env_parse("LEGALDOC_MAX_ATTEMPTS") {
            self.retry.max_attempts = n;
        }
        if let Some(n) = env_parse("LEGALDOC_BASE_DELAY_MS") {
            self.retry.base_delay_ms = n;
        }
        if let Some(n) = env_parse("LEGALDOC_STAGE_TIMEOUT_SECS") {
            self.retry.stage_timeout_secs = n;
        }
        self.llm = self.llm.with_env_overrides();
        self
    }

    /// Maximum document size in bytes.
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }

    /// Retry policy described by the retry section. Not validated here.
    pub fn retry_policy(&self) -> RetryPolicy {
        let retry = &self.retry;
        let timeout = match retry.stage_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        RetryPolicy::default()
            .with_max_attempts(retry.max_attempts)
            .with_base_delay(Duration::from_millis(retry.base_delay_ms))
            .with_backoff_factor(retry.backoff_factor)
            .with_rate_limit_delay(Duration::from_millis(retry.rate_limit_delay_ms))
            .with_max_delay(Duration::from_secs(retry.max_delay_secs))
            .with_call_timeout(timeout)
    }
}

/// Expand a leading `~` in a user-supplied path.
pub fn resolve_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::tilde(raw.as_ref());
    PathBuf::from(expanded.as_ref())
}

fn env_parse<T: std::str::FromStr>(var: &str) -> Option<T> {
    std::env::var(var).ok().and_then(|v| v.parse().ok())
}
