//! Serializable scan configuration.
//!
//! A scan is reproducible from its `ScanConfig`: screening thresholds, pool
//! settings, fetch budget and the registry/tag inputs. Every section defaults,
//! so an empty file is a valid configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use coilscan_core::data::{Backoff, RetryPolicy};
use coilscan_core::screening::ScreeningCriteria;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::candidates::CandidateMode;
use crate::scanner::{ScannerConfig, MAX_WORKERS};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// `[scanner]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerSection {
    pub workers: usize,
    pub lookback_days: u32,
    pub progress_every: usize,
    pub candidate_mode: CandidateMode,
}

impl Default for ScannerSection {
    fn default() -> Self {
        let pool = ScannerConfig::default();
        Self {
            workers: pool.workers,
            lookback_days: pool.lookback_days,
            progress_every: pool.progress_every,
            candidate_mode: CandidateMode::default(),
        }
    }
}

impl ScannerSection {
    pub fn scanner_config(&self) -> ScannerConfig {
        ScannerConfig {
            workers: self.workers,
            lookback_days: self.lookback_days,
            progress_every: self.progress_every,
        }
    }
}

/// `[fetch]` section: per-request timeout and retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub backoff: Backoff,
    /// Cap on a provider's Retry-After.
    pub max_delay_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            timeout_secs: 15,
            max_attempts: retry.max_attempts,
            base_delay_ms: retry.base_delay.as_millis() as u64,
            backoff: retry.backoff,
            max_delay_ms: retry.max_delay.as_millis() as u64,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            backoff: self.backoff,
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Registry TOML of `[[listings]]` rows.
    pub registry: Option<PathBuf>,
    /// JSON tag store used by the tagged candidate modes.
    pub tags: Option<PathBuf>,
    pub criteria: ScreeningCriteria,
    pub scanner: ScannerSection,
    pub fetch: FetchConfig,
}

impl ScanConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.criteria
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        let workers = self.scanner.workers;
        if workers == 0 || workers > MAX_WORKERS {
            return Err(ConfigError::Invalid(format!(
                "scanner.workers must be in 1..={MAX_WORKERS} (got {workers})"
            )));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::Invalid("fetch.timeout_secs must be positive".into()));
        }
        if self.fetch.max_attempts == 0 {
            return Err(ConfigError::Invalid("fetch.max_attempts must be at least 1".into()));
        }
        Ok(())
    }

    /// BLAKE3 hash of the JSON form. Identical configs share a fingerprint.
    pub fn fingerprint(&self) -> Result<String, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }

    /// First 8 hex digits of the fingerprint, for file names.
    pub fn short_fingerprint(&self) -> Result<String, ConfigError> {
        let mut fp = self.fingerprint()?;
        fp.truncate(8);
        Ok(fp)
    }
}
