use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const DEFAULT_USER_AGENT: &str = concat!("citycast/", env!("CARGO_PKG_VERSION"));

/// Where the HTTP response cache lives and how long entries stay fresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub path: PathBuf,
    pub ttl: Duration,
}

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Seconds; the n-th retry (0-based) waits `backoff_factor * 2^n`.
    pub backoff_factor: f64,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_factor: 0.2,
            max_backoff: Duration::from_secs(120),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2f64.powi(attempt.min(63) as i32);
        let secs = (self.backoff_factor * factor).max(0.0);

        Duration::try_from_secs_f64(secs)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheSection {
    pub enabled: bool,
    /// Relative paths are resolved against the working directory.
    pub path: PathBuf,
    pub ttl_secs: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from(".cache"),
            ttl_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrySection {
    pub max_retries: u32,
    pub backoff_factor: f64,
    pub max_backoff_secs: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_retries: policy.max_retries,
            backoff_factor: policy.backoff_factor,
            max_backoff_secs: policy.max_backoff.as_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeocoderSection {
    pub url: String,
    /// Nominatim rejects requests without an identifying User-Agent.
    pub user_agent: String,
}

impl Default for GeocoderSection {
    fn default() -> Self {
        Self {
            url: DEFAULT_GEOCODER_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ForecastSection {
    pub url: String,
}

impl Default for ForecastSection {
    fn default() -> Self {
        Self {
            url: DEFAULT_FORECAST_URL.to_string(),
        }
    }
}

/// Top-level configuration, optionally stored on disk.
///
/// Example TOML:
/// [cache]
/// path = ".cache"
/// ttl_secs = 3600
///
/// [retry]
/// max_retries = 5
/// backoff_factor = 0.2
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub cache: CacheSection,
    pub retry: RetrySection,
    pub geocoder: GeocoderSection,
    pub forecast: ForecastSection,
}

impl Config {
    /// The response cache settings, or `None` when caching is switched off.
    pub fn cache_config(&self) -> Option<CacheConfig> {
        self.cache.enabled.then(|| CacheConfig {
            path: self.cache.path.clone(),
            ttl: Duration::from_secs(self.cache.ttl_secs),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.retry.max_retries,
            backoff_factor: self.retry.backoff_factor,
            max_backoff: Duration::from_secs(self.retry.max_backoff_secs),
        }
    }

    /// Load config from the platform config directory, or defaults if no file exists yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load config from an explicit file. Unlike [`Config::load`], the file must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        cfg.validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if !self.retry.backoff_factor.is_finite() || self.retry.backoff_factor < 0.0 {
            return Err(anyhow!(
                "retry.backoff_factor must be a non-negative number, got {}",
                self.retry.backoff_factor
            ));
        }

        if self.geocoder.url.trim().is_empty() || self.forecast.url.trim().is_empty() {
            return Err(anyhow!("geocoder.url and forecast.url must not be empty"));
        }

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "citycast", "citycast")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
