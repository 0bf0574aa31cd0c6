//! Reporter configuration
//!
//! Handles:
//! - Collector endpoint and timeouts
//! - Tick interval and worker bound
//! - Service identity (name used for User-Agent, grant file and logs)
//! - Cross-platform storage (`$VIGIL_REPORTER_CONFIG` or the OS config dir)
//!
//! Loaded once at startup; immutable afterwards.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_PATH_ENV: &str = "VIGIL_REPORTER_CONFIG";
pub const ENDPOINT_ENV: &str = "VIGIL_ENDPOINT_URL";
pub const INTERVAL_ENV: &str = "VIGIL_INTERVAL_MS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },
    #[error("could not find config directory")]
    NoConfigDir,
    #[error("interval_ms must be greater than zero")]
    ZeroInterval,
    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),
    #[error("max_in_flight must be greater than zero")]
    ZeroInFlight,
    #[error("service_name must not be empty")]
    EmptyServiceName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReporterConfig {
    pub endpoint_url: String,
    pub interval_ms: u64,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    /// Bound on the final "stopped" report; defaults to connect + read timeout
    pub final_report_timeout_ms: Option<u64>,
    pub service_name: String,
    pub allow_insecure_http: bool,
    pub max_in_flight: usize,
    pub grant_file: Option<PathBuf>,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            endpoint_url: "https://localhost/log/status".to_string(),
            interval_ms: 10_000,
            connect_timeout_ms: 15_000,
            read_timeout_ms: 15_000,
            final_report_timeout_ms: None,
            service_name: "vigil-reporter".to_string(),
            allow_insecure_http: false,
            max_in_flight: 4,
            grant_file: None,
        }
    }
}

impl ReporterConfig {
    /// Load config from `$VIGIL_REPORTER_CONFIG` or the OS-specific location,
    /// then apply environment overrides and validate.
    pub async fn load() -> Result<Self, ConfigError> {
        let config_path = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => PathBuf::from(path),
            None => Self::config_file_path()?,
        };

        let mut config = if config_path.exists() {
            let content = tokio::fs::read_to_string(&config_path)
                .await
                .map_err(|source| ConfigError::Io {
                    path: config_path.clone(),
                    source,
                })?;
            Self::from_toml_str(&content)?
        } else {
            tracing::info!(path = %config_path.display(), "no config file, using defaults");
            Self::default()
        };

        config.apply_overrides(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `VIGIL_ENDPOINT_URL` / `VIGIL_INTERVAL_MS` from `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENDPOINT_ENV) {
            self.endpoint_url = url;
        }
        if let Some(raw) = lookup(INTERVAL_ENV) {
            self.interval_ms = raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: INTERVAL_ENV,
                value: raw.clone(),
            })?;
        }
        Ok(())
    }

    /// The endpoint URL itself is not checked here: a bad endpoint is a
    /// per-tick report failure, not a startup failure.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.connect_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("connect_timeout_ms"));
        }
        if self.read_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("read_timeout_ms"));
        }
        if self.final_report_timeout_ms == Some(0) {
            return Err(ConfigError::ZeroTimeout("final_report_timeout_ms"));
        }
        if self.max_in_flight == 0 {
            return Err(ConfigError::ZeroInFlight);
        }
        if self.service_name.trim().is_empty() {
            return Err(ConfigError::EmptyServiceName);
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn final_report_timeout(&self) -> Duration {
        match self.final_report_timeout_ms {
            Some(ms) => Duration::from_millis(ms),
            None => self.connect_timeout() + self.read_timeout(),
        }
    }

    /// Plain-http endpoint (allowed only with `allow_insecure_http`)
    pub fn is_insecure(&self) -> bool {
        self.endpoint_url
            .get(..7)
            .is_some_and(|scheme| scheme.eq_ignore_ascii_case("http://"))
    }

    /// Where the execution grant file lives
    pub fn grant_path(&self) -> PathBuf {
        match &self.grant_file {
            Some(path) => path.clone(),
            None => dirs::runtime_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(format!("{}.pid", self.service_name)),
        }
    }

    /// Get OS-specific config file path
    pub fn config_file_path() -> Result<PathBuf, ConfigError> {
        let mut path = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        path.push("vigil-reporter");
        path.push("config.toml");
        Ok(path)
    }
}
