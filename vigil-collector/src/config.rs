use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path};
use tokio::fs;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CollectorConfig {
    pub bind: SocketAddr,
    /// Au-delà, le statut est marqué "stale" dans GET /status
    pub stale_after_secs: i64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            stale_after_secs: 30,
        }
    }
}

pub fn parse_config(txt: &str) -> Result<CollectorConfig, serde_yaml::Error> {
    if txt.trim().is_empty() {
        return Ok(CollectorConfig::default());
    }
    serde_yaml::from_str(txt)
}

pub async fn load_config() -> CollectorConfig {
    let path = std::env::var("VIGIL_COLLECTOR_CONFIG").unwrap_or_else(|_| "collector.yaml".into());
    if Path::new(&path).exists() {
        let txt = fs::read_to_string(&path).await.unwrap_or_default();
        parse_config(&txt).unwrap_or_else(|e| {
            tracing::warn!(path = %path, error = %e, "invalid collector config, using defaults");
            CollectorConfig::default()
        })
    } else {
        tracing::info!(path = %path, "no collector config, using defaults");
        CollectorConfig::default()
    }
}
