use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectedStatus {
    Running,
    Stopped,
}

#[derive(Debug, Error)]
#[error("unknown status {0:?} (expected running or stopped)")]
pub struct UnknownStatus(pub String);

impl FromStr for CollectedStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "running" => Ok(Self::Running),
            "stopped" => Ok(Self::Stopped),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatusRecord {
    pub status: CollectedStatus,
    pub last_seen: OffsetDateTime,
}

// POST /log/status (form)
#[derive(Debug, Deserialize)]
pub struct StatusIn {
    pub status: String,
}
