//! Status observations carried by each report

use chrono::{DateTime, Utc};
use std::fmt;

/// Liveness value sent to the collector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportedStatus {
    Running,
    Stopped,
}

impl ReportedStatus {
    pub fn from_running(is_running: bool) -> Self {
        if is_running {
            Self::Running
        } else {
            Self::Stopped
        }
    }

    pub fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }

    /// Value of the `status` form field
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for ReportedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observation, built fresh for every network call and dropped with it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusEvent {
    pub is_running: bool,
    pub timestamp: DateTime<Utc>,
}

impl StatusEvent {
    pub fn now(status: ReportedStatus) -> Self {
        Self {
            is_running: status.is_running(),
            timestamp: Utc::now(),
        }
    }

    pub fn status(&self) -> ReportedStatus {
        ReportedStatus::from_running(self.is_running)
    }

    /// URL-encoded body fields: `status=<running|stopped>`
    pub fn form_fields(&self) -> [(&'static str, &'static str); 1] {
        [("status", self.status().as_str())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_values() {
        assert_eq!(ReportedStatus::Running.to_string(), "running");
        assert_eq!(ReportedStatus::Stopped.to_string(), "stopped");
        assert_eq!(ReportedStatus::from_running(false), ReportedStatus::Stopped);
    }

    #[test]
    fn test_event_form_fields() {
        let event = StatusEvent::now(ReportedStatus::Stopped);
        assert!(!event.is_running);
        assert_eq!(event.form_fields(), [("status", "stopped")]);
        assert!(event.timestamp <= Utc::now());
    }
}
