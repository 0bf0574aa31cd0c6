use crate::models::{CollectedStatus, StatusRecord};
use parking_lot::Mutex;
use std::sync::Arc;
use time::OffsetDateTime;

pub type Shared<T> = Arc<Mutex<T>>;

pub fn new_state<T>(value: T) -> Shared<T> {
    Arc::new(Mutex::new(value))
}

/// Dernier statut reçu : le dernier écrit gagne
#[derive(Debug, Default)]
pub struct StatusBoard {
    latest: Option<StatusRecord>,
    received: u64,
}

impl StatusBoard {
    pub fn record(&mut self, status: CollectedStatus, at: OffsetDateTime) {
        self.latest = Some(StatusRecord { status, last_seen: at });
        self.received += 1;
    }

    pub fn latest(&self) -> Option<&StatusRecord> {
        self.latest.as_ref()
    }

    pub fn received(&self) -> u64 {
        self.received
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_write_wins() {
        let mut board = StatusBoard::default();
        assert!(board.latest().is_none());

        let t0 = OffsetDateTime::now_utc();
        board.record(CollectedStatus::Running, t0);
        board.record(CollectedStatus::Stopped, t0 + time::Duration::seconds(1));
        board.record(CollectedStatus::Running, t0 + time::Duration::seconds(2));

        let latest = board.latest().unwrap();
        assert_eq!(latest.status, CollectedStatus::Running);
        assert_eq!(latest.last_seen, t0 + time::Duration::seconds(2));
        assert_eq!(board.received(), 3);
    }
}
