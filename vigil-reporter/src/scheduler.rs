//! Fixed-period timer
//!
//! Runs an action immediately and then once per interval on a task of the
//! runtime it was built with. The pending-timer slot is the only shared state
//! and sits behind a single mutex, so `start`/`stop` may be called from any
//! thread.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// One armed schedule. `armed` is checked under its lock before every
/// invocation; `cancel` flips it under the same lock, so once `cancel`
/// returns no invocation can begin.
struct Schedule {
    armed: Arc<Mutex<bool>>,
    task: JoinHandle<()>,
}

impl Schedule {
    fn cancel(self) {
        *self.armed.lock() = false;
        self.task.abort();
    }
}

pub struct Scheduler {
    runtime: Handle,
    slot: Mutex<Option<Schedule>>,
}

impl Scheduler {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            slot: Mutex::new(None),
        }
    }

    /// Runtime the timer task (and anything the action spawns) runs on
    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }

    /// Schedule `action` now and every `interval` after. A schedule already
    /// running is cancelled first. `action` must not call back into this
    /// scheduler.
    pub fn start<F>(&self, mut action: F, interval: Duration)
    where
        F: FnMut() + Send + 'static,
    {
        debug_assert!(!interval.is_zero(), "scheduler interval must be > 0");
        let interval = interval.max(Duration::from_millis(1));

        let mut slot = self.slot.lock();
        if let Some(previous) = slot.take() {
            tracing::debug!("replacing active schedule");
            previous.cancel();
        }

        let armed = Arc::new(Mutex::new(true));
        let gate = armed.clone();
        let task = self.runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // a stalled runtime shifts later ticks instead of firing a burst
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let armed = gate.lock();
                if !*armed {
                    break;
                }
                action();
            }
        });

        *slot = Some(Schedule { armed, task });
    }

    /// Cancel the active schedule; no-op when idle. An invocation already in
    /// progress finishes before this returns and is not rescheduled.
    pub fn stop(&self) {
        if let Some(schedule) = self.slot.lock().take() {
            schedule.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        self.slot.lock().is_some()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
