//! Lifecycle controller
//!
//! Binds the scheduler and a status sink to the host process:
//! `Stopped -> Starting -> Running -> Stopped`. Each tick dispatches a
//! `running` report on a worker task (bounded by `max_in_flight`); shutdown
//! stops the timer and sends exactly one final `stopped` report.

use crate::config::ReporterConfig;
use crate::grant::ExecutionGrant;
use crate::reporter::{log_outcome, ReportError, StatusSink};
use crate::scheduler::Scheduler;
use crate::status::ReportedStatus;
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("background execution not permitted: {0}")]
    PermissionDenied(String),
    #[error("status reporting already started")]
    AlreadyStarted,
    #[error("controller has shut down and cannot be restarted")]
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Stopped,
    Starting,
    Running,
}

struct Inner<G> {
    state: LifecycleState,
    grant: Option<G>,
    terminated: bool,
}

pub struct LifecycleController<S: StatusSink, G: ExecutionGrant> {
    config: ReporterConfig,
    sink: Arc<S>,
    grant: G,
    scheduler: Scheduler,
    permits: Arc<Semaphore>,
    inner: Mutex<Inner<G::Guard>>,
}

impl<S: StatusSink, G: ExecutionGrant> LifecycleController<S, G> {
    pub fn new(config: ReporterConfig, sink: S, grant: G, scheduler: Scheduler) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_in_flight));
        Self {
            config,
            sink: Arc::new(sink),
            grant,
            scheduler,
            permits,
            inner: Mutex::new(Inner {
                state: LifecycleState::Stopped,
                grant: None,
                terminated: false,
            }),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.inner.lock().state
    }

    /// Acquire the execution grant and start ticking. On a refused grant the
    /// controller falls back to `Stopped` and nothing is reported.
    pub fn start(&self) -> Result<(), LifecycleError> {
        let mut inner = self.inner.lock();
        if inner.terminated {
            return Err(LifecycleError::Terminated);
        }
        if inner.state != LifecycleState::Stopped {
            return Err(LifecycleError::AlreadyStarted);
        }
        inner.state = LifecycleState::Starting;

        let guard = match self.grant.acquire(&self.config.service_name) {
            Ok(guard) => guard,
            Err(e) => {
                inner.state = LifecycleState::Stopped;
                error!(service = %self.config.service_name, error = %e, "cannot start status reporting");
                return Err(e);
            }
        };

        if self.config.is_insecure() && self.config.allow_insecure_http {
            warn!(endpoint = %self.config.endpoint_url, "reporting over plain http (allow_insecure_http)");
        }

        let sink = self.sink.clone();
        let permits = self.permits.clone();
        let runtime = self.scheduler.runtime().clone();
        self.scheduler.start(
            move || dispatch(&sink, &permits, &runtime),
            self.config.interval(),
        );

        inner.grant = Some(guard);
        inner.state = LifecycleState::Running;
        info!(
            service = %self.config.service_name,
            endpoint = %self.config.endpoint_url,
            interval_ms = self.config.interval_ms,
            "status reporting started"
        );
        Ok(())
    }

    /// Stop ticking, then send one best-effort `stopped` report bounded by
    /// `final_report_timeout`. In-flight `running` reports are left alone.
    /// No-op unless running.
    pub async fn shutdown(&self) {
        let grant = {
            let mut inner = self.inner.lock();
            if inner.state != LifecycleState::Running {
                return;
            }
            inner.terminated = true;
            inner.grant.take()
        };

        self.scheduler.stop();

        let result = tokio::time::timeout(
            self.config.final_report_timeout(),
            self.sink.report(ReportedStatus::Stopped),
        )
        .await
        .unwrap_or(Err(ReportError::Timeout));
        log_outcome(ReportedStatus::Stopped, &result);

        drop(grant);
        self.inner.lock().state = LifecycleState::Stopped;
        info!(service = %self.config.service_name, "status reporting stopped");
    }
}

/// Fire one `running` report without blocking the timer task
fn dispatch<S: StatusSink>(sink: &Arc<S>, permits: &Arc<Semaphore>, runtime: &Handle) {
    let Ok(permit) = permits.clone().try_acquire_owned() else {
        warn!("tick skipped: every report worker is still busy");
        return;
    };

    let sink = sink.clone();
    runtime.spawn(async move {
        let result = sink.report(ReportedStatus::Running).await;
        log_outcome(ReportedStatus::Running, &result);
        drop(permit);
    });
}
