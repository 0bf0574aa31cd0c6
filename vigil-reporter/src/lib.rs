//! Vigil Reporter - periodic application status reporting
//!
//! Reports an alive/stopped signal to a collector endpoint:
//! - Scheduler: fixed-period timer, first tick immediate
//! - Reporter: one form-encoded POST per tick, typed failures
//! - Lifecycle: execution grant, start/stop, final "stopped" report

pub mod config;
pub mod grant;
pub mod lifecycle;
pub mod reporter;
pub mod scheduler;
pub mod status;

pub use config::{ConfigError, ReporterConfig};
pub use grant::{ExecutionGrant, PidFileGrant, Unrestricted};
pub use lifecycle::{LifecycleController, LifecycleError, LifecycleState};
pub use reporter::{ReportError, Reporter, StatusSink};
pub use scheduler::Scheduler;
pub use status::{ReportedStatus, StatusEvent};
