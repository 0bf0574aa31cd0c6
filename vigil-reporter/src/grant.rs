//! Execution grant: the right to keep running in the background
//!
//! The grant is always taken under the service's own configured name; it
//! never disguises the process.

use crate::lifecycle::LifecycleError;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

pub trait ExecutionGrant: Send + Sync + 'static {
    /// Held for as long as the controller runs; released on drop
    type Guard: Send + 'static;

    fn acquire(&self, service_name: &str) -> Result<Self::Guard, LifecycleError>;
}

/// Hosts that need no permission to run continuously
#[derive(Debug, Clone, Copy, Default)]
pub struct Unrestricted;

impl ExecutionGrant for Unrestricted {
    type Guard = ();

    fn acquire(&self, _service_name: &str) -> Result<(), LifecycleError> {
        Ok(())
    }
}

/// Single-instance grant backed by an exclusively created pid file
#[derive(Debug, Clone)]
pub struct PidFileGrant {
    path: PathBuf,
}

impl PidFileGrant {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug)]
pub struct PidFileGuard {
    path: PathBuf,
}

impl ExecutionGrant for PidFileGrant {
    type Guard = PidFileGuard;

    fn acquire(&self, service_name: &str) -> Result<PidFileGuard, LifecycleError> {
        let denied = |reason: String| {
            LifecycleError::PermissionDenied(format!(
                "{service_name}: cannot take {} ({reason})",
                self.path.display()
            ))
        };

        let mut file = match self.create() {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                if let Some(pid) = self.live_holder() {
                    return Err(denied(format!("another instance is running, pid {pid}")));
                }
                // holder died without releasing (SIGKILL, crash): take over
                tracing::warn!(path = %self.path.display(), "removing stale execution grant");
                std::fs::remove_file(&self.path)
                    .and_then(|_| self.create())
                    .map_err(|e| denied(e.to_string()))?
            }
            Err(e) => return Err(denied(e.to_string())),
        };

        let guard = PidFileGuard { path: self.path.clone() };
        writeln!(file, "{}", std::process::id()).map_err(|e| {
            LifecycleError::PermissionDenied(format!(
                "{service_name}: cannot write {}: {e}",
                self.path.display()
            ))
        })?;

        tracing::debug!(path = %self.path.display(), "execution grant acquired");
        Ok(guard)
    }
}

impl PidFileGrant {
    fn create(&self) -> std::io::Result<std::fs::File> {
        OpenOptions::new().write(true).create_new(true).open(&self.path)
    }

    /// Pid recorded in the grant file, if that process is still alive.
    /// An unreadable or garbled file counts as stale.
    fn live_holder(&self) -> Option<i32> {
        let pid: i32 = std::fs::read_to_string(&self.path).ok()?.trim().parse().ok()?;
        (pid > 0 && process_alive(pid)).then_some(pid)
    }
}

#[cfg(unix)]
fn process_alive(pid: i32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    // signal 0: existence check only; EPERM means alive under another user
    match kill(Pid::from_raw(pid), None) {
        Ok(()) => true,
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
fn process_alive(_pid: i32) -> bool {
    true
}

impl Drop for PidFileGuard {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to release execution grant");
        }
    }
}
