//! Managed child process wrapper

use std::process::ExitStatus;
use std::time::Duration;
use tokio::process::Child;
use tracing::{debug, warn};

use crate::{
    config::ProcessConfig,
    error::{ProcessError, Result},
};

/// Wrapper around tokio::process::Child with lifecycle management
pub struct ManagedChild {
    /// Underlying tokio child process
    child: Child,
    /// Process configuration
    config: ProcessConfig,
    /// Process ID
    pid: u32,
}

impl ManagedChild {
    /// Create new managed child
    pub(crate) fn new(child: Child, config: ProcessConfig) -> Self {
        let pid = child.id().unwrap_or(0);
        Self { child, config, pid }
    }

    /// Get process ID
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Get process configuration
    pub fn config(&self) -> &ProcessConfig {
        &self.config
    }

    /// Check if process is still running
    pub fn is_running(&mut self) -> bool {
        match self.child.try_wait() {
            Ok(Some(_)) => false,
            Ok(None) => true,
            Err(_) => false,
        }
    }

    /// Wait for process to exit, honouring the configured timeout
    pub async fn wait(&mut self) -> Result<ExitStatus> {
        match self.config.timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.child.wait())
                .await
                .map_err(|_| ProcessError::Timeout {
                    seconds: timeout.as_secs(),
                })?
                .map_err(Into::into),
            None => self.child.wait().await.map_err(Into::into),
        }
    }

    /// Terminate the process (and its group), escalating to a forced kill.
    ///
    /// Sends SIGTERM, waits up to `grace` for the process to exit, then sends
    /// SIGKILL and reaps it. The returned status is the one actually reaped.
    pub async fn terminate(&mut self, grace: Duration) -> Result<ExitStatus> {
        if let Ok(Some(status)) = self.child.try_wait() {
            return Ok(status);
        }

        debug!(pid = %self.pid, grace_ms = grace.as_millis() as u64, "Terminating process");
        self.signal_term();

        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => {
                debug!(pid = %self.pid, "Process exited within grace period");
                Ok(status)
            }
            Ok(Err(e)) => Err(ProcessError::KillFailed(e.to_string())),
            Err(_) => {
                warn!(pid = %self.pid, "Process ignored SIGTERM, killing");
                self.signal_kill();
                if let Err(e) = self.child.start_kill() {
                    debug!(pid = %self.pid, error = %e, "start_kill after group kill");
                }
                self.child
                    .wait()
                    .await
                    .map_err(|e| ProcessError::KillFailed(e.to_string()))
            }
        }
    }

    /// Kill the process tree immediately and reap the child
    pub async fn kill_tree(&mut self) -> Result<ExitStatus> {
        debug!(pid = %self.pid, "Killing process tree");
        self.signal_kill();
        if let Err(e) = self.child.start_kill() {
            debug!(pid = %self.pid, error = %e, "start_kill after group kill");
        }
        self.child
            .wait()
            .await
            .map_err(|e| ProcessError::KillFailed(e.to_string()))
    }

    #[cfg(unix)]
    fn signal_term(&self) {
        self.send_signal(nix::sys::signal::Signal::SIGTERM);
    }

    #[cfg(unix)]
    fn signal_kill(&self) {
        self.send_signal(nix::sys::signal::Signal::SIGKILL);
    }

    #[cfg(unix)]
    fn send_signal(&self, signal: nix::sys::signal::Signal) {
        signal_process(self.pid, self.config.process_group, signal);
    }

    #[cfg(not(unix))]
    fn signal_term(&mut self) {
        // No graceful signal on this platform; the grace wait still applies.
        if let Err(e) = self.child.start_kill() {
            warn!(pid = %self.pid, error = %e, "Failed to kill process");
        }
    }

    #[cfg(not(unix))]
    fn signal_kill(&mut self) {
        let _ = self.child.start_kill();
    }

    /// Take stdout handle
    pub fn stdout(&mut self) -> Option<tokio::process::ChildStdout> {
        self.child.stdout.take()
    }

    /// Take stderr handle
    pub fn stderr(&mut self) -> Option<tokio::process::ChildStderr> {
        self.child.stderr.take()
    }
}

/// Send `signal` to `pid`, or to its whole process group when `group` is set.
///
/// Synchronous, so it is usable from `Drop` after the runtime is gone.
#[cfg(unix)]
pub(crate) fn signal_process(pid: u32, group: bool, signal: nix::sys::signal::Signal) {
    use nix::errno::Errno;
    use nix::sys::signal::{kill, killpg};
    use nix::unistd::Pid;

    if pid == 0 {
        return;
    }
    let target = Pid::from_raw(pid as i32);

    let result = if group {
        killpg(target, signal).or_else(|e| {
            warn!(%pid, error = %e, ?signal, "Group signal failed, signalling process only");
            kill(target, signal)
        })
    } else {
        kill(target, signal)
    };

    match result {
        Ok(()) => debug!(%pid, ?signal, "Signal sent"),
        // Already gone
        Err(Errno::ESRCH) => {}
        Err(e) => warn!(%pid, error = %e, ?signal, "Failed to signal process"),
    }
}

/// Signal that terminated the process, if any
#[cfg(unix)]
pub(crate) fn exit_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
pub(crate) fn exit_signal(_status: &ExitStatus) -> Option<i32> {
    None
}
