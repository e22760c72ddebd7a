//! Process manager - spawning

use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

use crate::{
    child::ManagedChild,
    config::ProcessConfig,
    error::{ProcessError, Result},
};

/// Spawns managed processes.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessManager;

impl ProcessManager {
    /// Create new process manager
    pub fn new() -> Self {
        Self
    }

    /// Spawn a managed process
    ///
    /// Spawning never blocks on the child: the returned handle is ready as
    /// soon as the OS has created the process.
    ///
    /// # Examples
    /// ```no_run
    /// use relief_process::{ProcessManager, ProcessConfig};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let manager = ProcessManager::new();
    /// let config = ProcessConfig::new("gdalinfo").args(["--version"]);
    /// let mut child = manager.spawn(config)?;
    /// child.wait().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn spawn(&self, config: ProcessConfig) -> Result<ManagedChild> {
        if config.command.trim().is_empty() {
            return Err(ProcessError::InvalidConfig("empty command".to_string()));
        }

        debug!(
            command = %config.command,
            args = ?config.args,
            cwd = ?config.working_dir,
            "Spawning process"
        );

        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args);

        if let Some(ref dir) = config.working_dir {
            cmd.current_dir(dir);
        }

        for (key, value) in &config.env {
            cmd.env(key, value);
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(if config.capture_stdout {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        cmd.stderr(if config.capture_stderr {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        cmd.kill_on_drop(true);

        #[cfg(unix)]
        if config.process_group {
            cmd.process_group(0);
        }

        let child = cmd.spawn().map_err(|source| ProcessError::SpawnFailed {
            program: config.command.clone(),
            source,
        })?;
        let pid = child.id().ok_or_else(|| ProcessError::SpawnFailed {
            program: config.command.clone(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "Failed to get process ID"),
        })?;

        info!(pid = %pid, command = %config.command, "Process spawned");

        Ok(ManagedChild::new(child, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spawn_echo() {
        let manager = ProcessManager::new();
        let config = ProcessConfig::new("echo").args(["hello"]);

        let mut child = manager.spawn(config).unwrap();
        assert!(child.pid() > 0);
        assert!(child.wait().await.unwrap().success());
    }

    #[tokio::test]
    async fn test_spawn_missing_executable() {
        let manager = ProcessManager::new();
        let config = ProcessConfig::new("/nonexistent/relief-no-such-tool");

        match manager.spawn(config) {
            Err(ProcessError::SpawnFailed { program, .. }) => {
                assert_eq!(program, "/nonexistent/relief-no-such-tool")
            }
            other => panic!("expected spawn failure, got {:?}", other.map(|c| c.pid())),
        }
    }

    #[tokio::test]
    async fn test_spawn_rejects_empty_command() {
        let manager = ProcessManager::new();
        assert!(matches!(
            manager.spawn(ProcessConfig::new("  ")),
            Err(ProcessError::InvalidConfig(_))
        ));
    }
}
