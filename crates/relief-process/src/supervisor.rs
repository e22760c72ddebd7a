//! Single-slot build supervisor
//!
//! [`BuildSupervisor`] owns at most one running build. The child process is
//! watched by a background task, but nothing the task learns is applied
//! directly: it is sent as a [`SupervisorEvent`] and only takes effect when
//! the owning event loop calls [`BuildSupervisor::dispatch`] (usually via
//! [`BuildSupervisor::pump`]). Observers therefore always run on the loop's
//! thread, one at a time, in the order events were produced.
//!
//! A session stays active until its `Finished` event has been dispatched, so
//! [`BuildSupervisor::is_running`] never reports idle while a process that
//! has not been reaped could still be writing output.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::child::{exit_signal, ManagedChild};
use crate::config::SupervisorConfig;
use crate::error::{ProcessError, Result};
use crate::manager::ProcessManager;
use crate::output::{drain_readers, spawn_reader};
use crate::session::{
    BuildOutcome, BuildSession, OutputChunk, OutputStream, SessionId, SessionStatus,
    SupervisorEvent,
};
use crate::target::BuildTarget;

type OutputObserver = Box<dyn FnMut(SessionId, &OutputChunk)>;
type FinishedObserver = Box<dyn FnMut(&BuildOutcome)>;

struct ActiveBuild {
    id: SessionId,
    pid: u32,
    process_group: bool,
    cancel: CancellationToken,
    monitor: JoinHandle<()>,
}

/// Supervises one external build process at a time
pub struct BuildSupervisor {
    manager: ProcessManager,
    config: SupervisorConfig,
    events_tx: UnboundedSender<SupervisorEvent>,
    events_rx: UnboundedReceiver<SupervisorEvent>,
    session: Option<BuildSession>,
    active: Option<ActiveBuild>,
    output_observers: Vec<OutputObserver>,
    finished_observers: Vec<FinishedObserver>,
    last_id: u64,
}

impl BuildSupervisor {
    pub fn new(config: SupervisorConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            manager: ProcessManager::new(),
            config,
            events_tx,
            events_rx,
            session: None,
            active: None,
            output_observers: Vec::new(),
            finished_observers: Vec::new(),
            last_id: 0,
        }
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Whether a build currently holds the process slot
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Id of the running session, if any
    pub fn active_session(&self) -> Option<SessionId> {
        self.active.as_ref().map(|a| a.id)
    }

    /// The current or most recent session
    pub fn session(&self) -> Option<&BuildSession> {
        self.session.as_ref()
    }

    /// Register a callback for incremental output
    pub fn on_output<F>(&mut self, observer: F)
    where
        F: FnMut(SessionId, &OutputChunk) + 'static,
    {
        self.output_observers.push(Box::new(observer));
    }

    /// Register a callback fired once per session when it becomes terminal
    pub fn on_finished<F>(&mut self, observer: F)
    where
        F: FnMut(&BuildOutcome) + 'static,
    {
        self.finished_observers.push(Box::new(observer));
    }

    /// Start `target` in `working_dir`.
    ///
    /// Returns as soon as the process exists. Fails with
    /// [`ProcessError::AlreadyRunning`] while another session is active and
    /// with [`ProcessError::SpawnFailed`] when the program cannot be started;
    /// in both cases no session is created and the previous one is kept.
    /// Must be called from within a tokio runtime.
    pub fn start(
        &mut self,
        target: &BuildTarget,
        environment: &HashMap<String, String>,
        working_dir: &Path,
    ) -> Result<SessionId> {
        if let Some(active) = &self.active {
            warn!(active = %active.id, target = %target.name(), "Rejecting build, another is running");
            return Err(ProcessError::AlreadyRunning { active: active.id });
        }

        let id = SessionId(self.last_id + 1);
        let mut session = BuildSession::new(id, target.clone());

        let mut process_config = target.process_config(environment, working_dir);
        if let Some(limit) = self.config.build_timeout {
            process_config = process_config.timeout(limit);
        }

        let mut child = self.manager.spawn(process_config)?;
        self.last_id = id.0;
        let pid = child.pid();
        let process_group = child.config().process_group;
        session.mark_running(Some(pid));

        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout() {
            readers.push(spawn_reader(stdout, OutputStream::Stdout, id, self.events_tx.clone()));
        }
        if let Some(stderr) = child.stderr() {
            readers.push(spawn_reader(stderr, OutputStream::Stderr, id, self.events_tx.clone()));
        }

        let cancel = CancellationToken::new();
        let monitor = tokio::spawn(monitor(
            child,
            id,
            target.name().to_string(),
            cancel.clone(),
            readers,
            self.events_tx.clone(),
            self.config,
        ));

        info!(session = %id, target = %target.name(), command = %target.command_line(), "Build started");

        self.session = Some(session);
        self.active = Some(ActiveBuild {
            id,
            pid,
            process_group,
            cancel,
            monitor,
        });
        Ok(id)
    }

    /// Ask the running process of `session` to stop.
    ///
    /// Returns true if a cancellation was issued. Unknown, finished or
    /// already-cancelling sessions are left untouched. The session becomes
    /// `Cancelled` when the resulting `Finished` event is dispatched.
    pub fn cancel(&mut self, session: SessionId) -> bool {
        let Some(active) = self.active.as_ref().filter(|a| a.id == session) else {
            debug!(%session, "Cancel ignored, session not active");
            return false;
        };
        let requested = self
            .session
            .as_mut()
            .filter(|s| s.id() == session)
            .map(BuildSession::request_cancel)
            .unwrap_or(false);
        if !requested {
            return false;
        }

        info!(%session, grace_ms = self.config.cancel_grace.as_millis() as u64, "Cancelling build");
        active.cancel.cancel();
        true
    }

    /// Receive the next raw event without applying it
    pub async fn next_event(&mut self) -> Option<SupervisorEvent> {
        self.events_rx.recv().await
    }

    /// Apply an event to session state, then notify observers.
    ///
    /// Events for sessions other than the current one, and a second
    /// `Finished` for the same session, are dropped.
    pub fn dispatch(&mut self, event: &SupervisorEvent) {
        match event {
            SupervisorEvent::Output { session, chunk } => {
                let applied = self
                    .session
                    .as_mut()
                    .filter(|s| s.id() == *session)
                    .map(|s| s.append_output(&chunk.text))
                    .unwrap_or(false);
                if !applied {
                    debug!(%session, "Dropping output for inactive session");
                    return;
                }
                for observer in &mut self.output_observers {
                    if catch_unwind(AssertUnwindSafe(|| observer(*session, chunk))).is_err() {
                        error!(%session, "Output observer panicked");
                    }
                }
            }
            SupervisorEvent::Finished(outcome) => {
                let applied = self
                    .session
                    .as_mut()
                    .filter(|s| s.id() == outcome.session)
                    .map(|s| s.finish(outcome.status, outcome.exit_code))
                    .unwrap_or(false);
                if !applied {
                    debug!(session = %outcome.session, "Dropping duplicate or stale finish");
                    return;
                }
                if self.active.as_ref().map(|a| a.id) == Some(outcome.session) {
                    self.active = None;
                }

                info!(
                    session = %outcome.session,
                    target = %outcome.target,
                    status = %outcome.status,
                    exit_code = ?outcome.exit_code,
                    "Build finished"
                );

                for observer in &mut self.finished_observers {
                    if catch_unwind(AssertUnwindSafe(|| observer(outcome))).is_err() {
                        error!(session = %outcome.session, "Finished observer panicked");
                    }
                }
            }
        }
    }

    /// Receive and dispatch one event, returning it for further routing
    pub async fn pump(&mut self) -> Option<SupervisorEvent> {
        let event = self.next_event().await?;
        self.dispatch(&event);
        Some(event)
    }

    /// Dispatch every event that is already queued, without waiting
    pub fn pump_pending(&mut self) -> Vec<SupervisorEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            self.dispatch(&event);
            events.push(event);
        }
        events
    }

    /// Pump events until the active session finishes.
    ///
    /// Returns `None` immediately when nothing is running.
    pub async fn wait(&mut self) -> Option<BuildOutcome> {
        let id = self.active_session()?;
        loop {
            if let SupervisorEvent::Finished(outcome) = self.pump().await? {
                if outcome.session == id {
                    return Some(outcome);
                }
            }
        }
    }
}

impl Default for BuildSupervisor {
    fn default() -> Self {
        Self::new(SupervisorConfig::default())
    }
}

impl Drop for BuildSupervisor {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            warn!(session = %active.id, pid = active.pid, "Supervisor dropped with a running build, killing it");
            active.cancel.cancel();
            // The monitor may never run again once the runtime shuts down, so
            // the group is killed here rather than left to the grace sequence.
            #[cfg(unix)]
            crate::child::signal_process(
                active.pid,
                active.process_group,
                nix::sys::signal::Signal::SIGKILL,
            );
            // Still reaps the child if the runtime outlives us.
            drop(active.monitor);
        }
    }
}

async fn monitor(
    mut child: ManagedChild,
    id: SessionId,
    target: String,
    cancel: CancellationToken,
    readers: Vec<JoinHandle<()>>,
    events: UnboundedSender<SupervisorEvent>,
    config: SupervisorConfig,
) {
    let exited = tokio::select! {
        result = child.wait() => Some(result),
        _ = cancel.cancelled() => None,
    };

    let result = match exited {
        Some(Err(ProcessError::Timeout { seconds })) => {
            warn!(session = %id, seconds, "Build exceeded its time limit, terminating");
            child.terminate(config.cancel_grace).await
        }
        Some(result) => result,
        None => child.terminate(config.cancel_grace).await,
    };

    drain_readers(readers, config.drain_timeout).await;

    let (status, exit_code, signal) = match &result {
        _ if cancel.is_cancelled() => {
            let (code, signal) = match &result {
                Ok(s) => (s.code(), exit_signal(s)),
                Err(_) => (None, None),
            };
            (SessionStatus::Cancelled, code, signal)
        }
        Ok(s) if s.success() => (SessionStatus::Succeeded, s.code(), None),
        Ok(s) => (SessionStatus::Failed, s.code(), exit_signal(s)),
        Err(e) => {
            error!(session = %id, error = %e, "Lost track of build process");
            (SessionStatus::Failed, None, None)
        }
    };

    let outcome = BuildOutcome {
        session: id,
        target,
        status,
        exit_code,
        signal,
    };
    if events.send(SupervisorEvent::Finished(outcome)).is_err() {
        debug!(session = %id, "Supervisor gone before build finished");
    }
}
