//! Build sessions and the events they produce

use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::ProcessError;
use crate::target::BuildTarget;

/// Output kept per session; the oldest lines are discarded beyond this
pub const MAX_OUTPUT_BYTES: usize = 256 * 1024;

/// Identifier of one build attempt. Ids are never reused by a supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub(crate) u64);

impl SessionId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for SessionId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of a build session.
///
/// `Pending -> Running -> {Succeeded, Failed, Cancelled}`; the last three
/// are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which pipe a chunk of output came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Incremental output from a running build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChunk {
    pub stream: OutputStream,
    pub text: String,
}

/// Final report handed to finished observers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    pub session: SessionId,
    pub target: String,
    pub status: SessionStatus,
    pub exit_code: Option<i32>,
    /// Terminating signal, when the process did not exit on its own
    pub signal: Option<i32>,
}

impl BuildOutcome {
    pub fn is_success(&self) -> bool {
        self.status == SessionStatus::Succeeded
    }

    /// Map the outcome onto the error taxonomy
    pub fn into_result(self) -> Result<(), ProcessError> {
        match self.status {
            SessionStatus::Succeeded => Ok(()),
            SessionStatus::Cancelled => Err(ProcessError::Cancelled {
                target: self.target,
            }),
            _ => match self.exit_code {
                Some(code) => Err(ProcessError::NonZeroExit {
                    target: self.target,
                    code,
                }),
                None => Err(ProcessError::Crashed {
                    target: self.target,
                    signal: self.signal,
                }),
            },
        }
    }
}

/// Everything the supervisor reports back to the event loop that owns it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorEvent {
    Output {
        session: SessionId,
        chunk: OutputChunk,
    },
    Finished(BuildOutcome),
}

impl SupervisorEvent {
    pub fn session(&self) -> SessionId {
        match self {
            Self::Output { session, .. } => *session,
            Self::Finished(outcome) => outcome.session,
        }
    }
}

/// One execution attempt of a [`BuildTarget`]
#[derive(Debug, Clone)]
pub struct BuildSession {
    id: SessionId,
    target: BuildTarget,
    status: SessionStatus,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    output: String,
    exit_code: Option<i32>,
    pid: Option<u32>,
    cancel_requested: bool,
}

impl BuildSession {
    pub fn new(id: SessionId, target: BuildTarget) -> Self {
        Self {
            id,
            target,
            status: SessionStatus::Pending,
            started_at: Utc::now(),
            finished_at: None,
            output: String::new(),
            exit_code: None,
            pid: None,
            cancel_requested: false,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn target(&self) -> &BuildTarget {
        &self.target
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Running
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at.unwrap_or_else(Utc::now) - self.started_at
    }

    /// Everything captured so far, stdout and stderr interleaved
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn cancel_requested(&self) -> bool {
        self.cancel_requested
    }

    /// Last `lines` lines of captured output
    pub fn output_tail(&self, lines: usize) -> String {
        tail_lines(&self.output, lines)
    }

    /// `Pending -> Running`. Returns false for any other starting state.
    pub fn mark_running(&mut self, pid: Option<u32>) -> bool {
        if self.status != SessionStatus::Pending {
            return false;
        }
        self.status = SessionStatus::Running;
        self.started_at = Utc::now();
        self.pid = pid;
        true
    }

    /// Append output; ignored once the session is terminal.
    pub fn append_output(&mut self, text: &str) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.output.push_str(text);
        trim_front(&mut self.output, MAX_OUTPUT_BYTES);
        true
    }

    pub(crate) fn request_cancel(&mut self) -> bool {
        if self.status != SessionStatus::Running || self.cancel_requested {
            return false;
        }
        self.cancel_requested = true;
        true
    }

    /// `Running -> terminal`. Returns false (and changes nothing) when the
    /// session is not running or `status` is not terminal.
    pub fn finish(&mut self, status: SessionStatus, exit_code: Option<i32>) -> bool {
        if self.status != SessionStatus::Running || !status.is_terminal() {
            return false;
        }
        self.status = status;
        self.exit_code = exit_code;
        self.finished_at = Some(Utc::now());
        true
    }
}

/// Drop whole lines from the front of `buffer` until it fits in `limit` bytes.
///
/// A single line longer than `limit` is cut at a char boundary instead.
pub fn trim_front(buffer: &mut String, limit: usize) {
    if buffer.len() <= limit {
        return;
    }
    let mut cut = buffer.len() - limit;
    while !buffer.is_char_boundary(cut) {
        cut += 1;
    }
    if let Some(newline) = buffer[cut..].find('\n') {
        if cut + newline + 1 < buffer.len() {
            cut += newline + 1;
        }
    }
    buffer.drain(..cut);
}

pub(crate) fn tail_lines(text: &str, lines: usize) -> String {
    if lines == 0 {
        return String::new();
    }
    let trimmed = text.trim_end_matches('\n');
    let start = trimmed
        .rmatch_indices('\n')
        .nth(lines - 1)
        .map(|(idx, _)| idx + 1)
        .unwrap_or(0);
    trimmed[start..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> BuildSession {
        BuildSession::new(SessionId(1), BuildTarget::make("make", "relief"))
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut s = session();
        assert_eq!(s.status(), SessionStatus::Pending);
        assert!(!s.finish(SessionStatus::Succeeded, Some(0)));

        assert!(s.mark_running(Some(42)));
        assert!(!s.mark_running(Some(43)));
        assert_eq!(s.pid(), Some(42));

        assert!(!s.finish(SessionStatus::Running, None));
        assert!(s.finish(SessionStatus::Failed, Some(2)));
        assert_eq!(s.status(), SessionStatus::Failed);
        assert_eq!(s.exit_code(), Some(2));
        assert!(s.finished_at().is_some());
    }

    #[test]
    fn test_terminal_state_is_absorbing() {
        let mut s = session();
        s.mark_running(None);
        assert!(s.finish(SessionStatus::Cancelled, None));

        assert!(!s.finish(SessionStatus::Succeeded, Some(0)));
        assert!(!s.finish(SessionStatus::Failed, Some(1)));
        assert!(!s.request_cancel());
        assert!(!s.append_output("late"));
        assert_eq!(s.status(), SessionStatus::Cancelled);
        assert_eq!(s.exit_code(), None);
    }

    #[test]
    fn test_output_tail() {
        let mut s = session();
        s.mark_running(None);
        s.append_output("one\ntwo\n");
        s.append_output("three\nfour\n");

        assert_eq!(s.output_tail(2), "three\nfour");
        assert_eq!(s.output_tail(10), "one\ntwo\nthree\nfour");
        assert_eq!(s.output_tail(0), "");
    }

    #[test]
    fn test_output_is_bounded() {
        let mut s = session();
        s.mark_running(None);
        let line = format!("{}\n", "g".repeat(1023));
        for _ in 0..(MAX_OUTPUT_BYTES / line.len() + 8) {
            assert!(s.append_output(&line));
        }
        s.append_output("done\n");

        assert!(s.output().len() <= MAX_OUTPUT_BYTES);
        assert!(s.output().starts_with('g'));
        assert_eq!(s.output_tail(1), "done");
    }

    #[test]
    fn test_trim_front_keeps_char_boundaries() {
        let mut text = "é".repeat(10);
        trim_front(&mut text, 5);
        assert!(text.len() <= 6);
        assert!(text.chars().all(|c| c == 'é'));

        let mut lines = "aaaa\nbbbb\ncc".to_string();
        trim_front(&mut lines, 8);
        assert_eq!(lines, "bbbb\ncc");
    }

    #[test]
    fn test_outcome_into_result() {
        let outcome = BuildOutcome {
            session: SessionId(3),
            target: "make".into(),
            status: SessionStatus::Failed,
            exit_code: Some(2),
            signal: None,
        };
        assert!(matches!(
            outcome.into_result(),
            Err(ProcessError::NonZeroExit { code: 2, .. })
        ));
    }
}
