//! Build panel: binds a page's actions to the supervisor and mirrors the
//! state of the builds it started

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use relief_process::target::MAKEFILE_NAME;
use relief_process::{
    trim_front, BuildOutcome, BuildTarget, ProcessError, SessionId, SessionStatus,
    SupervisorEvent,
};
use tracing::{debug, warn};

use crate::context::AppContext;
use crate::error::{Result, WorkspaceError};

/// Upper bound on buffered output per panel
pub const MAX_LOG_BYTES: usize = 256 * 1024;

/// Lines of output shown with a failure
pub const FAILURE_TAIL_LINES: usize = 20;

/// Buttons a panel can offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PanelAction {
    Make,
    View,
    Publish,
    Cancel,
    Clean,
}

impl PanelAction {
    pub const ALL: [PanelAction; 5] = [
        PanelAction::Make,
        PanelAction::View,
        PanelAction::Publish,
        PanelAction::Cancel,
        PanelAction::Clean,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Make => "make",
            Self::View => "view",
            Self::Publish => "publish",
            Self::Cancel => "cancel",
            Self::Clean => "clean",
        }
    }
}

impl fmt::Display for PanelAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PanelAction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown action `{s}`"))
    }
}

/// Live state of one page's builds
#[derive(Debug, Clone)]
pub struct PreviewPanel {
    tab: String,
    goal: String,
    actions: BTreeSet<PanelAction>,
    session: Option<SessionId>,
    log: String,
    status: String,
    error: bool,
    last_outcome: Option<BuildOutcome>,
}

impl PreviewPanel {
    /// Panel for `tab` building the make goal `goal`
    pub fn new(
        tab: impl Into<String>,
        goal: impl Into<String>,
        actions: impl IntoIterator<Item = PanelAction>,
    ) -> Self {
        Self {
            tab: tab.into(),
            goal: goal.into(),
            actions: actions.into_iter().collect(),
            session: None,
            log: String::new(),
            status: String::new(),
            error: false,
            last_outcome: None,
        }
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn actions(&self) -> impl Iterator<Item = PanelAction> + '_ {
        self.actions.iter().copied()
    }

    pub fn offers(&self, action: PanelAction) -> bool {
        self.actions.contains(&action)
    }

    /// Session this panel started most recently
    pub fn session(&self) -> Option<SessionId> {
        self.session
    }

    /// Whether a session started here still holds the supervisor
    pub fn owns_active_build(&self, ctx: &AppContext) -> bool {
        self.session.is_some() && self.session == ctx.supervisor.active_session()
    }

    /// Whether the button for `action` should be clickable right now
    pub fn is_action_enabled(&self, action: PanelAction, ctx: &AppContext) -> bool {
        if !self.offers(action) {
            return false;
        }
        match action {
            PanelAction::Cancel => self.owns_active_build(ctx),
            _ => ctx.project.is_open() && !ctx.supervisor.is_running(),
        }
    }

    /// Map an action to the command it runs
    pub fn resolve_target(&self, action: PanelAction, ctx: &AppContext) -> Result<BuildTarget> {
        let make = |goal: &str| {
            let quiet = ctx.project_config.get("QUIET").unwrap_or_default();
            let mut target = BuildTarget::new(action.as_str(), "make").args(["-f", MAKEFILE_NAME]);
            if !quiet.trim().is_empty() {
                target = target.arg(format!("QUIET={}", quiet.trim()));
            }
            target.arg(goal)
        };

        match action {
            PanelAction::Make => Ok(make(&self.goal)),
            PanelAction::Publish => Ok(make("publish")),
            PanelAction::Clean => Ok(make("clean")),
            PanelAction::View => {
                let image = ctx
                    .project
                    .image_path(&self.goal)
                    .ok_or(WorkspaceError::NoProject)?;
                Ok(BuildTarget::new("view", ctx.settings.viewer.clone())
                    .arg(image.to_string_lossy().into_owned()))
            }
            PanelAction::Cancel => Err(WorkspaceError::ActionUnavailable {
                tab: self.tab.clone(),
                action,
            }),
        }
    }

    /// Run `action`. Returns the session it started or cancelled; cancelling
    /// with nothing running returns `None`.
    pub fn trigger(&mut self, action: PanelAction, ctx: &mut AppContext) -> Result<Option<SessionId>> {
        if !self.offers(action) {
            return Err(WorkspaceError::ActionUnavailable {
                tab: self.tab.clone(),
                action,
            });
        }

        if action == PanelAction::Cancel {
            return Ok(self.cancel(ctx));
        }

        let Some(dir) = ctx.project.dir().map(|d| d.to_path_buf()) else {
            return Err(WorkspaceError::NoProject);
        };
        let target = self.resolve_target(action, ctx)?;

        if let Some(active) = ctx.supervisor.active_session() {
            let rejected = ProcessError::AlreadyRunning { active };
            warn!(tab = %self.tab, error = %rejected, "Build rejected");
            if !self.owns_active_build(ctx) {
                self.status = rejected.to_string();
                self.error = true;
            }
            return Err(rejected.into());
        }

        if ctx.project_config.is_loaded() && ctx.project_config.is_dirty() {
            if let Err(e) = ctx.project_config.save() {
                warn!(tab = %self.tab, error = %e, "Could not save settings before build");
            }
        }

        let env = ctx.build_environment();
        match ctx.supervisor.start(&target, &env, &dir) {
            Ok(id) => {
                debug!(tab = %self.tab, session = %id, "Panel owns build");
                self.session = Some(id);
                self.log.clear();
                self.error = false;
                self.last_outcome = None;
                self.status = format!("Running: {}", target.command_line());
                Ok(Some(id))
            }
            Err(e) => {
                warn!(tab = %self.tab, error = %e, "Build rejected");
                self.status = e.to_string();
                self.error = true;
                Err(e.into())
            }
        }
    }

    fn cancel(&mut self, ctx: &mut AppContext) -> Option<SessionId> {
        let id = self.session.filter(|_| self.owns_active_build(ctx))?;
        if ctx.supervisor.cancel(id) {
            self.status = "Cancelling...".to_string();
            Some(id)
        } else {
            None
        }
    }

    /// Mirror a dispatched supervisor event; events of other sessions are ignored
    pub fn handle_event(&mut self, event: &SupervisorEvent) {
        if Some(event.session()) != self.session {
            return;
        }
        match event {
            SupervisorEvent::Output { chunk, .. } => self.append_log(&chunk.text),
            SupervisorEvent::Finished(outcome) => {
                self.error = outcome.status == SessionStatus::Failed;
                self.status = match outcome.status {
                    SessionStatus::Succeeded => format!("{} completed", outcome.target),
                    SessionStatus::Cancelled => format!("{} cancelled", outcome.target),
                    _ => match (outcome.exit_code, outcome.signal) {
                        (Some(code), _) => format!("{} failed (exit code {code})", outcome.target),
                        (None, Some(signal)) => {
                            format!("{} failed (signal {signal})", outcome.target)
                        }
                        (None, None) => format!("{} failed", outcome.target),
                    },
                };
                self.last_outcome = Some(outcome.clone());
            }
        }
    }

    fn append_log(&mut self, text: &str) {
        self.log.push_str(text);
        trim_front(&mut self.log, MAX_LOG_BYTES);
    }

    pub fn log(&self) -> &str {
        &self.log
    }

    /// Last `lines` lines of output
    pub fn log_tail(&self, lines: usize) -> String {
        let all: Vec<&str> = self.log.lines().collect();
        all[all.len().saturating_sub(lines)..].join("\n")
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn has_error(&self) -> bool {
        self.error
    }

    pub fn last_outcome(&self) -> Option<&BuildOutcome> {
        self.last_outcome.as_ref()
    }

    /// Output shown alongside a failure
    pub fn failure_details(&self) -> Option<String> {
        self.error.then(|| self.log_tail(FAILURE_TAIL_LINES))
    }
}
