// Run one panel action of a project and follow it to completion

use std::future::Future;
use std::io::Write;
use std::path::PathBuf;

use relief_process::{BuildOutcome, OutputStream, SessionStatus, SupervisorEvent};
use relief_workspace::{
    build_tabs, AppContext, PanelAction, TabController, WorkspaceError, ALWAYS_ENABLED,
};
use tracing::{info, warn};

use super::Command;
use crate::error::{CliError, CliResult};
use crate::output::OutputStyle;

/// Run make, view, publish or clean for a project
pub struct BuildCommand {
    pub project: PathBuf,
    pub tab: String,
    pub action: PanelAction,
}

enum Step {
    Event(Option<SupervisorEvent>),
    Interrupt(std::io::Result<()>),
}

impl BuildCommand {
    pub fn new(project: PathBuf, tab: impl Into<String>, action: PanelAction) -> Self {
        Self {
            project,
            tab: tab.into(),
            action,
        }
    }

    /// Open the project and make the target tab active
    fn prepare(&self, ctx: &mut AppContext) -> CliResult<TabController> {
        let mut tabs = build_tabs(&ctx.settings)?;
        if !tabs.open_project(&self.project, ALWAYS_ENABLED, ctx)? {
            return Err(CliError::Project(ctx.project.status().to_string()));
        }
        match tabs.switch_to_name(&self.tab, ctx) {
            Ok(()) => {}
            Err(e @ WorkspaceError::Hook { .. }) => warn!(error = %e, "Tab enter failed"),
            Err(e) => return Err(e.into()),
        }
        Ok(tabs)
    }

    /// Pump events until the build ends; the first time `interrupt`
    /// resolves the build is cancelled.
    ///
    /// `interrupt` is polled across iterations, so a Ctrl-C that lands while
    /// an event is being routed is not lost.
    async fn follow<I>(
        &self,
        tabs: &mut TabController,
        ctx: &mut AppContext,
        interrupt: I,
    ) -> CliResult<Option<BuildOutcome>>
    where
        I: Future<Output = std::io::Result<()>>,
    {
        tokio::pin!(interrupt);
        let mut interrupted = false;
        loop {
            let step = tokio::select! {
                event = ctx.supervisor.pump() => Step::Event(event),
                result = &mut interrupt, if !interrupted => Step::Interrupt(result),
            };

            match step {
                Step::Event(None) => return Ok(None),
                Step::Event(Some(event)) => {
                    tabs.route_event(&event);
                    if let SupervisorEvent::Finished(outcome) = event {
                        return Ok(Some(outcome));
                    }
                }
                Step::Interrupt(Err(e)) => {
                    interrupted = true;
                    warn!(error = %e, "Cannot listen for Ctrl-C");
                }
                Step::Interrupt(Ok(())) => {
                    interrupted = true;
                    warn!("Interrupted, cancelling build");
                    tabs.trigger(&self.tab, PanelAction::Cancel, ctx)?;
                }
            }
        }
    }

    fn report(&self, tabs: &TabController, outcome: Option<BuildOutcome>) -> CliResult<()> {
        let style = OutputStyle::default();
        let panel = tabs
            .index_of(&self.tab)
            .and_then(|i| tabs.page(i))
            .and_then(|p| p.preview());
        let status = panel.map(|p| p.status().to_string()).unwrap_or_default();

        match outcome {
            Some(outcome) if outcome.is_success() => {
                eprintln!("{}", style.success(&status));
                Ok(())
            }
            Some(outcome) if outcome.status == SessionStatus::Cancelled => {
                eprintln!("{}", style.warning(&status));
                Err(CliError::Interrupted)
            }
            Some(_) => {
                if let Some(tail) = panel.and_then(|p| p.failure_details()) {
                    if !tail.is_empty() {
                        eprintln!("{}", style.header("Last output"));
                        eprintln!("{tail}");
                    }
                }
                Err(CliError::Build(status))
            }
            None => Err(CliError::Build("build ended without a result".to_string())),
        }
    }
}

#[async_trait::async_trait(?Send)]
impl Command for BuildCommand {
    async fn execute(&self, ctx: &mut AppContext) -> CliResult<()> {
        let mut tabs = self.prepare(ctx)?;

        ctx.supervisor.on_output(|_, chunk| match chunk.stream {
            OutputStream::Stdout => {
                let mut out = std::io::stdout().lock();
                let _ = out.write_all(chunk.text.as_bytes());
                let _ = out.flush();
            }
            OutputStream::Stderr => eprint!("{}", chunk.text),
        });

        let Some(session) = tabs.trigger(&self.tab, self.action, ctx)? else {
            return Err(CliError::InvalidArgument {
                message: format!("`{}` does not start a build", self.action),
            });
        };
        info!(%session, tab = %self.tab, action = %self.action, "Following build");

        let outcome = self.follow(&mut tabs, ctx, tokio::signal::ctrl_c()).await;
        tabs.close(ctx);
        self.report(&tabs, outcome?)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::time::Duration;

    use relief_config::ConfigStore;

    use super::*;

    #[tokio::test]
    async fn test_interrupt_during_busy_output_cancels() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("alps");
        fs::create_dir(&project).unwrap();
        let viewer = dir.path().join("chatty-viewer");
        fs::write(&viewer, "#!/bin/sh\nwhile :; do echo tick; sleep 0.01; done\n").unwrap();
        fs::set_permissions(&viewer, fs::Permissions::from_mode(0o755)).unwrap();

        let mut ctx = AppContext::new(ConfigStore::new());
        ctx.settings.viewer = viewer.to_string_lossy().into_owned();

        let command = BuildCommand::new(project, "Create", PanelAction::View);
        let mut tabs = command.prepare(&mut ctx).unwrap();
        tabs.trigger("Create", PanelAction::View, &mut ctx).unwrap();

        let interrupt = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<(), std::io::Error>(())
        };
        let outcome = tokio::time::timeout(
            Duration::from_secs(10),
            command.follow(&mut tabs, &mut ctx, interrupt),
        )
        .await
        .unwrap()
        .unwrap()
        .unwrap();

        assert_eq!(outcome.status, SessionStatus::Cancelled);
        assert!(matches!(command.report(&tabs, Some(outcome)), Err(CliError::Interrupted)));
    }
}
