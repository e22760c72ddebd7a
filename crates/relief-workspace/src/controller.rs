//! Ordered tabs, the active index and the enter/exit sequencing between them

use std::path::Path;

use relief_process::{ProcessError, SessionId, SupervisorEvent};
use tracing::{debug, info, warn};

use crate::context::{AppContext, ProjectContext};
use crate::error::{Result, WorkspaceError};
use crate::page::TabPage;
use crate::panel::PanelAction;

/// Name and enablement of one tab, in tab order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabDescriptor {
    pub name: String,
    pub enabled: bool,
}

struct TabEntry {
    page: Box<dyn TabPage>,
    enabled: bool,
}

/// Owns the pages and sequences their lifecycle hooks
#[derive(Default)]
pub struct TabController {
    tabs: Vec<TabEntry>,
    active: usize,
}

impl TabController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a page; names must be unique. New tabs start enabled.
    pub fn add_tab(&mut self, page: Box<dyn TabPage>) -> Result<usize> {
        if self.index_of(page.name()).is_some() {
            return Err(WorkspaceError::DuplicateTab(page.name().to_string()));
        }
        debug!(tab = page.name(), index = self.tabs.len(), "Registered tab");
        self.tabs.push(TabEntry {
            page,
            enabled: true,
        });
        Ok(self.tabs.len() - 1)
    }

    pub fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_name(&self) -> Option<&str> {
        self.tabs.get(self.active).map(|t| t.page.name())
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.tabs.iter().position(|t| t.page.name() == name)
    }

    pub fn is_enabled(&self, index: usize) -> bool {
        self.tabs.get(index).is_some_and(|t| t.enabled)
    }

    pub fn descriptors(&self) -> Vec<TabDescriptor> {
        self.tabs
            .iter()
            .map(|t| TabDescriptor {
                name: t.page.name().to_string(),
                enabled: t.enabled,
            })
            .collect()
    }

    pub fn page(&self, index: usize) -> Option<&dyn TabPage> {
        self.tabs.get(index).map(|t| t.page.as_ref())
    }

    pub fn page_mut(&mut self, index: usize) -> Option<&mut (dyn TabPage + 'static)> {
        self.tabs.get_mut(index).map(|t| t.page.as_mut())
    }

    /// Make `index` the active tab.
    ///
    /// Rejects unknown and disabled tabs without touching any state. Once
    /// accepted the index always moves; the first hook failure is returned
    /// after both hooks have run.
    pub fn switch_to(&mut self, index: usize, ctx: &mut AppContext) -> Result<()> {
        let entry = self.tabs.get(index).ok_or(WorkspaceError::NoSuchTab(index))?;
        if !entry.enabled {
            return Err(WorkspaceError::Disabled(entry.page.name().to_string()));
        }
        if index == self.active {
            return Ok(());
        }

        let previous = self.active;
        let exited = match self.tabs.get_mut(previous) {
            Some(prev) => prev.page.on_tab_exit(ctx),
            None => Ok(()),
        };
        if let Err(e) = &exited {
            warn!(tab = self.tabs[previous].page.name(), error = %e, "Tab exit failed");
        }

        self.active = index;
        let entered = self.tabs[index].page.on_tab_enter(ctx);
        if let Err(e) = &entered {
            warn!(tab = self.tabs[index].page.name(), error = %e, "Tab enter failed");
        }
        debug!(from = previous, to = index, "Switched tab");

        exited.and(entered)
    }

    pub fn switch_to_name(&mut self, name: &str, ctx: &mut AppContext) -> Result<()> {
        let index = self
            .index_of(name)
            .ok_or_else(|| WorkspaceError::UnknownTab(name.to_string()))?;
        self.switch_to(index, ctx)
    }

    /// Enable or disable every tab except the first and those named in
    /// `always_enabled`. A disabled active tab hands focus back to tab 0.
    pub fn set_availability(&mut self, enabled: bool, always_enabled: &[&str]) {
        for tab in self.tabs.iter_mut().skip(1) {
            tab.enabled = enabled || always_enabled.contains(&tab.page.name());
        }
        if !self.is_enabled(self.active) {
            self.active = 0;
        }
        debug!(enabled, "Updated tab availability");
    }

    /// Load every tab in order, stopping at the first failure.
    ///
    /// The failure is recorded as `"<tab> File error"` on the project.
    pub fn load_all(&mut self, ctx: &mut AppContext) -> bool {
        for tab in &mut self.tabs {
            if let Err(e) = tab.page.load(ctx) {
                let name = tab.page.name().to_string();
                warn!(tab = %name, error = %e, "Tab failed to load");
                ctx.project.set_status(format!("{name} File error"));
                return false;
            }
        }
        true
    }

    /// Open the project in `dir`: load every tab and enable them all on success.
    ///
    /// Refused while a build is running, since the build belongs to the
    /// current project.
    pub fn open_project(
        &mut self,
        dir: impl AsRef<Path>,
        always_enabled: &[&str],
        ctx: &mut AppContext,
    ) -> Result<bool> {
        if let Some(active) = ctx.supervisor.active_session() {
            return Err(ProcessError::AlreadyRunning { active }.into());
        }
        let project = ProjectContext::open(dir)?;
        info!(project = project.name(), "Opening project");
        ctx.project = project;

        let loaded = self.load_all(ctx);
        self.set_availability(loaded, always_enabled);
        if loaded {
            ctx.project.set_status(format!("Opened {}", ctx.project.name()));
        }
        Ok(loaded)
    }

    /// Leave the active tab and persist settings. Never fails.
    pub fn close(&mut self, ctx: &mut AppContext) {
        if let Some(tab) = self.tabs.get_mut(self.active) {
            if let Err(e) = tab.page.on_tab_exit(ctx) {
                warn!(tab = tab.page.name(), error = %e, "Tab exit failed during close");
            }
        }
        ctx.save_settings();
        info!("Workspace closed");
    }

    /// Forward a dispatched supervisor event to every page
    pub fn route_event(&mut self, event: &SupervisorEvent) {
        for tab in &mut self.tabs {
            tab.page.on_build_event(event);
        }
    }

    /// Fire a panel action on the tab named `tab`
    pub fn trigger(
        &mut self,
        tab: &str,
        action: PanelAction,
        ctx: &mut AppContext,
    ) -> Result<Option<SessionId>> {
        let index = self
            .index_of(tab)
            .ok_or_else(|| WorkspaceError::UnknownTab(tab.to_string()))?;
        let entry = &mut self.tabs[index];
        if !entry.enabled {
            return Err(WorkspaceError::Disabled(tab.to_string()));
        }
        let panel = entry
            .page
            .preview_mut()
            .ok_or_else(|| WorkspaceError::ActionUnavailable {
                tab: tab.to_string(),
                action,
            })?;
        panel.trigger(action, ctx)
    }

    /// Change a setting shown on the tab named `tab`
    pub fn edit(&mut self, tab: &str, key: &str, value: &str, ctx: &mut AppContext) -> Result<()> {
        let index = self
            .index_of(tab)
            .ok_or_else(|| WorkspaceError::UnknownTab(tab.to_string()))?;
        let form = self.tabs[index]
            .page
            .form_mut()
            .ok_or_else(|| WorkspaceError::InvalidField {
                key: key.to_string(),
                reason: format!("the {tab} tab has no settings"),
            })?;
        form.edit(ctx, key, value)
    }
}
