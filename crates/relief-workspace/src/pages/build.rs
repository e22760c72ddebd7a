use crate::context::AppContext;
use crate::error::{Result, WorkspaceError};
use crate::form::ConfigForm;
use crate::page::TabPage;
use crate::panel::PreviewPanel;

/// Settings for one make goal next to the panel that builds it
pub struct BuildPage {
    name: String,
    form: ConfigForm,
    panel: PreviewPanel,
}

impl BuildPage {
    pub fn new(name: impl Into<String>, form: ConfigForm, panel: PreviewPanel) -> Self {
        Self {
            name: name.into(),
            form,
            panel,
        }
    }
}

impl TabPage for BuildPage {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&mut self, ctx: &mut AppContext) -> Result<()> {
        if !ctx.project_config.is_loaded() {
            return Err(WorkspaceError::tab_load(&self.name, "project settings not loaded"));
        }
        self.form.refresh(ctx);
        Ok(())
    }

    fn on_tab_enter(&mut self, ctx: &mut AppContext) -> Result<()> {
        self.form.refresh(ctx);
        Ok(())
    }

    fn on_tab_exit(&mut self, ctx: &mut AppContext) -> Result<()> {
        self.form
            .save(ctx)
            .map_err(|e| WorkspaceError::hook(&self.name, e))
    }

    fn preview(&self) -> Option<&PreviewPanel> {
        Some(&self.panel)
    }

    fn preview_mut(&mut self) -> Option<&mut PreviewPanel> {
        Some(&mut self.panel)
    }

    fn form(&self) -> Option<&ConfigForm> {
        Some(&self.form)
    }

    fn form_mut(&mut self) -> Option<&mut ConfigForm> {
        Some(&mut self.form)
    }
}
