use crate::context::AppContext;
use crate::error::{Result, WorkspaceError};
use crate::form::{ConfigForm, ConfigSource};
use crate::page::TabPage;

/// A page that only edits settings
pub struct SettingsPage {
    name: String,
    form: ConfigForm,
}

impl SettingsPage {
    pub fn new(name: impl Into<String>, form: ConfigForm) -> Self {
        Self {
            name: name.into(),
            form,
        }
    }
}

impl TabPage for SettingsPage {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&mut self, ctx: &mut AppContext) -> Result<()> {
        if self.form.source() == ConfigSource::Project && !ctx.project_config.is_loaded() {
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

    fn form(&self) -> Option<&ConfigForm> {
        Some(&self.form)
    }

    fn form_mut(&mut self) -> Option<&mut ConfigForm> {
        Some(&mut self.form)
    }
}
