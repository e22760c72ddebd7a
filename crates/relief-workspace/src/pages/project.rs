use relief_config::{create_file_from_default, ConfigError, ConfigStore, DEFAULT_PROJECT_CONFIG};
use tracing::info;

use crate::context::AppContext;
use crate::error::{Result, WorkspaceError};
use crate::page::TabPage;

/// First tab: owns loading the project config
pub struct ProjectPage {
    name: String,
    makefile_present: bool,
}

impl ProjectPage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            makefile_present: false,
        }
    }

    /// Whether the project directory held a Makefile at load time
    pub fn makefile_present(&self) -> bool {
        self.makefile_present
    }
}

impl TabPage for ProjectPage {
    fn name(&self) -> &str {
        &self.name
    }

    /// Load `<name>_relief.cfg`, creating it from defaults the first time
    fn load(&mut self, ctx: &mut AppContext) -> Result<()> {
        let path = ctx.project.config_path().ok_or(WorkspaceError::NoProject)?;
        let fail = |e: ConfigError| WorkspaceError::tab_load(&self.name, e);

        let mut store = ConfigStore::new();
        match store.load(&path) {
            Ok(()) => {}
            Err(ConfigError::NotFound(_)) => {
                create_file_from_default(&path, DEFAULT_PROJECT_CONFIG).map_err(fail)?;
                store.load(&path).map_err(fail)?;
                info!(path = %path.display(), "Created project settings");
            }
            Err(e) => return Err(fail(e)),
        }
        ctx.project_config = store;

        self.makefile_present = ctx.project.makefile_path().is_some_and(|p| p.is_file());
        Ok(())
    }
}
