//! Shared state handed to every tab: settings, config stores, the open
//! project and the build supervisor

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use relief_config::{AppSettings, ConfigStore};
use relief_process::target::MAKEFILE_NAME;
use relief_process::{BuildSupervisor, SupervisorConfig};
use tracing::{debug, warn};

use crate::error::{Result, WorkspaceError};

/// Suffix of a project's config file: `<dir>/<name>_relief.cfg`
pub const PROJECT_CONFIG_SUFFIX: &str = "_relief.cfg";

/// The project directory currently being edited
#[derive(Debug, Clone, Default)]
pub struct ProjectContext {
    dir: Option<PathBuf>,
    name: String,
    status: String,
}

impl ProjectContext {
    /// No project open
    pub fn new() -> Self {
        Self::default()
    }

    /// Describe the project rooted at `dir`; the directory must exist
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(WorkspaceError::ProjectNotFound(dir.to_path_buf()));
        }
        let dir = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string());
        debug!(project = %name, dir = %dir.display(), "Opened project directory");
        Ok(Self {
            dir: Some(dir),
            name,
            status: String::new(),
        })
    }

    pub fn is_open(&self) -> bool {
        self.dir.is_some()
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Project name, the last component of its directory
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config_path(&self) -> Option<PathBuf> {
        self.dir
            .as_ref()
            .map(|d| d.join(format!("{}{}", self.name, PROJECT_CONFIG_SUFFIX)))
    }

    pub fn makefile_path(&self) -> Option<PathBuf> {
        self.dir.as_ref().map(|d| d.join(MAKEFILE_NAME))
    }

    /// Rendered image for a make goal
    pub fn image_path(&self, goal: &str) -> Option<PathBuf> {
        self.dir.as_ref().map(|d| d.join(format!("{goal}.tif")))
    }

    /// Last user-facing status message
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }
}

/// Everything a tab may read or change while loading, entering or building
pub struct AppContext {
    pub settings: AppSettings,
    pub app_config: ConfigStore,
    pub project_config: ConfigStore,
    pub project: ProjectContext,
    pub supervisor: BuildSupervisor,
}

impl AppContext {
    /// Build the context from a loaded application config
    pub fn new(app_config: ConfigStore) -> Self {
        let settings = AppSettings::from_store(&app_config).apply_env_overrides();
        let supervisor = BuildSupervisor::new(
            SupervisorConfig::default().with_cancel_grace(settings.cancel_grace),
        );
        Self {
            settings,
            app_config,
            project_config: ConfigStore::new(),
            project: ProjectContext::new(),
            supervisor,
        }
    }

    /// Re-read typed settings after the application store changed
    pub fn refresh_settings(&mut self) {
        self.settings = AppSettings::from_store(&self.app_config).apply_env_overrides();
    }

    /// Environment passed to builds: the project name plus every top-level
    /// scalar of the project config
    pub fn build_environment(&self) -> HashMap<String, String> {
        let mut env: HashMap<String, String> =
            self.project_config.top_level_scalars().into_iter().collect();
        env.insert("PROJECT".to_string(), self.project.name().to_string());
        env
    }

    /// Save every loaded store that has unsaved changes; failures are logged
    pub fn save_settings(&mut self) {
        for (label, store) in [
            ("application", &mut self.app_config),
            ("project", &mut self.project_config),
        ] {
            if !store.is_loaded() || !store.is_dirty() {
                continue;
            }
            if let Err(e) = store.save() {
                warn!(config = label, error = %e, "Error saving settings");
            }
        }
    }
}
