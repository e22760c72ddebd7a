//! Workspace error types

use std::path::PathBuf;

use relief_config::ConfigError;
use relief_process::ProcessError;
use thiserror::Error;

use crate::panel::PanelAction;

/// Workspace result type
pub type Result<T> = std::result::Result<T, WorkspaceError>;

/// Errors raised by tabs, pages and panels
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("No tab at index {0}")]
    NoSuchTab(usize),

    #[error("No tab named `{0}`")]
    UnknownTab(String),

    #[error("Tab `{0}` is disabled")]
    Disabled(String),

    #[error("Duplicate tab name `{0}`")]
    DuplicateTab(String),

    /// A page could not load its data for the current project
    #[error("{tab} File error: {reason}")]
    TabLoad { tab: String, reason: String },

    /// An enter/exit hook failed
    #[error("{tab}: {reason}")]
    Hook { tab: String, reason: String },

    #[error("No project is open")]
    NoProject,

    #[error("Project directory not found: {0}")]
    ProjectNotFound(PathBuf),

    #[error("`{action}` is not available on the {tab} tab")]
    ActionUnavailable { tab: String, action: PanelAction },

    #[error("Invalid value for {key}: {reason}")]
    InvalidField { key: String, reason: String },

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl WorkspaceError {
    pub(crate) fn tab_load(tab: &str, reason: impl ToString) -> Self {
        Self::TabLoad {
            tab: tab.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn hook(tab: &str, reason: impl ToString) -> Self {
        Self::Hook {
            tab: tab.to_string(),
            reason: reason.to_string(),
        }
    }
}
