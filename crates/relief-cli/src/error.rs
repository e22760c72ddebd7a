// Errors surfaced to the command line

use relief_config::ConfigError;
use relief_workspace::WorkspaceError;
use thiserror::Error;

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    /// The project could not be opened; carries the project status line
    #[error("Project error: {0}")]
    Project(String),

    #[error("Build failed: {0}")]
    Build(String),

    #[error("Build cancelled")]
    Interrupted,
}

impl CliError {
    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            CliError::InvalidArgument { message } => {
                format!("Invalid argument: {message}\n\nRun 'relief --help' for usage information.")
            }
            CliError::Io(e) => format!("File operation failed: {e}"),
            CliError::Config(e) => {
                format!("Configuration error: {e}\n\nRun 'relief config list' to check your settings.")
            }
            CliError::Workspace(WorkspaceError::Process(e)) => format!("Build error: {e}"),
            CliError::Workspace(e) => e.to_string(),
            CliError::Project(status) => {
                format!("Could not open project: {status}\n\nRun 'relief tabs <PROJECT>' for details.")
            }
            CliError::Build(details) => format!("Build failed: {details}"),
            CliError::Interrupted => "Build cancelled".to_string(),
        }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Interrupted => 130,
            CliError::InvalidArgument { .. } => 2,
            _ => 1,
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::Interrupted.exit_code(), 130);
        assert_eq!(
            CliError::InvalidArgument {
                message: "x".to_string()
            }
            .exit_code(),
            2
        );
        assert_eq!(CliError::Build("make relief".to_string()).exit_code(), 1);
    }

    #[test]
    fn test_user_message_points_to_help() {
        let err = CliError::Project("Project File error".to_string());
        assert!(err.user_message().contains("Project File error"));
        assert!(err.user_message().contains("relief tabs"));
    }
}
