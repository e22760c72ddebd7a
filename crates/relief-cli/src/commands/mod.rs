// Command handlers for the relief CLI

pub mod build;
pub mod config;
pub mod tabs;

pub use build::BuildCommand;
pub use config::{ConfigAction, ConfigCommand};
pub use tabs::TabsCommand;

use relief_workspace::AppContext;

use crate::error::CliResult;

/// Trait for command handlers.
///
/// The context owns the build supervisor, which stays on the thread that
/// runs the command.
#[async_trait::async_trait(?Send)]
pub trait Command {
    /// Execute the command
    async fn execute(&self, ctx: &mut AppContext) -> CliResult<()>;
}
