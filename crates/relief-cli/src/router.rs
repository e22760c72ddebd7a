// Command routing and dispatch

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use relief_config::{app_files_path, load_app_config, APP_CONFIG_NAME};
use relief_workspace::{AppContext, PanelAction};
use tracing::warn;

use crate::commands::*;
use crate::error::CliResult;
use crate::logging;

/// relief - build hillshade, color relief and contour images from DEMs
#[derive(Parser, Debug)]
#[command(name = "relief")]
#[command(bin_name = "relief")]
#[command(about = "Build color relief images from elevation data")]
#[command(
    long_about = "relief: runs the Makefile of a color relief project and reports its progress.\n\nQuick Start:\n  • relief tabs ./alps        Show the tabs of a project\n  • relief build ./alps       Build the color relief image\n  • relief view ./alps        Open the result in the image viewer\n  • relief config list        Show application settings"
)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only report errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Application settings file (default: user config directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build a tab's image with make
    #[command(about = "Run make for a tab's image")]
    Build {
        /// Project directory
        #[arg(value_name = "PROJECT")]
        project: PathBuf,

        /// Tab whose image to build
        #[arg(short, long, default_value = "Create")]
        tab: String,
    },

    /// Remove build products
    #[command(about = "Run make clean in the project")]
    Clean {
        #[arg(value_name = "PROJECT")]
        project: PathBuf,
    },

    /// Publish the finished image
    #[command(about = "Run make publish in the project")]
    Publish {
        #[arg(value_name = "PROJECT")]
        project: PathBuf,
    },

    /// Open a tab's image in the configured viewer
    #[command(about = "Open a rendered image in the image viewer")]
    View {
        #[arg(value_name = "PROJECT")]
        project: PathBuf,

        #[arg(short, long, default_value = "Create")]
        tab: String,
    },

    /// List tabs and whether they are available
    #[command(about = "Show the tabs for the current settings")]
    Tabs {
        /// Project to open before listing
        #[arg(value_name = "PROJECT")]
        project: Option<PathBuf>,
    },

    /// Manage settings
    #[command(about = "View and change application or project settings")]
    Config {
        /// Edit this project's settings instead of the application's
        #[arg(short, long, value_name = "PROJECT")]
        project: Option<PathBuf>,

        #[command(subcommand)]
        action: Option<ConfigSubcommand>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// List all settings
    List,
    /// Get a setting value
    Get {
        #[arg(value_name = "KEY")]
        key: String,
    },
    /// Set a setting value
    Set {
        #[arg(value_name = "KEY")]
        key: String,
        #[arg(value_name = "VALUE")]
        value: String,
    },
}

/// Routes parsed commands to their handlers
pub struct CommandRouter;

impl CommandRouter {
    /// Parse CLI arguments and route to appropriate handler
    pub async fn route() -> CliResult<()> {
        let cli = Cli::parse();
        let mut ctx = Self::context(&cli);
        Self::execute(&cli, &mut ctx).await
    }

    /// Load application settings and set up logging from them
    pub fn context(cli: &Cli) -> AppContext {
        let path = cli
            .config
            .clone()
            .unwrap_or_else(|| app_files_path(APP_CONFIG_NAME));
        let ctx = AppContext::new(load_app_config(&path));

        logging::init_logging(logging::filter_for(cli.verbose, cli.quiet, &ctx.settings));
        if !ctx.app_config.status().is_empty() {
            warn!(path = %path.display(), status = ctx.app_config.status(), "Application settings");
        }
        ctx
    }

    /// Execute a command
    pub async fn execute(cli: &Cli, ctx: &mut AppContext) -> CliResult<()> {
        match &cli.command {
            Commands::Build { project, tab } => {
                BuildCommand::new(project.clone(), tab.clone(), PanelAction::Make)
                    .execute(ctx)
                    .await
            }
            Commands::Clean { project } => {
                BuildCommand::new(project.clone(), "Create", PanelAction::Clean)
                    .execute(ctx)
                    .await
            }
            Commands::Publish { project } => {
                BuildCommand::new(project.clone(), "Create", PanelAction::Publish)
                    .execute(ctx)
                    .await
            }
            Commands::View { project, tab } => {
                BuildCommand::new(project.clone(), tab.clone(), PanelAction::View)
                    .execute(ctx)
                    .await
            }
            Commands::Tabs { project } => TabsCommand::new(project.clone()).execute(ctx).await,
            Commands::Config { project, action } => {
                let action = match action {
                    Some(ConfigSubcommand::List) | None => ConfigAction::List,
                    Some(ConfigSubcommand::Get { key }) => ConfigAction::Get(key.clone()),
                    Some(ConfigSubcommand::Set { key, value }) => {
                        ConfigAction::Set(key.clone(), value.clone())
                    }
                };
                ConfigCommand::new(action, project.clone()).execute(ctx).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build_defaults_to_create_tab() {
        let cli = Cli::try_parse_from(["relief", "build", "/data/alps"]).unwrap();
        match cli.command {
            Commands::Build { project, tab } => {
                assert_eq!(project, PathBuf::from("/data/alps"));
                assert_eq!(tab, "Create");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_config_set_with_project() {
        let cli = Cli::try_parse_from([
            "relief", "-v", "config", "--project", "alps", "set", "EDGE", "50",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Config {
                project: Some(_),
                action: Some(ConfigSubcommand::Set { .. })
            }
        ));
    }

    #[test]
    fn test_command_is_required() {
        assert!(Cli::try_parse_from(["relief"]).is_err());
    }
}
