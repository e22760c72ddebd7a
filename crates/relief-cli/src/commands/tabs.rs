// List the tabs for the current settings

use std::path::PathBuf;

use relief_workspace::{build_tabs, AppContext, ALWAYS_ENABLED};

use super::Command;
use crate::error::CliResult;
use crate::output::OutputStyle;

/// Show tabs, optionally after opening a project
pub struct TabsCommand {
    pub project: Option<PathBuf>,
}

impl TabsCommand {
    pub fn new(project: Option<PathBuf>) -> Self {
        Self { project }
    }
}

#[async_trait::async_trait(?Send)]
impl Command for TabsCommand {
    async fn execute(&self, ctx: &mut AppContext) -> CliResult<()> {
        let style = OutputStyle::default();
        let mut tabs = build_tabs(&ctx.settings)?;
        if let Some(project) = &self.project {
            tabs.open_project(project, ALWAYS_ENABLED, ctx)?;
        }

        println!(
            "{}",
            style.header(&format!("Tabs ({} mode)", ctx.settings.mode))
        );
        for (index, tab) in tabs.descriptors().iter().enumerate() {
            let mut line = style.tab(&tab.name, index == tabs.active_index(), tab.enabled);
            if let Some(panel) = tabs.page(index).and_then(|p| p.preview()) {
                let actions: Vec<String> = panel.actions().map(|a| a.to_string()).collect();
                line.push_str(&format!("  [{}]", actions.join(", ")));
            }
            println!("{line}");
        }

        if !ctx.project.status().is_empty() {
            println!();
            println!("{}", style.info(ctx.project.status()));
        }
        Ok(())
    }
}
