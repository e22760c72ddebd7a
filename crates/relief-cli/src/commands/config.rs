// Configuration management

use std::path::PathBuf;

use relief_config::{AppSettings, ConfigStore, TabSet, UiMode};
use relief_workspace::{build_tabs, AppContext, ConfigSource, ProjectContext};

use super::Command;
use crate::error::{CliError, CliResult};
use crate::output::OutputStyle;

/// Manage application or project settings
pub struct ConfigCommand {
    pub action: ConfigAction,
    pub project: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub enum ConfigAction {
    List,
    Get(String),
    Set(String, String),
}

impl ConfigCommand {
    pub fn new(action: ConfigAction, project: Option<PathBuf>) -> Self {
        Self { action, project }
    }

    fn source(&self) -> ConfigSource {
        if self.project.is_some() {
            ConfigSource::Project
        } else {
            ConfigSource::App
        }
    }

    /// Load the project's settings into the context
    fn load_project(&self, ctx: &mut AppContext) -> CliResult<()> {
        let Some(dir) = &self.project else {
            return Ok(());
        };
        ctx.project = ProjectContext::open(dir)?;
        let path = ctx
            .project
            .config_path()
            .ok_or(relief_workspace::WorkspaceError::NoProject)?;
        let mut store = ConfigStore::new();
        store.load(&path)?;
        ctx.project_config = store;
        Ok(())
    }

    fn store<'a>(&self, ctx: &'a mut AppContext) -> &'a mut ConfigStore {
        match self.source() {
            ConfigSource::App => &mut ctx.app_config,
            ConfigSource::Project => &mut ctx.project_config,
        }
    }

    /// Check `value` against the editor field showing `key`, if any
    fn validate(&self, key: &str, value: &str) -> CliResult<()> {
        let everything = AppSettings {
            mode: UiMode::Expert,
            show_tabs: TabSet::Extended,
            ..AppSettings::default()
        };
        let tabs = build_tabs(&everything)?;
        let field = (0..tabs.tab_count())
            .filter_map(|i| tabs.page(i).and_then(|p| p.form()))
            .filter(|form| form.source() == self.source())
            .flat_map(|form| form.fields())
            .find(|field| field.key == key);
        match field {
            Some(field) => Ok(field.validate(value)?),
            None => Ok(()),
        }
    }

    fn list(&self, ctx: &mut AppContext) {
        let style = OutputStyle::default();
        let store = self.store(ctx);
        let title = match store.path() {
            Some(path) => format!("Settings: {}", path.display()),
            None => "Settings".to_string(),
        };
        println!("{}", style.header(&title));
        for key in store.keys() {
            match store.get(&key) {
                Some(value) => println!("{}", style.key_value(&key, &value)),
                None => println!("{}", style.key_value(&key, "{...}")),
            }
        }
    }
}

#[async_trait::async_trait(?Send)]
impl Command for ConfigCommand {
    async fn execute(&self, ctx: &mut AppContext) -> CliResult<()> {
        self.load_project(ctx)?;

        match &self.action {
            ConfigAction::List => {
                self.list(ctx);
                Ok(())
            }
            ConfigAction::Get(key) => match self.store(ctx).get(key) {
                Some(value) => {
                    println!("{value}");
                    Ok(())
                }
                None => Err(CliError::InvalidArgument {
                    message: format!("no setting named `{key}`"),
                }),
            },
            ConfigAction::Set(key, value) => {
                self.validate(key, value)?;
                let store = self.store(ctx);
                store.set(key, value.as_str())?;
                store.save()?;
                println!("{}", OutputStyle::default().success(&format!("{key} = {value}")));
                Ok(())
            }
        }
    }
}
