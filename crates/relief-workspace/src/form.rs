//! Editable views over a config store

use regex::Regex;
use relief_config::{ConfigStore, UiMode};
use tracing::debug;

use crate::context::AppContext;
use crate::error::{Result, WorkspaceError};

/// Which store a form edits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    App,
    Project,
}

/// How a field may be edited
#[derive(Debug, Clone)]
pub enum FieldKind {
    Text,
    ReadOnly,
    Choice(Vec<String>),
    Pattern(Regex),
}

/// One editable setting
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub key: String,
    pub label: String,
    pub kind: FieldKind,
    /// Only shown in expert mode
    pub expert: bool,
}

impl FieldDef {
    pub fn text(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind: FieldKind::Text,
            expert: false,
        }
    }

    pub fn read_only(key: &str, label: &str) -> Self {
        Self {
            kind: FieldKind::ReadOnly,
            ..Self::text(key, label)
        }
    }

    pub fn choice(key: &str, label: &str, options: &[&str]) -> Self {
        Self {
            kind: FieldKind::Choice(options.iter().map(|o| o.to_string()).collect()),
            ..Self::text(key, label)
        }
    }

    /// A free-text field whose value must match `pattern`
    pub fn pattern(key: &str, label: &str, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| WorkspaceError::InvalidField {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            kind: FieldKind::Pattern(regex),
            ..Self::text(key, label)
        })
    }

    pub fn expert(mut self) -> Self {
        self.expert = true;
        self
    }

    pub fn validate(&self, value: &str) -> Result<()> {
        let invalid = |reason: String| WorkspaceError::InvalidField {
            key: self.key.clone(),
            reason,
        };
        match &self.kind {
            FieldKind::Text => Ok(()),
            FieldKind::ReadOnly => Err(invalid("field is read-only".to_string())),
            FieldKind::Choice(options) => {
                if options.iter().any(|o| o == value) {
                    Ok(())
                } else {
                    Err(invalid(format!("expected one of: {}", options.join(", "))))
                }
            }
            FieldKind::Pattern(regex) => {
                if regex.is_match(value) {
                    Ok(())
                } else {
                    Err(invalid(format!("`{value}` does not match {}", regex.as_str())))
                }
            }
        }
    }
}

/// Fields shown by a page and their last displayed values
#[derive(Debug, Clone)]
pub struct ConfigForm {
    source: ConfigSource,
    fields: Vec<FieldDef>,
    values: Vec<String>,
}

impl ConfigForm {
    /// Keep the fields visible in `mode`
    pub fn new(source: ConfigSource, fields: Vec<FieldDef>, mode: UiMode) -> Self {
        let fields: Vec<FieldDef> = fields
            .into_iter()
            .filter(|f| mode == UiMode::Expert || !f.expert)
            .collect();
        let values = vec![String::new(); fields.len()];
        Self {
            source,
            fields,
            values,
        }
    }

    pub fn source(&self) -> ConfigSource {
        self.source
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// `(key, value)` pairs as last displayed
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .zip(&self.values)
            .map(|(f, v)| (f.key.as_str(), v.as_str()))
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.position(key).map(|i| self.values[i].as_str())
    }

    /// Re-read every field from its store
    pub fn refresh(&mut self, ctx: &AppContext) {
        let store = self.store(ctx);
        self.values = self
            .fields
            .iter()
            .map(|f| store.get(&f.key).unwrap_or_default())
            .collect();
    }

    /// Validate and write `value` to `key`
    pub fn edit(&mut self, ctx: &mut AppContext, key: &str, value: &str) -> Result<()> {
        let index = self.position(key).ok_or_else(|| WorkspaceError::InvalidField {
            key: key.to_string(),
            reason: "not shown on this tab".to_string(),
        })?;
        self.fields[index].validate(value)?;

        match self.source {
            ConfigSource::App => {
                ctx.app_config.set(key, value)?;
                ctx.refresh_settings();
            }
            ConfigSource::Project => ctx.project_config.set(key, value)?,
        }
        debug!(key, value, "Setting changed");
        self.values[index] = value.to_string();
        Ok(())
    }

    /// Persist the backing store if it changed
    pub fn save(&self, ctx: &mut AppContext) -> Result<()> {
        let store = match self.source {
            ConfigSource::App => &mut ctx.app_config,
            ConfigSource::Project => &mut ctx.project_config,
        };
        if store.is_loaded() && store.is_dirty() {
            store.save()?;
        }
        Ok(())
    }

    fn store<'a>(&self, ctx: &'a AppContext) -> &'a ConfigStore {
        match self.source {
            ConfigSource::App => &ctx.app_config,
            ConfigSource::Project => &ctx.project_config,
        }
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.key == key)
    }
}
