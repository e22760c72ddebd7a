//! Key/value settings store backed by a YAML file
//!
//! Keys are strings; dotted keys (`NAMES.elevation`) address nested
//! mappings. Values are read back as strings regardless of their YAML type so
//! that callers deal with one representation.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};
use tracing::{debug, warn};

use crate::error::{ConfigError, Result};

/// YAML key/value store with a remembered file path and last-error status
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    path: Option<PathBuf>,
    data: Mapping,
    status: String,
    dirty: bool,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a store from YAML text without attaching a file
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(Self {
            data: parse_mapping(text, "<memory>")?,
            ..Self::default()
        })
    }

    /// Replace the contents with the file at `path`.
    ///
    /// On failure the previous contents are kept and the error text is
    /// recorded in [`ConfigStore::status`].
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        match read_mapping(path) {
            Ok(data) => {
                debug!(path = %path.display(), keys = data.len(), "Loaded config");
                self.data = data;
                self.path = Some(path.to_path_buf());
                self.status.clear();
                self.dirty = false;
                Ok(())
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Config load failed");
                self.status = e.to_string();
                Err(e)
            }
        }
    }

    /// Write the contents back to the file they were loaded from
    pub fn save(&mut self) -> Result<()> {
        let path = self.path.clone().ok_or(ConfigError::NoPath)?;
        self.write_to(&path)
    }

    /// Write to `path` and make it the store's file
    pub fn save_as(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        self.write_to(&path)?;
        self.path = Some(path);
        Ok(())
    }

    fn write_to(&mut self, path: &Path) -> Result<()> {
        let result = (|| -> Result<()> {
            let text = serde_yaml::to_string(&self.data)?;
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, text)?;
            Ok(())
        })();

        match result {
            Ok(()) => {
                debug!(path = %path.display(), "Saved config");
                self.dirty = false;
                Ok(())
            }
            Err(e) => {
                self.status = e.to_string();
                Err(e)
            }
        }
    }

    /// Value of `key` rendered as a string; `None` when missing or not a scalar
    pub fn get(&self, key: &str) -> Option<String> {
        self.value(key).and_then(scalar_to_string)
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.value(key).is_some()
    }

    /// Raw YAML value at `key`
    pub fn value(&self, key: &str) -> Option<&Value> {
        let mut parts = key.split('.');
        let mut current = self.data.get(parts.next()?)?;
        for part in parts {
            current = current.as_mapping()?.get(part)?;
        }
        Some(current)
    }

    /// Set `key` to a string value, creating intermediate sections
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(ConfigError::InvalidValue {
                key: key.to_string(),
                reason: "empty key segment".to_string(),
            });
        }
        let Some((last, sections)) = parts.split_last() else {
            return Err(ConfigError::InvalidValue {
                key: key.to_string(),
                reason: "empty key".to_string(),
            });
        };

        let mut map = &mut self.data;
        for section in sections {
            let entry = map
                .entry(Value::String(section.to_string()))
                .or_insert(Value::Mapping(Mapping::new()));
            map = match entry {
                Value::Mapping(inner) => inner,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: key.to_string(),
                        reason: format!("`{section}` is a value, not a section"),
                    })
                }
            };
        }
        map.insert(Value::String(last.to_string()), Value::String(value.into()));
        self.dirty = true;
        Ok(())
    }

    /// Top-level keys whose values are scalars, in file order
    pub fn top_level_scalars(&self) -> Vec<(String, String)> {
        self.data
            .iter()
            .filter_map(|(k, v)| Some((k.as_str()?.to_string(), scalar_to_string(v)?)))
            .collect()
    }

    pub fn keys(&self) -> Vec<String> {
        self.data
            .keys()
            .filter_map(|k| k.as_str().map(str::to_string))
            .collect()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Text of the last load/save error, empty when the last operation succeeded
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn is_loaded(&self) -> bool {
        self.path.is_some()
    }

    /// Whether there are changes not yet saved
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn attach(&mut self, path: PathBuf) {
        self.path = Some(path);
    }
}

fn read_mapping(path: &Path) -> Result<Mapping> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ConfigError::NotFound(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };
    parse_mapping(&text, &path.display().to_string())
}

fn parse_mapping(text: &str, origin: &str) -> Result<Mapping> {
    let parse_error = |message: String| ConfigError::Parse {
        path: origin.to_string(),
        message,
    };
    match serde_yaml::from_str::<Value>(text).map_err(|e| parse_error(e.to_string()))? {
        Value::Mapping(map) => Ok(map),
        Value::Null => Err(parse_error("document is empty".to_string())),
        _ => Err(parse_error("top level must be a mapping".to_string())),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}
