//! Application settings, default files and the load-or-recover path
//!
//! # Configuration File Format
//!
//! ```yaml
//! MODE: basic          # basic | expert
//! SHOW_TABS: normal    # normal | extended (expert mode only)
//! VERBOSE: 1           # 0 quiet .. 3 debug
//! FONT_SIZE: 12
//! INSTRUCTIONS: show   # show | hide
//! VIEWER: xdg-open     # program used to open rendered images
//! CANCEL_GRACE_MS: 2000
//! ```
//!
//! `RELIEF_MODE`, `RELIEF_VERBOSE` and `RELIEF_VIEWER` override the file.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ConfigError, Result};
use crate::store::ConfigStore;

/// Directory under the user config dir holding application files
pub const APP_DIR_NAME: &str = "ColorReliefEditor";

/// File name of the application settings
pub const APP_CONFIG_NAME: &str = "relief_editor.cfg";

/// Contents written when the application settings are missing or broken
pub const DEFAULT_APP_CONFIG: &str = include_str!("../resources/relief_editor.cfg");

/// Contents of a freshly created project config
pub const DEFAULT_PROJECT_CONFIG: &str = include_str!("../resources/project_relief.cfg");

/// Editing mode: basic hides expert-only settings and tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UiMode {
    Basic,
    Expert,
}

impl FromStr for UiMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "expert" => Ok(Self::Expert),
            other => Err(ConfigError::InvalidValue {
                key: "MODE".to_string(),
                reason: format!("unknown mode `{other}`"),
            }),
        }
    }
}

impl fmt::Display for UiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Basic => "basic",
            Self::Expert => "expert",
        })
    }
}

/// Which tab set expert mode shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TabSet {
    Normal,
    Extended,
}

impl FromStr for TabSet {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "extended" => Ok(Self::Extended),
            other => Err(ConfigError::InvalidValue {
                key: "SHOW_TABS".to_string(),
                reason: format!("unknown tab set `{other}`"),
            }),
        }
    }
}

/// Typed view over the application [`ConfigStore`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppSettings {
    pub mode: UiMode,
    pub show_tabs: TabSet,
    pub verbose: u8,
    pub font_size: u32,
    pub instructions: bool,
    pub viewer: String,
    #[serde(serialize_with = "serialize_millis")]
    pub cancel_grace: Duration,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            mode: UiMode::Basic,
            show_tabs: TabSet::Normal,
            verbose: 1,
            font_size: 12,
            instructions: true,
            viewer: default_viewer().to_string(),
            cancel_grace: Duration::from_millis(2000),
        }
    }
}

impl AppSettings {
    /// Read settings leniently: a bad value is logged and replaced by its default
    pub fn from_store(store: &ConfigStore) -> Self {
        let defaults = Self::default();
        Self {
            mode: parse_or(store, "MODE", defaults.mode),
            show_tabs: parse_or(store, "SHOW_TABS", defaults.show_tabs),
            verbose: parse_or(store, "VERBOSE", defaults.verbose),
            font_size: parse_or(store, "FONT_SIZE", defaults.font_size),
            instructions: store
                .get("INSTRUCTIONS")
                .map(|v| v.trim() != "hide")
                .unwrap_or(defaults.instructions),
            viewer: store
                .get("VIEWER")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.viewer),
            cancel_grace: Duration::from_millis(parse_or(
                store,
                "CANCEL_GRACE_MS",
                defaults.cancel_grace.as_millis() as u64,
            )),
        }
    }

    /// Apply `RELIEF_*` environment overrides
    pub fn apply_env_overrides(mut self) -> Self {
        if let Ok(mode) = std::env::var("RELIEF_MODE") {
            match mode.parse() {
                Ok(mode) => self.mode = mode,
                Err(e) => warn!(error = %e, "Ignoring RELIEF_MODE"),
            }
        }
        if let Ok(verbose) = std::env::var("RELIEF_VERBOSE") {
            match verbose.trim().parse() {
                Ok(level) => self.verbose = level,
                Err(e) => warn!(error = %e, "Ignoring RELIEF_VERBOSE"),
            }
        }
        if let Ok(viewer) = std::env::var("RELIEF_VIEWER") {
            if !viewer.trim().is_empty() {
                self.viewer = viewer;
            }
        }
        self
    }

    /// Log filter matching the verbosity level (0 error .. 3 debug)
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "error",
            1 => "warn",
            2 => "info",
            _ => "debug",
        }
    }
}

fn parse_or<T>(store: &ConfigStore, key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match store.get(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(e) => {
                warn!(key, value = %raw, error = %e, "Invalid setting, using default");
                default
            }
        },
    }
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

fn default_viewer() -> &'static str {
    if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(windows) {
        "explorer"
    } else {
        "xdg-open"
    }
}

/// Path of an application file inside the user's config directory
pub fn app_files_path(name: &str) -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join(name)
}

/// Write `contents` to `path`, creating parent directories
pub fn create_file_from_default(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(())
}

/// Load `path`, recreating it from `defaults` when it is missing or unreadable.
///
/// Never fails: if even the recreated file cannot be used, the defaults are
/// kept in memory (still attached to `path`) and the store's status explains
/// what went wrong. A broken file is preserved as `<path>.bak`.
pub fn load_or_create(path: &Path, defaults: &str) -> ConfigStore {
    let mut store = ConfigStore::new();
    let failure = match store.load(path) {
        Ok(()) => return store,
        Err(e) => e,
    };

    info!(path = %path.display(), reason = %failure, "Creating default config");
    if !matches!(failure, ConfigError::NotFound(_)) {
        let backup = path.with_extension("cfg.bak");
        if let Err(e) = fs::rename(path, &backup) {
            warn!(path = %path.display(), error = %e, "Could not back up broken config");
        }
    }

    let recovered = create_file_from_default(path, defaults).and_then(|()| store.load(path));
    if let Err(e) = recovered {
        warn!(path = %path.display(), error = %e, "Error creating default config");
        store = ConfigStore::from_yaml(defaults).unwrap_or_default();
        store.attach(path.to_path_buf());
        store.set_status(format!("Using built-in defaults: {e}"));
    } else {
        store.set_status(format!("Created default config ({failure})"));
    }
    store
}

/// Load the application settings file, recovering with defaults
pub fn load_app_config(path: &Path) -> ConfigStore {
    load_or_create(path, DEFAULT_APP_CONFIG)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_parse() {
        let store = ConfigStore::from_yaml(DEFAULT_APP_CONFIG).unwrap();
        let settings = AppSettings::from_store(&store);
        assert_eq!(settings.mode, UiMode::Basic);
        assert_eq!(settings.show_tabs, TabSet::Normal);
        assert_eq!(settings.verbose, 1);
        assert_eq!(settings.cancel_grace, Duration::from_secs(2));
        assert!(settings.instructions);

        assert!(ConfigStore::from_yaml(DEFAULT_PROJECT_CONFIG).is_ok());
    }

    #[test]
    fn test_bad_values_fall_back() {
        let store =
            ConfigStore::from_yaml("MODE: wizard\nVERBOSE: loud\nSHOW_TABS: extended\n").unwrap();
        let settings = AppSettings::from_store(&store);
        assert_eq!(settings.mode, UiMode::Basic);
        assert_eq!(settings.verbose, 1);
        assert_eq!(settings.show_tabs, TabSet::Extended);
    }

    #[test]
    fn test_log_level_mapping() {
        let mut settings = AppSettings::default();
        settings.verbose = 0;
        assert_eq!(settings.log_level(), "error");
        settings.verbose = 2;
        assert_eq!(settings.log_level(), "info");
        settings.verbose = 9;
        assert_eq!(settings.log_level(), "debug");
    }

    #[test]
    fn test_app_files_path_is_namespaced() {
        let path = app_files_path(APP_CONFIG_NAME);
        assert!(path.ends_with(Path::new(APP_DIR_NAME).join(APP_CONFIG_NAME)));
    }
}
