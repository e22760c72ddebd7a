//! Color relief configuration
//!
//! YAML-backed key/value stores for the application settings and for each
//! project, plus the typed [`AppSettings`] view and the recovery path that
//! recreates a missing or broken settings file from built-in defaults.

pub mod error;
pub mod settings;
pub mod store;

pub use error::{ConfigError, Result};
pub use settings::{
    app_files_path, create_file_from_default, load_app_config, load_or_create, AppSettings,
    TabSet, UiMode, APP_CONFIG_NAME, DEFAULT_APP_CONFIG, DEFAULT_PROJECT_CONFIG,
};
pub use store::ConfigStore;
