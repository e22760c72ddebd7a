//! Concrete editor pages

mod build;
mod project;
mod settings;

pub use build::BuildPage;
pub use project::ProjectPage;
pub use settings::SettingsPage;
