//! # relief-workspace
//!
//! The editor's tabs and the panels that drive builds.
//!
//! A [`TabController`] owns the ordered [`TabPage`]s and sequences their
//! enter/exit hooks. Pages share one [`AppContext`] holding settings, the
//! project config and the [`relief_process::BuildSupervisor`]. Build pages
//! own a [`PreviewPanel`] that maps actions (make, view, publish, cancel,
//! clean) to build targets and mirrors the events of the sessions it started.
//!
//! ```rust,no_run
//! use relief_config::{load_app_config, app_files_path, APP_CONFIG_NAME};
//! use relief_workspace::{build_tabs, AppContext, PanelAction, ALWAYS_ENABLED};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut ctx = AppContext::new(load_app_config(&app_files_path(APP_CONFIG_NAME)));
//! let mut tabs = build_tabs(&ctx.settings)?;
//!
//! if tabs.open_project("/data/alps", ALWAYS_ENABLED, &mut ctx)? {
//!     tabs.trigger("Create", PanelAction::Make, &mut ctx)?;
//!     while let Some(event) = ctx.supervisor.pump().await {
//!         tabs.route_event(&event);
//!         if !ctx.supervisor.is_running() {
//!             break;
//!         }
//!     }
//! }
//! tabs.close(&mut ctx);
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod controller;
pub mod error;
pub mod form;
pub mod layout;
pub mod page;
pub mod pages;
pub mod panel;

pub use context::{AppContext, ProjectContext};
pub use controller::{TabController, TabDescriptor};
pub use error::{Result, WorkspaceError};
pub use form::{ConfigForm, ConfigSource, FieldKind, FieldDef};
pub use layout::{build_tabs, tab_names, ALWAYS_ENABLED};
pub use page::TabPage;
pub use panel::{PanelAction, PreviewPanel};
