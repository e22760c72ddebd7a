//! The interface every tab implements

use relief_process::SupervisorEvent;

use crate::context::AppContext;
use crate::error::Result;
use crate::form::ConfigForm;
use crate::panel::PreviewPanel;

/// One page of the editor.
///
/// `load` runs when a project is opened; the enter/exit hooks run when the
/// tab gains or loses focus. Pages that own a [`PreviewPanel`] or a
/// [`ConfigForm`] expose them so the controller can route actions and edits.
pub trait TabPage {
    fn name(&self) -> &str;

    /// Load this page's data for the open project
    fn load(&mut self, ctx: &mut AppContext) -> Result<()>;

    fn on_tab_enter(&mut self, _ctx: &mut AppContext) -> Result<()> {
        Ok(())
    }

    fn on_tab_exit(&mut self, _ctx: &mut AppContext) -> Result<()> {
        Ok(())
    }

    /// Supervisor event after it was dispatched
    fn on_build_event(&mut self, event: &SupervisorEvent) {
        if let Some(panel) = self.preview_mut() {
            panel.handle_event(event);
        }
    }

    fn preview(&self) -> Option<&PreviewPanel> {
        None
    }

    fn preview_mut(&mut self) -> Option<&mut PreviewPanel> {
        None
    }

    fn form(&self) -> Option<&ConfigForm> {
        None
    }

    fn form_mut(&mut self) -> Option<&mut ConfigForm> {
        None
    }
}
