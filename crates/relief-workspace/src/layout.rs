//! Which tabs exist for the current settings and what each one edits

use relief_config::{AppSettings, TabSet, UiMode};

use crate::controller::TabController;
use crate::error::Result;
use crate::form::{ConfigForm, ConfigSource, FieldDef};
use crate::pages::{BuildPage, ProjectPage, SettingsPage};
use crate::panel::{PanelAction, PreviewPanel};

pub const PROJECT_TAB: &str = "Project";
pub const ELEVATION_TAB: &str = "Elevation Files";
pub const HILLSHADE_TAB: &str = "Hillshade";
pub const COLOR_TAB: &str = "Color";
pub const CREATE_TAB: &str = "Create";
pub const CONTOUR_TAB: &str = "Contour";
pub const MISC_TAB: &str = "Misc";
pub const SETTINGS_TAB: &str = "Settings";

/// Tabs reachable before a project is open, besides the first
pub const ALWAYS_ENABLED: &[&str] = &[SETTINGS_TAB];

/// `--calc=` expression that references both layers `A` and `B`
const MERGE_CALC_PATTERN: &str = r"^--calc=([^ ]*A[^ ]*B|[^ ]*B[^ ]*A)[^ ]*$";

const BASIC_TABS: [&str; 5] = [PROJECT_TAB, ELEVATION_TAB, HILLSHADE_TAB, COLOR_TAB, CREATE_TAB];

pub fn tab_names(settings: &AppSettings) -> Vec<&'static str> {
    let mut names = BASIC_TABS.to_vec();
    if settings.mode == UiMode::Expert && settings.show_tabs == TabSet::Extended {
        names.extend([CONTOUR_TAB, MISC_TAB, SETTINGS_TAB]);
    }
    names
}

/// Controller with every tab for `settings`, all but the first disabled
/// until a project opens
pub fn build_tabs(settings: &AppSettings) -> Result<TabController> {
    let mode = settings.mode;
    let project_form = |fields| ConfigForm::new(ConfigSource::Project, fields, mode);
    let build_actions = [PanelAction::Make, PanelAction::View, PanelAction::Cancel];

    let mut tabs = TabController::new();
    for name in tab_names(settings) {
        match name {
            PROJECT_TAB => tabs.add_tab(Box::new(ProjectPage::new(name)))?,
            ELEVATION_TAB => tabs.add_tab(Box::new(SettingsPage::new(
                name,
                project_form(vec![
                    FieldDef::text("NAMES.elevation", "Layer"),
                    FieldDef::text("FILES.elevation", "Elevation Files"),
                    FieldDef::text("WARP1", "CRS").expert(),
                    FieldDef::text("WARP2", "gdalwarp").expert(),
                    FieldDef::text("WARP3", "Resampling").expert(),
                    FieldDef::text("WARP4", "Output Type").expert(),
                ]),
            )))?,
            HILLSHADE_TAB => tabs.add_tab(Box::new(BuildPage::new(
                name,
                project_form(vec![
                    FieldDef::choice(
                        "HILLSHADE1",
                        "Shading",
                        &["-igor", "-alg Horn", "-alg ZevenbergenThorne", "-combined", "-multidirectional"],
                    )
                    .expert(),
                    FieldDef::pattern("HILLSHADE2", "Z Factor", r"^(-z \d+(\.\d+)?)?$")?,
                    FieldDef::text("HILLSHADE3", "Other").expert(),
                ]),
                PreviewPanel::new(name, "hillshade", build_actions),
            )))?,
            COLOR_TAB => tabs.add_tab(Box::new(BuildPage::new(
                name,
                project_form(vec![FieldDef::read_only("NAMES.color", "Layer").expert()]),
                PreviewPanel::new(name, "color", build_actions),
            )))?,
            CREATE_TAB => tabs.add_tab(Box::new(BuildPage::new(
                name,
                project_form(vec![
                    FieldDef::read_only("NAMES.relief", "Layer").expert(),
                    FieldDef::pattern("MERGE_CALC", "Calc", MERGE_CALC_PATTERN)?.expert(),
                    FieldDef::text("PUBLISH", "Publish To"),
                    FieldDef::choice("QUIET", "Quiet Mode", &["-q", " ", "--version"]).expert(),
                ]),
                PreviewPanel::new(name, "relief", PanelAction::ALL),
            )))?,
            CONTOUR_TAB => tabs.add_tab(Box::new(BuildPage::new(
                name,
                project_form(vec![FieldDef::pattern(
                    "CONTOUR1",
                    "Interval",
                    r"^-i \d+(\.\d+)?$",
                )?]),
                PreviewPanel::new(
                    name,
                    "contour",
                    [PanelAction::Make, PanelAction::View, PanelAction::Cancel, PanelAction::Clean],
                ),
            )))?,
            MISC_TAB => tabs.add_tab(Box::new(SettingsPage::new(
                name,
                project_form(vec![FieldDef::text("EDGE", "Creation Options")]),
            )))?,
            _ => tabs.add_tab(Box::new(SettingsPage::new(
                name,
                ConfigForm::new(
                    ConfigSource::App,
                    vec![
                        FieldDef::choice("MODE", "Mode", &["basic", "expert"]),
                        FieldDef::choice("SHOW_TABS", "Tabs", &["normal", "extended"]),
                        FieldDef::choice("VERBOSE", "Verbose", &["0", "1", "2", "3"]),
                        FieldDef::pattern("FONT_SIZE", "Font Size", r"^\d{1,2}$")?,
                        FieldDef::choice("INSTRUCTIONS", "Instructions", &["show", "hide"]),
                        FieldDef::text("VIEWER", "Image Viewer"),
                    ],
                    mode,
                ),
            )))?,
        };
    }

    tabs.set_availability(false, ALWAYS_ENABLED);
    Ok(tabs)
}
