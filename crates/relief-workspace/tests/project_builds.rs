//! Opening projects and running builds through the tab controller

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use relief_config::{AppSettings, ConfigStore, TabSet, UiMode};
use relief_process::SessionStatus;
use relief_workspace::{
    build_tabs, AppContext, PanelAction, TabController, WorkspaceError, ALWAYS_ENABLED,
};

fn expert_context(viewer: &str) -> AppContext {
    let mut ctx = AppContext::new(ConfigStore::new());
    ctx.settings = AppSettings {
        mode: UiMode::Expert,
        show_tabs: TabSet::Extended,
        viewer: viewer.to_string(),
        ..AppSettings::default()
    };
    ctx
}

fn open(dir: &Path, ctx: &mut AppContext) -> TabController {
    let mut tabs = build_tabs(&ctx.settings).unwrap();
    assert!(tabs.open_project(dir, ALWAYS_ENABLED, ctx).unwrap());
    tabs
}

/// Drive the supervisor until the active build finishes
async fn run_to_completion(tabs: &mut TabController, ctx: &mut AppContext) {
    while let Some(event) = ctx.supervisor.pump().await {
        tabs.route_event(&event);
        if !ctx.supervisor.is_running() {
            break;
        }
    }
}

#[test]
fn test_open_creates_project_config_and_enables_tabs() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = expert_context("echo");
    let tabs = open(dir.path(), &mut ctx);

    let name = dir.path().file_name().unwrap().to_string_lossy().into_owned();
    assert!(dir.path().join(format!("{name}_relief.cfg")).is_file());
    assert!(tabs.descriptors().iter().all(|d| d.enabled));
    assert_eq!(ctx.project_config.get("QUIET").as_deref(), Some("-q"));
}

#[test]
fn test_broken_project_config_keeps_tabs_locked() {
    let dir = tempfile::tempdir().unwrap();
    let name = dir.path().file_name().unwrap().to_string_lossy().into_owned();
    fs::write(dir.path().join(format!("{name}_relief.cfg")), "QUIET: [oops").unwrap();

    let mut ctx = expert_context("echo");
    let mut tabs = build_tabs(&ctx.settings).unwrap();
    assert!(!tabs.open_project(dir.path(), ALWAYS_ENABLED, &mut ctx).unwrap());
    assert_eq!(ctx.project.status(), "Project File error");

    let descriptors = tabs.descriptors();
    assert!(descriptors[0].enabled);
    assert!(!descriptors[1].enabled);
    assert!(descriptors.last().unwrap().enabled);
    assert!(matches!(
        tabs.switch_to(2, &mut ctx),
        Err(WorkspaceError::Disabled(_))
    ));
}

#[test]
fn test_edits_are_saved_on_tab_exit() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = expert_context("echo");
    let mut tabs = open(dir.path(), &mut ctx);

    let misc = tabs.index_of("Misc").unwrap();
    tabs.switch_to(misc, &mut ctx).unwrap();
    tabs.edit("Misc", "EDGE", "-co TILED=YES", &mut ctx).unwrap();
    tabs.switch_to(0, &mut ctx).unwrap();

    let mut reloaded = ConfigStore::new();
    reloaded.load(ctx.project.config_path().unwrap()).unwrap();
    assert_eq!(reloaded.get("EDGE").as_deref(), Some("-co TILED=YES"));
}

#[tokio::test]
async fn test_view_runs_viewer_and_reports_success() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = expert_context("echo");
    let mut tabs = open(dir.path(), &mut ctx);

    let id = tabs
        .trigger("Hillshade", PanelAction::View, &mut ctx)
        .unwrap()
        .unwrap();
    assert!(ctx.supervisor.is_running());
    assert!(matches!(
        tabs.trigger("Create", PanelAction::Make, &mut ctx),
        Err(WorkspaceError::Process(_))
    ));

    run_to_completion(&mut tabs, &mut ctx).await;

    let index = tabs.index_of("Hillshade").unwrap();
    let panel = tabs.page(index).and_then(|p| p.preview()).unwrap();
    assert_eq!(panel.session(), Some(id));
    assert!(!panel.has_error());
    assert!(panel.log().trim_end().ends_with("hillshade.tif"));
    assert_eq!(
        ctx.supervisor.session().map(|s| s.status()),
        Some(SessionStatus::Succeeded)
    );

    let create = tabs.index_of("Create").unwrap();
    assert!(tabs.page(create).and_then(|p| p.preview()).unwrap().log().is_empty());
}

#[tokio::test]
async fn test_failed_build_sets_error_indicator() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = expert_context("false");
    let mut tabs = open(dir.path(), &mut ctx);

    tabs.trigger("Color", PanelAction::View, &mut ctx).unwrap();
    run_to_completion(&mut tabs, &mut ctx).await;

    let index = tabs.index_of("Color").unwrap();
    let panel = tabs.page(index).and_then(|p| p.preview()).unwrap();
    assert!(panel.has_error());
    assert_eq!(panel.last_outcome().map(|o| o.status), Some(SessionStatus::Failed));
    assert!(panel.failure_details().is_some());

    // The rest of the workspace stays usable
    tabs.switch_to(0, &mut ctx).unwrap();
    assert!(!ctx.supervisor.is_running());
}

#[tokio::test]
async fn test_cancel_only_from_owning_panel() {
    let dir = tempfile::tempdir().unwrap();
    let viewer = dir.path().join("slow-viewer");
    fs::write(&viewer, "#!/bin/sh\nsleep 30\n").unwrap();
    fs::set_permissions(&viewer, fs::Permissions::from_mode(0o755)).unwrap();

    let mut ctx = expert_context(&viewer.to_string_lossy());
    let mut tabs = open(dir.path(), &mut ctx);

    let id = tabs
        .trigger("Create", PanelAction::View, &mut ctx)
        .unwrap()
        .unwrap();

    let create = tabs.index_of("Create").unwrap();
    let owner = tabs.page(create).and_then(|p| p.preview()).unwrap();
    assert!(owner.is_action_enabled(PanelAction::Cancel, &ctx));
    assert!(!owner.is_action_enabled(PanelAction::Make, &ctx));

    let color = tabs.index_of("Color").unwrap();
    let other = tabs.page(color).and_then(|p| p.preview()).unwrap();
    assert!(!other.is_action_enabled(PanelAction::Cancel, &ctx));
    assert_eq!(tabs.trigger("Color", PanelAction::Cancel, &mut ctx).unwrap(), None);
    assert!(ctx.supervisor.is_running());

    assert_eq!(
        tabs.trigger("Create", PanelAction::Cancel, &mut ctx).unwrap(),
        Some(id)
    );
    run_to_completion(&mut tabs, &mut ctx).await;

    assert_eq!(
        ctx.supervisor.session().map(|s| s.status()),
        Some(SessionStatus::Cancelled)
    );
    let owner = tabs.page(create).and_then(|p| p.preview()).unwrap();
    assert_eq!(owner.status(), "view cancelled");
    assert!(!owner.has_error());
}

#[tokio::test]
async fn test_rejected_start_leaves_owner_and_settings_alone() {
    let dir = tempfile::tempdir().unwrap();
    let viewer = dir.path().join("slow-viewer");
    fs::write(&viewer, "#!/bin/sh\nsleep 30\n").unwrap();
    fs::set_permissions(&viewer, fs::Permissions::from_mode(0o755)).unwrap();

    let mut ctx = expert_context(&viewer.to_string_lossy());
    let mut tabs = open(dir.path(), &mut ctx);
    let id = tabs
        .trigger("Create", PanelAction::View, &mut ctx)
        .unwrap()
        .unwrap();

    let config_path = ctx.project.config_path().unwrap();
    let saved = fs::read_to_string(&config_path).unwrap();
    ctx.project_config.set("QUIET", "").unwrap();

    let create = tabs.index_of("Create").unwrap();
    let color = tabs.index_of("Color").unwrap();
    let owner_status = tabs.page(create).and_then(|p| p.preview()).unwrap().status().to_string();

    for tab in ["Create", "Color"] {
        let err = tabs.trigger(tab, PanelAction::View, &mut ctx).unwrap_err();
        assert!(matches!(
            err,
            WorkspaceError::Process(relief_process::ProcessError::AlreadyRunning { active }) if active == id
        ));
    }

    assert_eq!(fs::read_to_string(&config_path).unwrap(), saved);
    assert!(ctx.project_config.is_dirty());

    let owner = tabs.page(create).and_then(|p| p.preview()).unwrap();
    assert_eq!(owner.status(), owner_status);
    assert!(!owner.has_error());
    assert_eq!(owner.failure_details(), None);

    let other = tabs.page(color).and_then(|p| p.preview()).unwrap();
    assert!(other.has_error());
    assert!(other.status().starts_with("A build is already running"));

    assert!(tabs.trigger("Create", PanelAction::Cancel, &mut ctx).unwrap().is_some());
    run_to_completion(&mut tabs, &mut ctx).await;
}
