//! Command handlers run against temporary settings and projects

use std::fs;

use relief_cli::commands::{BuildCommand, Command, ConfigAction, ConfigCommand, TabsCommand};
use relief_cli::error::CliError;
use relief_config::{load_app_config, ConfigStore};
use relief_workspace::{AppContext, PanelAction};

fn context(dir: &std::path::Path) -> AppContext {
    AppContext::new(load_app_config(&dir.join("relief_editor.cfg")))
}

#[tokio::test]
async fn test_config_set_then_get() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = context(dir.path());

    ConfigCommand::new(ConfigAction::Set("FONT_SIZE".into(), "14".into()), None)
        .execute(&mut ctx)
        .await
        .unwrap();

    let mut saved = ConfigStore::new();
    saved.load(dir.path().join("relief_editor.cfg")).unwrap();
    assert_eq!(saved.get("FONT_SIZE").as_deref(), Some("14"));
}

#[tokio::test]
async fn test_config_set_is_validated() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = context(dir.path());

    let result = ConfigCommand::new(ConfigAction::Set("MODE".into(), "wizard".into()), None)
        .execute(&mut ctx)
        .await;
    assert!(matches!(result, Err(CliError::Workspace(_))));
    assert_eq!(ctx.app_config.get("MODE").as_deref(), Some("basic"));
}

#[tokio::test]
async fn test_config_get_unknown_key() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = context(dir.path());
    let result = ConfigCommand::new(ConfigAction::Get("NOPE".into()), None)
        .execute(&mut ctx)
        .await;
    assert!(matches!(result, Err(CliError::InvalidArgument { .. })));
}

#[tokio::test]
async fn test_build_missing_project() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = context(dir.path());
    let result = BuildCommand::new(dir.path().join("missing"), "Create", PanelAction::Make)
        .execute(&mut ctx)
        .await;
    assert!(matches!(result, Err(CliError::Workspace(_))));
}

#[tokio::test]
async fn test_build_with_broken_project_settings() {
    let dir = tempfile::tempdir().unwrap();
    let project = dir.path().join("alps");
    fs::create_dir(&project).unwrap();
    fs::write(project.join("alps_relief.cfg"), "- not\n- a mapping\n").unwrap();

    let mut ctx = context(dir.path());
    let result = BuildCommand::new(project, "Create", PanelAction::Make)
        .execute(&mut ctx)
        .await;
    match result {
        Err(CliError::Project(status)) => assert_eq!(status, "Project File error"),
        other => panic!("unexpected result {other:?}"),
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_view_runs_viewer() {
    let dir = tempfile::tempdir().unwrap();
    let project = dir.path().join("alps");
    fs::create_dir(&project).unwrap();

    let mut ctx = context(dir.path());
    ctx.settings.viewer = "true".to_string();
    BuildCommand::new(project.clone(), "Create", PanelAction::View)
        .execute(&mut ctx)
        .await
        .unwrap();
    assert!(project.join("alps_relief.cfg").is_file());

    ctx = context(dir.path());
    ctx.settings.viewer = "false".to_string();
    let result = BuildCommand::new(project, "Create", PanelAction::View)
        .execute(&mut ctx)
        .await;
    assert!(matches!(result, Err(CliError::Build(_))));
}

#[tokio::test]
async fn test_tabs_lists_without_project() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = context(dir.path());
    TabsCommand::new(None).execute(&mut ctx).await.unwrap();
}
