//! Handler tests against a real config file in a temp directory.

use srvman_cli::handlers;
use srvman_cli::{CliConfig, CliContext, CliError, bootstrap};
use srvman_core::SupervisorSettings;
use std::fs;
use std::path::Path;
use tempfile::{TempDir, tempdir};

fn context() -> (CliContext, TempDir) {
    let temp = tempdir().unwrap();
    let ctx = bootstrap(CliConfig {
        config_path: temp.path().join("servers_config.json"),
        settings: SupervisorSettings::default(),
    })
    .unwrap();
    (ctx, temp)
}

fn saved_names(path: &Path) -> Vec<String> {
    let document: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    document["servers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_add_persists_and_lists() {
    let (ctx, temp) = context();
    let dir = temp.path().join("survival");
    fs::create_dir(&dir).unwrap();

    handlers::add::execute(&ctx, "survival", &dir, "server.jar", 4, false)
        .await
        .unwrap();
    handlers::add::execute(&ctx, "lobby", &dir, "velocity.jar", 1, true)
        .await
        .unwrap();

    assert_eq!(saved_names(&ctx.config_path), vec!["survival", "lobby"]);
    handlers::list::execute(&ctx, false).await.unwrap();
    handlers::list::execute(&ctx, true).await.unwrap();
    handlers::show::execute(&ctx, "lobby", false).await.unwrap();
}

#[tokio::test]
async fn test_duplicate_add_is_argument_error() {
    let (ctx, temp) = context();
    handlers::add::execute(&ctx, "survival", temp.path(), "server.jar", 4, false)
        .await
        .unwrap();

    let err = handlers::add::execute(&ctx, "survival", temp.path(), "other.jar", 2, false)
        .await
        .unwrap_err();
    let cli_err = err.downcast_ref::<CliError>().unwrap();
    assert_eq!(cli_err.exit_code(), 2);
}

#[tokio::test]
async fn test_remove_and_missing_server() {
    let (ctx, temp) = context();
    handlers::add::execute(&ctx, "survival", temp.path(), "server.jar", 4, false)
        .await
        .unwrap();

    handlers::remove::execute(&ctx, "survival").await.unwrap();
    assert!(saved_names(&ctx.config_path).is_empty());

    let err = handlers::remove::execute(&ctx, "survival").await.unwrap_err();
    assert!(matches!(err.downcast_ref::<CliError>(), Some(CliError::NotFound(_))));

    let err = handlers::show::execute(&ctx, "survival", true).await.unwrap_err();
    assert_eq!(err.downcast_ref::<CliError>().unwrap().exit_code(), 66);
}

#[tokio::test]
async fn test_reload_sees_saved_servers() {
    let (ctx, temp) = context();
    handlers::add::execute(&ctx, "survival", temp.path(), "server.jar", 4, false)
        .await
        .unwrap();

    let reloaded = bootstrap(CliConfig {
        config_path: ctx.config_path.clone(),
        settings: SupervisorSettings::default(),
    })
    .unwrap();
    assert_eq!(reloaded.load_report.loaded, 1);
    let server = reloaded.supervisor().server("survival").await.unwrap();
    assert_eq!(server.max_heap_gib, 4);
    assert_eq!(server.working_directory, temp.path());
}
