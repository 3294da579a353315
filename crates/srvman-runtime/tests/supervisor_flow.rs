//! End-to-end supervisor flows with a fake `java`.
#![cfg(unix)]

mod common;

use common::{DEAF_SERVER, ECHO_SERVER, fake_java};
use srvman_core::ports::socket_introspection::MockSocketIntrospector;
use srvman_core::{JsonConfigStore, LogSource, ServerDescriptor, ServerRegistry, SupervisorSettings};
use srvman_runtime::{ServerEvent, StopOutcome, Supervisor};
use std::sync::Arc;
use std::time::Duration;
use tempfile::{TempDir, tempdir};
use tokio::time::{sleep, timeout};

async fn supervisor() -> (Arc<Supervisor>, TempDir) {
    supervisor_running(ECHO_SERVER, 5).await
}

async fn supervisor_running(script: &str, stop_timeout_secs: u64) -> (Arc<Supervisor>, TempDir) {
    let temp = tempdir().unwrap();
    let dir = temp.path().canonicalize().unwrap();
    let java = fake_java(&dir, script);

    let store = JsonConfigStore::new(dir.join("servers_config.json"));
    let registry = ServerRegistry::new(Arc::new(store));
    let settings = SupervisorSettings {
        java_executable: java.to_string_lossy().into_owned(),
        stop_timeout_secs,
        ..SupervisorSettings::default()
    };
    let supervisor =
        Supervisor::new(registry, Arc::new(MockSocketIntrospector::new()), settings).unwrap();
    supervisor
        .add_server(ServerDescriptor::new("survival", &dir, "server.jar", 4))
        .await
        .unwrap();
    supervisor
        .add_server(ServerDescriptor::new("creative", &dir, "paper.jar", 2))
        .await
        .unwrap();
    (Arc::new(supervisor), temp)
}

async fn wait_for_line(supervisor: &Supervisor, server: &str, needle: &str) -> bool {
    for _ in 0..500 {
        if supervisor
            .history(server)
            .iter()
            .any(|e| e.line.contains(needle))
        {
            return true;
        }
        sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test]
async fn output_stays_with_its_server_across_selection_changes() {
    let (supervisor, _temp) = supervisor().await;

    supervisor.select("survival").await.unwrap();
    supervisor.start_selected().await.unwrap();
    supervisor.select("creative").await.unwrap();
    supervisor.start_selected().await.unwrap();

    supervisor.send("survival", "say to survival").await.unwrap();
    assert!(wait_for_line(&supervisor, "survival", "> say to survival").await);
    assert!(wait_for_line(&supervisor, "creative", "-jar paper.jar").await);

    assert!(
        !supervisor
            .history("creative")
            .iter()
            .any(|e| e.line.contains("say to survival"))
    );
    assert_eq!(supervisor.running().await.len(), 2);

    supervisor.shutdown().await;
    assert!(supervisor.running().await.is_empty());
}

#[tokio::test]
async fn stop_broadcasts_lifecycle_events() {
    let (supervisor, _temp) = supervisor().await;
    let mut events = supervisor.subscribe_events();

    let started = supervisor.start("survival").await.unwrap();
    let outcome = supervisor.stop("survival").await.unwrap();
    assert!(matches!(outcome, StopOutcome::Stopped(_)));

    let mut seen = Vec::new();
    while let Ok(Ok(event)) = timeout(Duration::from_millis(500), events.recv()).await {
        seen.push(event);
    }
    assert!(matches!(&seen[0], ServerEvent::Started { pid, .. } if *pid == started.pid()));
    assert!(matches!(&seen[1], ServerEvent::Stopping { .. }));
    assert!(matches!(&seen[2], ServerEvent::Stopped { forced: false, .. }));
    // An operator stop is not reported as an unexpected exit
    assert!(!seen.iter().any(|e| matches!(e, ServerEvent::Exited { .. })));
}

#[tokio::test]
async fn server_exiting_on_its_own_is_reported() {
    let (supervisor, _temp) = supervisor().await;
    let mut events = supervisor.subscribe_events();

    supervisor.start("survival").await.unwrap();
    supervisor.send("survival", "stop").await.unwrap();

    let exited = timeout(Duration::from_secs(10), async {
        loop {
            if let Ok(ServerEvent::Exited { server, exit }) = events.recv().await {
                return (server, exit);
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(exited.0, "survival");
    assert!(exited.1.success);

    assert!(wait_for_line(&supervisor, "survival", "Process exited").await);
    for _ in 0..100 {
        if !supervisor.is_running("survival").await {
            break;
        }
        sleep(Duration::from_millis(20)).await;
    }
    assert!(!supervisor.is_running("survival").await);

    // Starting again works after a crash
    supervisor.start("survival").await.unwrap();
    supervisor.stop("survival").await.unwrap();
}

#[tokio::test]
async fn double_start_reports_already_running() {
    let (supervisor, _temp) = supervisor().await;

    let first = supervisor.start("survival").await.unwrap();
    let second = supervisor.start("survival").await.unwrap();
    assert_eq!(first.pid(), second.pid());

    let notices: Vec<_> = supervisor
        .history("survival")
        .into_iter()
        .filter(|e| e.source == LogSource::System && e.line.contains("already running"))
        .collect();
    assert_eq!(notices.len(), 1);

    supervisor.stop("survival").await.unwrap();
}

#[tokio::test]
async fn removing_a_running_server_stops_it() {
    let (supervisor, _temp) = supervisor().await;
    supervisor.start("creative").await.unwrap();

    supervisor.remove_server("creative").await.unwrap();
    assert!(supervisor.server("creative").await.is_none());
    assert!(supervisor.running().await.is_empty());
}

#[tokio::test]
async fn stop_is_not_held_up_by_a_stalled_send() {
    let (supervisor, _temp) = supervisor_running(DEAF_SERVER, 2).await;
    supervisor.start("survival").await.unwrap();
    assert!(wait_for_line(&supervisor, "survival", "ready").await);

    // Far more than a pipe buffer holds, with nobody reading
    let sender = Arc::clone(&supervisor);
    let send = tokio::spawn(async move { sender.send("survival", &"x".repeat(300_000)).await });
    sleep(Duration::from_millis(200)).await;
    assert!(!send.is_finished());

    let outcome = timeout(Duration::from_secs(10), supervisor.stop("survival"))
        .await
        .expect("stop waited on the pending send")
        .unwrap();
    assert!(matches!(outcome, StopOutcome::Stopped(_) | StopOutcome::Killed(_)));
    assert!(!supervisor.is_running("survival").await);
    assert!(supervisor.running().await.is_empty());

    // The stalled write fails once the child is gone
    let sent = timeout(Duration::from_secs(5), send).await.unwrap().unwrap();
    assert!(sent.is_err());
}
