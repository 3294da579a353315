//! Process handle behaviour against real child processes.
#![cfg(unix)]

mod common;

use common::{ECHO_SERVER, STUBBORN_SERVER, eventually, fake_java};
use srvman_core::{LogSource, ProcessError, ServerDescriptor};
use srvman_runtime::{LogStream, ProcessHandle, StartOutcome, StopOutcome};
use std::sync::Arc;
use std::time::Duration;
use tempfile::{TempDir, tempdir};
use tokio_util::sync::CancellationToken;

struct Fixture {
    _temp: TempDir,
    dir: std::path::PathBuf,
    handle: ProcessHandle,
    logs: Arc<LogStream>,
}

impl Fixture {
    fn new(script: &str, stop_timeout: Duration) -> Self {
        let temp = tempdir().unwrap();
        let dir = temp.path().canonicalize().unwrap();
        let java = fake_java(&dir, script);
        let descriptor = ServerDescriptor::new("survival", &dir, "server.jar", 4);
        Self {
            handle: ProcessHandle::new(descriptor, java.to_string_lossy(), stop_timeout),
            logs: Arc::new(LogStream::new()),
            dir,
            _temp: temp,
        }
    }

    fn start(&mut self) -> StartOutcome {
        let (sink, rx) = LogStream::channel("survival");
        let outcome = self.handle.start(sink).unwrap();
        self.logs.spawn_drain(rx, CancellationToken::new());
        outcome
    }

    fn lines(&self) -> Vec<String> {
        self.logs
            .history("survival")
            .into_iter()
            .map(|e| e.line)
            .collect()
    }

    fn count(&self, needle: &str) -> usize {
        self.lines().iter().filter(|l| l.contains(needle)).count()
    }
}

#[tokio::test]
async fn survival_launch_contract() {
    let mut fx = Fixture::new(ECHO_SERVER, Duration::from_secs(5));
    let outcome = fx.start();
    assert!(matches!(outcome, StartOutcome::Started { .. }));
    assert!(fx.handle.is_running());

    assert!(eventually(|| fx.count("Starting minecraft server") == 1).await);
    assert!(eventually(|| fx.count("cwd:") == 1).await);

    let lines = fx.lines();
    assert!(lines.contains(&"args: -Xms1G -Xmx4G -jar server.jar nogui".to_string()));
    assert!(lines.contains(&format!("cwd: {}", fx.dir.display())));

    fx.handle.stop().await;
}

#[tokio::test]
async fn stderr_is_captured_and_tagged() {
    let mut fx = Fixture::new(ECHO_SERVER, Duration::from_secs(5));
    fx.start();

    assert!(
        eventually(|| {
            fx.logs
                .history("survival")
                .iter()
                .any(|e| e.source == LogSource::Stderr && e.line == "warming up")
        })
        .await
    );
    fx.handle.stop().await;
}

#[tokio::test]
async fn start_then_stop_goes_quiet() {
    let mut fx = Fixture::new(ECHO_SERVER, Duration::from_secs(5));
    fx.start();
    assert!(eventually(|| fx.count("Starting minecraft server") == 1).await);

    let outcome = fx.handle.stop().await;
    assert!(matches!(outcome, StopOutcome::Stopped(_)));
    assert!(!fx.handle.is_running());
    assert!(fx.handle.exit_status().is_some());

    tokio::time::sleep(Duration::from_millis(300)).await;
    let settled = fx.logs.len("survival");
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(fx.logs.len("survival"), settled);
}

#[tokio::test]
async fn double_start_keeps_one_child() {
    let mut fx = Fixture::new(ECHO_SERVER, Duration::from_secs(5));
    let first = fx.start();
    let (sink, mut rx) = LogStream::channel("survival");
    let second = fx.handle.start(sink).unwrap();

    assert_eq!(second, StartOutcome::AlreadyRunning { pid: first.pid() });
    let notice = rx.try_recv().unwrap();
    assert_eq!(notice.source, LogSource::System);
    assert!(notice.line.contains("already running"));

    assert!(eventually(|| fx.count("cwd:") == 1).await);
    assert_eq!(fx.count("Starting minecraft server"), 1);
    fx.handle.stop().await;
}

#[tokio::test]
async fn commands_reach_stdin_and_are_echoed() {
    let mut fx = Fixture::new(ECHO_SERVER, Duration::from_secs(5));
    fx.start();

    fx.handle.send_command("say hello").await.unwrap();
    assert!(eventually(|| fx.count("> say hello") == 1).await);
    assert!(
        fx.logs
            .history("survival")
            .iter()
            .any(|e| e.source == LogSource::Operator && e.line == "say hello")
    );

    // The server exits on its own after `stop`
    fx.handle.send_command("stop").await.unwrap();
    assert!(eventually(|| !fx.handle.is_running()).await);
    let exit = fx.handle.reap().unwrap();
    assert!(exit.success);

    let err = fx.handle.send_command("list").await.unwrap_err();
    assert!(matches!(err, ProcessError::NotRunning(_)));
    assert_eq!(fx.handle.stop().await, StopOutcome::NotRunning);
}

#[tokio::test]
async fn stubborn_server_is_killed_after_timeout() {
    let mut fx = Fixture::new(STUBBORN_SERVER, Duration::from_secs(1));
    fx.start();
    assert!(eventually(|| fx.count("ready") == 1).await);

    let outcome = fx.handle.stop().await;
    assert!(matches!(outcome, StopOutcome::Killed(ref exit) if !exit.success));
    assert!(!fx.handle.is_running());
    assert!(eventually(|| fx.count("was killed") == 1).await);
}

#[tokio::test]
async fn restart_after_stop() {
    let mut fx = Fixture::new(ECHO_SERVER, Duration::from_secs(5));
    let first = fx.start();
    fx.handle.stop().await;

    let second = fx.start();
    assert!(matches!(second, StartOutcome::Started { .. }));
    assert_ne!(first.pid(), second.pid());
    assert!(eventually(|| fx.count("Starting minecraft server") == 2).await);
    fx.handle.stop().await;
}
