//! Shared helpers for process tests: shell scripts standing in for `java`.
#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// Prints a banner, its arguments and cwd, then echoes stdin until `stop`.
pub const ECHO_SERVER: &str = r#"
echo "Starting minecraft server version 1.20.4"
echo "args: $*"
echo "cwd: $(pwd -P)"
echo "warming up" >&2
while IFS= read -r line; do
  echo "> $line"
  if [ "$line" = "stop" ]; then
    echo "Stopping server"
    exit 0
  fi
done
"#;

/// Ignores SIGTERM so only SIGKILL ends it.
pub const STUBBORN_SERVER: &str = r#"
trap '' TERM
echo "ready"
while true; do sleep 0.1; done
"#;

/// Never reads stdin, so writes stall once the pipe buffer is full.
pub const DEAF_SERVER: &str = r#"
echo "ready"
exec sleep 60
"#;

/// Write an executable `sh` script into `dir` and return its path.
pub fn fake_java(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-java.sh");
    fs::write(&path, format!("#!/bin/sh\n{body}")).expect("write script");
    let mut perms = fs::metadata(&path).expect("script metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("chmod script");
    path
}

/// Poll `check` until it holds or ten seconds pass.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        sleep(Duration::from_millis(20)).await;
    }
    check()
}
