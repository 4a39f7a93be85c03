#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use std::path::Path;
use std::time::Duration;

#[allow(dead_code)]
pub const CMD_TIMEOUT: Duration = Duration::from_secs(30);

/// Create a configured `repokit` command suitable for integration tests.
#[allow(dead_code)]
pub fn repokit_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("repokit"));
    cmd.timeout(CMD_TIMEOUT);
    cmd.env("NO_COLOR", "1");
    cmd.env_remove("GITHUB_TOKEN");
    cmd.env_remove("REPOKIT_GITHUB_API");
    cmd
}

/// Write `content` to `path`, creating parent directories.
#[allow(dead_code)]
pub fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("failed to create parent dir");
    }
    std::fs::write(path, content).expect("failed to write file");
}
