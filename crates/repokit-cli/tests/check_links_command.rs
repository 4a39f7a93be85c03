#![allow(missing_docs, clippy::expect_used, clippy::unwrap_used)]

mod common;

use common::{repokit_cmd, write_file};
use predicates::prelude::*;
use serde_json::Value;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn html_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html"))
        .mount(server)
        .await;
}

async fn broken_site() -> MockServer {
    let server = MockServer::start().await;
    html_page(
        &server,
        "/",
        r#"<h1 id="top">Home</h1>
           <a href="/guide">Guide</a>
           <a href="/gone">Gone</a>"#,
    )
    .await;
    html_page(&server, "/guide", r##"<a href="/#top">Home</a>"##).await;
    server
}

#[tokio::test]
async fn check_links_reports_broken_links_with_exit_code_8() {
    let server = broken_site().await;

    repokit_cmd()
        .args(["check-links", "--host", &server.uri()])
        .assert()
        .code(8)
        .stdout(predicate::str::contains("Broken links on /:"))
        .stdout(predicate::str::contains("  [broken-link] /gone (\"Gone\"): Page returned status 404"))
        .stdout(predicate::str::contains("1 broken-link, 0 broken-target"))
        .stderr(predicate::str::contains("found 1 broken links and 0 broken targets"));
}

#[tokio::test]
async fn check_links_clean_site_succeeds() {
    let server = broken_site().await;

    repokit_cmd()
        .args(["check-links", "--host", &server.uri(), "--ignore-path", "^/gone$"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 broken-link, 0 broken-target"))
        .stderr(predicate::str::contains("No broken links found"));
}

#[tokio::test]
async fn check_links_json_output_lists_issues() {
    let server = broken_site().await;

    let output = repokit_cmd()
        .args(["check-links", "--host", &server.uri(), "--format", "json"])
        .output()
        .expect("run repokit");
    assert_eq!(output.status.code(), Some(8));

    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    let issues = value["issues"].as_array().expect("issues array");
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0]["type"], "broken-link");
    assert_eq!(issues[0]["link"]["href"], "/gone");
    assert_eq!(value["pages"]["/guide"]["status"], 200);
}

#[tokio::test]
async fn check_links_reads_config_file_and_writes_manifest() {
    let server = broken_site().await;
    let dir = tempdir().unwrap();
    write_file(
        &dir.path().join("link-check.toml"),
        &format!(
            "host = \"{}\"\nignoredPaths = [\"^/gone$\"]\noutPath = \"out/link-structure.json\"\n",
            server.uri()
        ),
    );

    repokit_cmd()
        .current_dir(dir.path())
        .args(["-q", "check-links", "--config", "link-check.toml"])
        .assert()
        .success();

    let manifest = std::fs::read_to_string(dir.path().join("out/link-structure.json")).unwrap();
    let manifest: Value = serde_json::from_str(&manifest).unwrap();
    let home = manifest["targets"]["/"].as_array().expect("targets of /");
    assert!(home.iter().any(|target| target == "#top"));
}

#[cfg(unix)]
#[test]
fn check_links_unreachable_server_exits_with_timeout_code() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("link-check.toml"), "serverTimeoutSecs = 1\n");

    repokit_cmd()
        .current_dir(dir.path())
        .args(["check-links", "--config", "link-check.toml"])
        .args(["--host", "http://127.0.0.1:9", "--start-command", "sleep 30"])
        .assert()
        .code(6)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("did not respond within 1s"));
}

#[test]
fn check_links_zero_concurrency_is_a_usage_error() {
    repokit_cmd()
        .args(["check-links", "--concurrency", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--concurrency must be at least 1"));
}

#[test]
fn check_links_invalid_ignore_pattern_is_a_usage_error() {
    repokit_cmd()
        .args(["check-links", "--ignore-path", "("])
        .assert()
        .code(2);
}
