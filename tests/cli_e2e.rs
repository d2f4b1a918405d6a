//! End-to-end CLI tests for the vidmeta binary.

mod support;

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use support::fixtures::{ITEM_ID, detail_document, mock_config};
use support::mock_server::mock_server_or_skip;
use tempfile::NamedTempFile;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

fn vidmeta() -> Command {
    let mut cmd = Command::cargo_bin("vidmeta").unwrap();
    cmd.env_remove("RUST_LOG")
        .env("XDG_CONFIG_HOME", std::env::temp_dir().join("vidmeta-e2e-no-config"));
    cmd
}

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

/// Test that the binary exits with code 0 when stdin is empty.
#[test]
fn test_binary_without_input_returns_zero() {
    vidmeta().write_stdin("").assert().success();
}

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    vidmeta()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("share link"))
        .stdout(predicate::str::contains("--format"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    vidmeta()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vidmeta"));
}

/// Test that invalid flags cause non-zero exit.
#[test]
fn test_binary_invalid_flag_returns_error() {
    vidmeta()
        .arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_binary_unknown_format_is_rejected() {
    vidmeta()
        .args(["--format", "gif", "https://v.douyin.com/abc/"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown media format"));
}

#[test]
fn test_binary_text_without_url_fails() {
    vidmeta()
        .args(["-q", "nothing", "to", "see", "here"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("no entity id found"));
}

#[test]
fn test_binary_missing_config_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.json");
    vidmeta()
        .arg("--config")
        .arg(&missing)
        .arg("https://v.douyin.com/abc/")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_binary_malformed_config_file_fails() {
    let file = config_file("{ this is not json");
    vidmeta()
        .arg("--config")
        .arg(file.path())
        .arg("https://v.douyin.com/abc/")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config file"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_binary_prints_outcome_json() {
    let Some(server) = mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path(format!("/video/{ITEM_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>item</html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/aweme/v1/web/aweme/detail/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(detail_document(ITEM_ID)))
        .mount(&server)
        .await;

    let config = serde_json::to_string(&mock_config(&server.uri())).unwrap();
    let file = config_file(&config);
    let input = format!("look at this {}/video/{ITEM_ID}", server.uri());

    let output = tokio::task::spawn_blocking(move || {
        vidmeta()
            .arg("--config")
            .arg(file.path())
            .args(["--format", "webp", "-q"])
            .write_stdin(input)
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let outcome: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(outcome["entity_id"], ITEM_ID);
    assert_eq!(outcome["strategy"], "web_api");
    assert_eq!(outcome["quality"], "genuine");
    assert_eq!(outcome["format"], "webp");
    assert_eq!(outcome["payload"]["aweme_detail"]["aweme_id"], ITEM_ID);
}
