//! End-to-end CLI tests for the socialctl binary.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;
use support::socket_guard::start_mock_server_or_skip;

/// A command isolated from the user's config file and log settings.
fn socialctl(config_home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("socialctl").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env_remove("RUST_LOG")
        .env_remove("NO_COLOR");
    cmd
}

fn write_config(config_home: &Path, contents: &str) {
    let dir = config_home.join("socialctl");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), contents).unwrap();
}

#[test]
fn test_help_displays_usage() {
    let home = tempfile::tempdir().unwrap();
    socialctl(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("follow"))
        .stdout(predicate::str::contains("--cookie"));
}

#[test]
fn test_version_displays_name() {
    let home = tempfile::tempdir().unwrap();
    socialctl(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("socialctl"));
}

#[test]
fn test_missing_subcommand_is_usage_error() {
    let home = tempfile::tempdir().unwrap();
    socialctl(home.path()).assert().code(1);
}

#[test]
fn test_invalid_flag_returns_error() {
    let home = tempfile::tempdir().unwrap();
    socialctl(home.path())
        .args(["--invalid-flag", "accounts"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_decode_prints_code_and_id() {
    let home = tempfile::tempdir().unwrap();
    socialctl(home.path())
        .args([
            "decode",
            "BA",
            "https://www.instagram.com/p/CuQ9x2LNhRE/",
        ])
        .assert()
        .success()
        .stdout("BA\t64\nCuQ9x2LNhRE\t3139280646538925124\n");
}

#[test]
fn test_decode_invalid_symbol_fails() {
    let home = tempfile::tempdir().unwrap();
    socialctl(home.path())
        .args(["decode", "!"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid symbol"));
}

#[test]
fn test_decode_mixed_input_is_partial() {
    let home = tempfile::tempdir().unwrap();
    socialctl(home.path())
        .args(["decode", "BA", "!"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("BA\t64"));
}

#[test]
fn test_accounts_lists_labels_and_users() {
    let home = tempfile::tempdir().unwrap();
    socialctl(home.path())
        .args([
            "accounts",
            "--cookie",
            "ds_user=alice; sessionid=1",
            "--cookie",
            "sessionid=2",
        ])
        .assert()
        .success()
        .stdout("account-1\talice\naccount-2\tunknown\n");
}

#[test]
fn test_accounts_from_cookie_file() {
    let home = tempfile::tempdir().unwrap();
    let cookies = home.path().join("cookies.txt");
    std::fs::write(&cookies, "# two sessions\nds_user=alice\nds_user=bob\n").unwrap();

    socialctl(home.path())
        .arg("accounts")
        .arg("--cookies-file")
        .arg(&cookies)
        .assert()
        .success()
        .stdout(predicate::str::contains("account-2\tbob"));
}

#[test]
fn test_accounts_from_stdin() {
    let home = tempfile::tempdir().unwrap();
    socialctl(home.path())
        .args(["accounts", "--cookies-file", "-"])
        .write_stdin("ds_user=carol; sessionid=3\n")
        .assert()
        .success()
        .stdout("account-1\tcarol\n");
}

#[test]
fn test_action_without_cookies_fails() {
    let home = tempfile::tempdir().unwrap();
    socialctl(home.path())
        .args(["like", "BA"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no accounts"));
}

#[test]
fn test_unknown_config_key_fails() {
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), "not_a_setting = 1\n");
    socialctl(home.path())
        .args(["decode", "BA"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not_a_setting"));
}

#[tokio::test]
async fn test_follow_against_mock_platform() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/api/v1/users/web_profile_info/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"user": {"id": "99", "username": "janedoe"}}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/friendships/create/99/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(2)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let uri = server.uri();
    let assert = tokio::task::spawn_blocking(move || {
        socialctl(home.path())
            .args(["follow", "@janedoe", "--base-url", &uri, "-l", "0", "-q"])
            .args(["--cookie", "ds_user=alice; csrftoken=t1; sessionid=a"])
            .args(["--cookie", "ds_user=bob; csrftoken=t2; sessionid=b"])
            .assert()
    })
    .await
    .unwrap();

    assert
        .success()
        .stdout(predicate::str::contains(
            "ok    account-1 (alice)  followed janedoe (user id 99)",
        ))
        .stdout(predicate::str::contains("account-2 (bob)"));
}

#[tokio::test]
async fn test_partial_failure_exits_two() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("POST"))
        .and(path("/web/likes/64/like/"))
        .and(header_regex("cookie", "sessionid=expired"))
        .respond_with(ResponseTemplate::new(401))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/web/likes/64/like/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let uri = server.uri();
    let assert = tokio::task::spawn_blocking(move || {
        socialctl(home.path())
            .args(["like", "https://www.instagram.com/p/BA/", "--base-url", &uri])
            .args(["-l", "0", "-r", "1", "-q"])
            .args(["--cookie", "ds_user=alice; sessionid=fresh"])
            .args(["--cookie", "ds_user=bob; sessionid=expired"])
            .assert()
    })
    .await
    .unwrap();

    assert
        .code(2)
        .stdout(predicate::str::contains("ok    account-1 (alice)  liked media 64"))
        .stdout(predicate::str::contains("fail  account-2 (bob)  unauthorized"));
}

#[tokio::test]
async fn test_scrape_prints_profile_json_once() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/api/v1/users/web_profile_info/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"user": {
                "id": "7",
                "username": "janedoe",
                "edge_followed_by": {"count": 1200}
            }}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let uri = server.uri();
    let assert = tokio::task::spawn_blocking(move || {
        socialctl(home.path())
            .args(["scrape", "janedoe", "--base-url", &uri, "-l", "0", "-q"])
            .args(["--cookie", "ds_user=alice", "--cookie", "ds_user=bob"])
            .assert()
    })
    .await
    .unwrap();

    assert
        .success()
        .stdout(predicate::str::contains("\"username\": \"janedoe\""))
        .stdout(predicate::str::contains("1200"));
}

#[tokio::test]
async fn test_all_failures_exit_one() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("POST"))
        .and(path("/web/likes/64/like/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let uri = server.uri();
    let assert = tokio::task::spawn_blocking(move || {
        socialctl(home.path())
            .args(["like", "BA", "--base-url", &uri, "-l", "0", "-q"])
            .args(["--cookie", "ds_user=alice"])
            .assert()
    })
    .await
    .unwrap();

    assert
        .code(1)
        .stdout(predicate::str::contains("fail  account-1 (alice)  not_found"));
}
