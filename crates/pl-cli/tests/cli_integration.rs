//! CLI integration tests
//!
//! Tests the pairlink CLI using assert_cmd.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn pairlink() -> Command {
    let mut cmd = Command::cargo_bin("pairlink")
        .expect("Failed to locate pairlink binary - ensure it's built before running tests");
    cmd.env_remove("PAIRLINK_SESSION_DIR")
        .env_remove("PAIRLINK_BRIDGE")
        .env_remove("RUST_LOG");
    cmd
}

/// A command isolated from the user's config and session directories
fn isolated(dir: &Path) -> Command {
    let config = dir.join("config.toml");
    std::fs::write(&config, "").unwrap();

    let mut cmd = pairlink();
    cmd.arg("--config")
        .arg(&config)
        .arg("--session-dir")
        .arg(dir.join("session"));
    cmd
}

#[test]
fn test_cli_help() {
    pairlink()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("pairlink"))
        .stdout(predicate::str::contains("--login"))
        .stdout(predicate::str::contains("--logout"));
}

#[test]
fn test_cli_version() {
    pairlink()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pairlink"));
}

#[test]
fn test_no_selector_prints_usage() {
    pairlink()
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Usage: pairlink --login | --send --phone=<number> --message=<msg> | --logout",
        ));
}

#[test]
fn test_several_selectors_print_usage() {
    pairlink()
        .args(["--login", "--logout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: pairlink"));
}

#[test]
fn test_send_requires_phone_and_message() {
    pairlink()
        .args(["--send", "--message=hi"])
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "Phone and message are required for send",
        ));

    pairlink()
        .args(["--send", "--phone=628123456789"])
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "Phone and message are required for send",
        ));
}

#[test]
fn test_send_without_login() {
    let dir = TempDir::new().unwrap();

    isolated(dir.path())
        .args(["--send", "--phone=628123456789", "--message=hello"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Not logged in"));

    // the credential store was created on first use
    assert!(dir.path().join("session").join("session.db").exists());
}

#[test]
fn test_logout_without_login() {
    let dir = TempDir::new().unwrap();

    isolated(dir.path())
        .arg("--logout")
        .assert()
        .success()
        .stderr(predicate::str::contains("Not logged in"));
}

#[test]
fn test_login_unreachable_bridge_fails() {
    let dir = TempDir::new().unwrap();

    isolated(dir.path())
        .args(["--login", "--bridge", "127.0.0.1:1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to connect"));
}

#[test]
fn test_unavailable_session_dir_fails() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();

    pairlink()
        .arg("--session-dir")
        .arg(blocker.join("session"))
        .arg("--config")
        .arg(dir.path().join("missing.toml"))
        .arg("--logout")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));

    let config = dir.path().join("config.toml");
    std::fs::write(&config, "").unwrap();
    pairlink()
        .arg("--session-dir")
        .arg(blocker.join("session"))
        .arg("--config")
        .arg(&config)
        .arg("--logout")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot open session storage"))
        .stderr(predicate::str::contains("session.db"));
}
