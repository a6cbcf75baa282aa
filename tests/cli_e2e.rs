//! End-to-end CLI tests for the linkmeta binary.
//!
//! Every test points `XDG_CONFIG_HOME` at a temp dir so a developer's own
//! config file never leaks in. None of these tests touch the network.

#![allow(deprecated)]

use std::path::Path;
use std::time::Duration;

use assert_cmd::Command;
use linkmeta_core::{CacheStore, Database, SqliteCacheStore};
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;

fn linkmeta(config_home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("linkmeta").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env_remove("RUST_LOG")
        .env_remove("LINKMETA_GITHUB_TOKEN")
        .env_remove("LINKMETA_YOUTUBE_API_KEY")
        .env_remove("LINKMETA_STEAM_API_KEY");
    cmd
}

fn write_config(config_home: &Path, contents: &str) {
    let dir = config_home.join("linkmeta");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), contents).unwrap();
}

fn seed_cache(db_path: &Path, keys: &[&str]) {
    tokio_test::block_on(async {
        let store = SqliteCacheStore::new(Database::new(db_path).await.unwrap());
        for key in keys {
            store
                .set(key, json!({"title": "seeded"}), Duration::from_secs(3600))
                .await
                .unwrap();
        }
        store.database().clone().close().await;
    });
}

#[test]
fn test_binary_help_displays_usage() {
    let tempdir = TempDir::new().unwrap();
    linkmeta(tempdir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("resolve"))
        .stdout(predicate::str::contains("detect"));
}

#[test]
fn test_binary_version_displays_version() {
    let tempdir = TempDir::new().unwrap();
    linkmeta(tempdir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("linkmeta"));
}

#[test]
fn test_binary_invalid_flag_returns_error() {
    let tempdir = TempDir::new().unwrap();
    linkmeta(tempdir.path())
        .arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_detect_prints_provider_per_link() {
    let tempdir = TempDir::new().unwrap();
    linkmeta(tempdir.path())
        .args([
            "detect",
            "https://discord.gg/rust-lang",
            "https://www.youtube.com/@LinusTechTips",
            "https://open.spotify.com/track/0GjEhVFGZW8afUYGChu3Rr",
            "https://example.com/me",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("discord\thttps://discord.gg/rust-lang"))
        .stdout(predicate::str::contains("youtube\thttps://www.youtube.com/@LinusTechTips"))
        .stdout(predicate::str::contains("spotify\t"))
        .stdout(predicate::str::contains("other\thttps://example.com/me"));
}

#[test]
fn test_resolve_unmatched_link_returns_generic_record() {
    let tempdir = TempDir::new().unwrap();
    linkmeta(tempdir.path())
        .args(["-q", "resolve", "--no-cache", "https://example.com/portfolio"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"title\": \"https://example.com/portfolio\""))
        .stdout(predicate::str::contains("External Link"));
}

#[test]
fn test_resolve_without_youtube_key_exits_with_partial_failure() {
    let tempdir = TempDir::new().unwrap();
    linkmeta(tempdir.path())
        .args([
            "-q",
            "resolve",
            "--no-cache",
            "https://example.com",
            "https://www.youtube.com/@LinusTechTips",
        ])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("provider_not_configured"))
        .stdout(predicate::str::contains("youtube_api_key"))
        .stdout(predicate::str::contains("External Link"));
}

#[test]
fn test_resolve_rejects_malformed_proxy_flag() {
    let tempdir = TempDir::new().unwrap();
    linkmeta(tempdir.path())
        .args(["resolve", "--no-cache", "--proxy", "ftp://relay", "https://example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid --proxy value"));
}

#[test]
fn test_no_cache_conflicts_with_cache_db() {
    let tempdir = TempDir::new().unwrap();
    let db_path = tempdir.path().join("cache.db");
    linkmeta(tempdir.path())
        .args(["resolve", "--no-cache", "--cache-db"])
        .arg(&db_path)
        .arg("https://example.com")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_unknown_config_key_fails_startup() {
    let tempdir = TempDir::new().unwrap();
    write_config(tempdir.path(), "output_dir = \"/tmp\"\n");
    linkmeta(tempdir.path())
        .args(["detect", "https://github.com/rust-lang"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("output_dir"));
}

#[test]
fn test_explicit_missing_config_path_fails() {
    let tempdir = TempDir::new().unwrap();
    linkmeta(tempdir.path())
        .arg("--config")
        .arg(tempdir.path().join("absent.toml"))
        .args(["detect", "https://github.com/rust-lang"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn test_cache_clear_scope_reports_removed_count() {
    let tempdir = TempDir::new().unwrap();
    let db_path = tempdir.path().join("cache.db");
    seed_cache(
        &db_path,
        &[
            "link_metadata:alice:https://github.com/a",
            "profile_appearance:alice",
            "listening_activity:bob",
        ],
    );

    linkmeta(tempdir.path())
        .args(["-q", "cache", "clear-scope", "alice", "--cache-db"])
        .arg(&db_path)
        .assert()
        .success()
        .stdout(predicate::str::diff("2\n"));

    linkmeta(tempdir.path())
        .args(["-q", "cache", "clear", "listening_activity:bob", "--cache-db"])
        .arg(&db_path)
        .assert()
        .success()
        .stdout(predicate::str::diff("1\n"));
}

#[test]
fn test_cache_db_from_config_file_is_used() {
    let tempdir = TempDir::new().unwrap();
    let db_path = tempdir.path().join("from-config.db");
    seed_cache(&db_path, &["link_metadata:carol:https://github.com/c"]);
    write_config(
        tempdir.path(),
        &format!("cache_db = \"{}\"\n", db_path.display()),
    );

    linkmeta(tempdir.path())
        .args(["-q", "cache", "clear-scope", "carol"])
        .assert()
        .success()
        .stdout(predicate::str::diff("1\n"));
}

#[test]
fn test_cache_without_database_fails() {
    let tempdir = TempDir::new().unwrap();
    linkmeta(tempdir.path())
        .args(["cache", "clear-scope", "alice"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No cache database given"));
}
