#![allow(clippy::unwrap_used)]
#![allow(missing_docs)]

use assert_cmd::cargo_bin_cmd;
use predicates::prelude::predicate;

#[test]
fn test_help_lists_commands() {
    // Arrange & Act & Assert
    let mut cmd = cargo_bin_cmd!("reelfind");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("search"))
        .stdout(predicate::str::contains("trending"))
        .stdout(predicate::str::contains("browse"));
}

#[test]
fn test_search_help() {
    // Arrange & Act & Assert
    let mut cmd = cargo_bin_cmd!("reelfind");
    cmd.args(["search", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--query"));
}

#[test]
fn test_search_missing_query() {
    // Arrange & Act & Assert
    let mut cmd = cargo_bin_cmd!("reelfind");
    cmd.arg("search")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--query"));
}

#[test]
fn test_record_missing_movie_id() {
    // Arrange & Act & Assert
    let mut cmd = cargo_bin_cmd!("reelfind");
    cmd.args(["record", "--term", "dune"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--movie-id"));
}

#[test]
fn test_details_rejects_non_numeric_id() {
    // Arrange & Act & Assert
    let mut cmd = cargo_bin_cmd!("reelfind");
    cmd.args(["details", "--id", "dune"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_discover_without_token_fails() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();

    // Act & Assert
    let mut cmd = cargo_bin_cmd!("reelfind");
    cmd.env_remove("TMDB_API_TOKEN")
        .args(["--dir", dir.path().to_str().unwrap(), "discover"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("TMDB_API_TOKEN"));
}

#[test]
fn test_trending_without_store_is_empty() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();

    // Act & Assert
    let mut cmd = cargo_bin_cmd!("reelfind");
    cmd.env_remove("APPWRITE_PROJECT_ID")
        .env_remove("APPWRITE_DATABASE_ID")
        .env_remove("APPWRITE_TABLE_ID")
        .args(["--dir", dir.path().to_str().unwrap(), "trending"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No trending movies yet."));
}

#[test]
fn test_config_init_then_show() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let dir_arg = dir.path().to_str().unwrap();

    // Act & Assert
    let mut init = cargo_bin_cmd!("reelfind");
    init.args(["--dir", dir_arg, "config", "init"])
        .assert()
        .success();
    assert!(dir.path().join("config.toml").exists());

    let mut show = cargo_bin_cmd!("reelfind");
    show.env_remove("TMDB_API_TOKEN")
        .args(["--dir", dir_arg, "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("search.debounce_ms = 500"))
        .stdout(predicate::str::contains("tmdb.token = (not set)"));
}

#[test]
fn test_config_init_refuses_overwrite() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let dir_arg = dir.path().to_str().unwrap();
    std::fs::write(dir.path().join("config.toml"), "").unwrap();

    // Act & Assert
    let mut cmd = cargo_bin_cmd!("reelfind");
    cmd.args(["--dir", dir_arg, "config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_completions_bash() {
    // Arrange & Act & Assert
    let mut cmd = cargo_bin_cmd!("reelfind");
    cmd.args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("reelfind"));
}

#[test]
fn test_config_init_honors_config_env() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("nested").join("reelfind.toml");

    // Act & Assert
    let mut cmd = cargo_bin_cmd!("reelfind");
    cmd.env("REELFIND_CONFIG", &file)
        .args(["config", "init"])
        .assert()
        .success();
    assert!(file.exists());
}

#[test]
fn test_screens_reject_unopenable_log_file() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();

    // Act & Assert
    let mut cmd = cargo_bin_cmd!("reelfind");
    cmd.env("REELFIND_LOG", dir.path())
        .args(["--dir", dir.path().to_str().unwrap(), "home"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to open log file"));
}
