//! Integration tests for the loompage CLI commands.
//!
//! Nothing here reaches a provider: queries are either rejected up front or clean down to
//! nothing, and provider keys are removed from the environment.

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;
use tempfile::tempdir;

// Helper function to create a clean command instance without provider keys
fn loompage() -> Command {
  let mut command = Command::cargo_bin("loompage").unwrap();
  command
    .env_remove("UNSPLASH_ACCESS_KEY")
    .env_remove("PIXABAY_API_KEY")
    .env_remove("PEXELS_API_KEY")
    .env_remove("RUST_LOG");
  command
}

// Helper to get a temporary configuration path
fn temp_config() -> (tempfile::TempDir, PathBuf) {
  let dir = tempdir().unwrap();
  let path = dir.path().join("loompage").join("config.toml");
  (dir, path)
}

#[test]
fn test_help_lists_commands() {
  loompage()
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("serve"))
    .stdout(predicate::str::contains("gallery"))
    .stdout(predicate::str::contains("providers"));
}

#[test]
#[serial]
fn test_init_writes_and_keeps_config() -> anyhow::Result<()> {
  let (dir, path) = temp_config();

  loompage()
    .arg("init")
    .arg("--config")
    .arg(&path)
    .assert()
    .success()
    .stdout(predicate::str::contains("Configuration written"));
  let written = std::fs::read_to_string(&path)?;
  assert!(written.contains("[providers.wikimedia]"));

  loompage()
    .arg("init")
    .arg("--config")
    .arg(&path)
    .assert()
    .success()
    .stdout(predicate::str::contains("already exists"));

  dir.close()?;
  Ok(())
}

#[test]
#[serial]
fn test_providers_without_keys() {
  let (dir, path) = temp_config();
  loompage().arg("init").arg("--config").arg(&path).assert().success();

  loompage()
    .arg("providers")
    .arg("--config")
    .arg(&path)
    .assert()
    .success()
    .stdout(predicate::str::contains(format!("{:<20} unavailable", "Unsplash")))
    .stdout(predicate::str::contains(format!("{:<20} available", "Wikimedia Commons")));

  dir.close().unwrap();
}

#[test]
#[serial]
fn test_invalid_config_is_reported() -> anyhow::Result<()> {
  let (dir, path) = temp_config();
  std::fs::create_dir_all(dir.path().join("loompage"))?;
  std::fs::write(&path, "[retry]\nmax_attempts = 0\n")?;

  loompage()
    .arg("providers")
    .arg("--config")
    .arg(&path)
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to load configuration"));

  dir.close()?;
  Ok(())
}

#[test]
fn test_noise_only_search_contacts_nobody() {
  let (dir, path) = temp_config();

  loompage()
    .args(["search", "no people, no text"])
    .arg("--config")
    .arg(&path)
    .assert()
    .success()
    .stdout(predicate::str::contains("No suitable search terms"));

  loompage()
    .args(["gallery", "no people", "--limit", "5"])
    .arg("--config")
    .arg(&path)
    .assert()
    .success()
    .stdout(predicate::str::contains("No images found"));

  dir.close().unwrap();
}

#[test]
fn test_search_rejects_bad_input() {
  loompage()
    .args(["search", "cabin", "--orientation", "square"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Invalid orientation"));

  loompage()
    .args(["search", "   "])
    .assert()
    .failure()
    .stderr(predicate::str::contains("must not be empty"));
}
