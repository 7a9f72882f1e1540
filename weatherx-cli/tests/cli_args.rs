//! Integration tests for CLI argument handling
//!
//! None of these reach the network: they stop at argument parsing or
//! configuration checks.

use std::{fs, process::Command};

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_weatherx"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to execute weatherx")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(output.status.success(), "Expected --help to exit successfully");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("weatherx"), "Help should mention weatherx");
    assert!(stdout.contains("show"), "Help should list the show command");
    assert!(stdout.contains("--config"), "Help should mention --config");
}

#[test]
fn test_keys_lists_metrics_and_debug_keys() {
    let output = run_cli(&["keys"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let keys: Vec<&str> = stdout.lines().collect();
    assert!(keys.contains(&"currenttemp"));
    assert!(keys.contains(&"nexthourssummary"));
    assert!(keys.contains(&"forecastsunrisetext"));
    assert!(keys.contains(&"debugurl"));
    assert!(keys.contains(&"status"));
}

#[test]
fn test_unknown_subcommand_fails() {
    let output = run_cli(&["forecast"]);
    assert!(!output.status.success(), "Expected unknown subcommand to fail");
}

#[test]
fn test_non_numeric_day_fails() {
    let output = run_cli(&["show", "ForecastTempMax", "--day", "tomorrow"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--day"), "Should name the bad flag: {stderr}");
}

#[test]
fn test_invalid_coordinates_are_rejected_before_download() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "latitude = 123.0\nlongitude = 10.0\n").unwrap();

    let output = run_cli(&["--config", path.to_str().unwrap(), "show", "CurrentTemp"]);
    assert!(!output.status.success(), "Expected invalid coordinates to fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid coordinates"), "Should explain the failure: {stderr}");
}

#[test]
fn test_malformed_config_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "latitude = \"north\"\n").unwrap();

    let output = run_cli(&["--config", path.to_str().unwrap(), "dump"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to parse config file"), "stderr: {stderr}");
}
