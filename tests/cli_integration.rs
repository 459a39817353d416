//! CLI integration tests
//!
//! These run the built binary and only exercise paths that never reach the
//! analysis service: argument parsing, validation, input errors and cache clearing.

use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;

fn citetrace(args: &[&str], cwd: &TempDir) -> Output {
    Command::new(env!("CARGO_BIN_EXE_citetrace"))
        .args(args)
        .current_dir(cwd.path())
        .env_remove("RUST_LOG")
        .env("CITETRACE_CACHE_DIR", cwd.path().join("cache"))
        .output()
        .expect("Failed to run citetrace")
}

#[test]
fn test_cli_help() {
    let dir = TempDir::new().unwrap();
    let output = citetrace(&["--help"], &dir);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("analyze"));
    assert!(stdout.contains("cache"));
}

#[test]
fn test_cli_version() {
    let dir = TempDir::new().unwrap();
    let output = citetrace(&["--version"], &dir);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_missing_input_exits_with_error() {
    let dir = TempDir::new().unwrap();
    let output = citetrace(&["analyze", "absent.tar.gz", "--backend", "ollama", "-q"], &dir);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Input path does not exist"));
    assert!(!dir.path().join("references_analysis_report.html").exists());
}

#[test]
fn test_invalid_concurrency_is_rejected() {
    let dir = TempDir::new().unwrap();
    let output = citetrace(&["analyze", "--backend", "ollama", "--concurrency", "0"], &dir);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Concurrency must be between 1 and 256"));
}

#[test]
fn test_invalid_provider_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    let output = citetrace(&["analyze", "--backend", "nonsense"], &dir);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid provider"));
}

#[test]
fn test_cache_clear_removes_records() {
    let dir = TempDir::new().unwrap();
    let cache = dir.path().join("responses");
    fs::create_dir_all(&cache).unwrap();
    fs::write(cache.join(format!("{}.json", "a".repeat(64))), "{}").unwrap();
    fs::write(cache.join("notes.txt"), "keep me").unwrap();

    let output = citetrace(&["cache", "clear", "--cache-dir", cache.to_str().unwrap()], &dir);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Removed 1 cached responses"));
    assert!(cache.join("notes.txt").exists());
}
