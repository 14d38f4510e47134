//! Integration tests for the `shapejson` CLI binary.
//!
//! These tests use `assert_cmd` and `predicates` to exercise the format and
//! check subcommands through the actual binary, including stdin/stdout piping,
//! file I/O, options files and error handling.

// `Command::cargo_bin` was deprecated in assert_cmd 2.1.2 in favor of
// `cargo::cargo_bin_cmd!`. Allow it until we migrate.
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;

/// Helper: path to the sample.json fixture.
fn sample_json_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/sample.json")
}

/// Helper: path to the options.json fixture.
fn options_json_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/options.json")
}

/// Helper: path to an options file with a mistyped setting.
fn bad_options_json_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/bad_options.json")
}

/// Helper: path to an options file that sets member name casing.
fn member_options_json_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/member_options.json")
}

fn shapejson() -> Command {
    Command::cargo_bin("shapejson").unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// Format subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn format_stdin_to_stdout() {
    shapejson()
        .arg("format")
        .write_stdin(r#"{"name":"Alice","tags":["a","b"],"empty":[]}"#)
        .assert()
        .success()
        .stdout(r#"{"name": "Alice","tags": ["a","b"],"empty": [ ]}"#);
}

#[test]
fn format_file_keeps_key_order() {
    shapejson()
        .args(["format", "-i", sample_json_path()])
        .assert()
        .success()
        .stdout(
            r#"{"name": "Quarterly review","attendees": ["Ada","Grace","Zoë"],"room": null,"duration": 1.5,"recurring": false,"notes": { }}"#,
        );
}

#[test]
fn format_pretty() {
    shapejson()
        .args(["format", "--pretty"])
        .write_stdin(r#"{"a":[1,2]}"#)
        .assert()
        .success()
        .stdout("{\n  \"a\": [\n    1,\n    2\n  ]\n}");
}

#[test]
fn format_with_options_file() {
    shapejson()
        .args(["format", "--options", options_json_path(), "-i", sample_json_path()])
        .assert()
        .success()
        .stdout(predicate::str::contains("\n  \"name\": \"Quarterly review\""))
        .stdout(predicate::str::contains(r#""Zo\u00eb""#));
}

#[test]
fn format_empty_input_is_empty_output() {
    shapejson()
        .arg("format")
        .write_stdin("  \n")
        .assert()
        .success()
        .stdout("");
}

#[test]
fn format_output_file() {
    let dir = std::env::temp_dir().join(format!("shapejson-cli-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let out = dir.join("out.json");

    shapejson()
        .args(["format", "-o", out.to_str().unwrap()])
        .write_stdin("[1.0, 2.50, -0]")
        .assert()
        .success()
        .stdout("");

    assert_eq!(std::fs::read_to_string(&out).unwrap(), "[1,2.5,0]");
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn format_output_is_valid_json() {
    let output = shapejson()
        .args(["format", "--pretty", "-i", sample_json_path()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let formatted: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let original: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(sample_json_path()).unwrap()).unwrap();
    assert_eq!(formatted, original);
}

// ─────────────────────────────────────────────────────────────────────────────
// Check subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn check_reports_shape_counts() {
    shapejson()
        .args(["check", "-i", sample_json_path()])
        .assert()
        .success()
        .stdout(predicate::str::contains("shape: dictionary"))
        .stdout(predicate::str::contains("nodes: 10"))
        .stdout(predicate::str::contains("  primitive: 6"))
        .stdout(predicate::str::contains("  null: 1"));
}

#[test]
fn check_empty_input() {
    shapejson()
        .arg("check")
        .write_stdin("")
        .assert()
        .success()
        .stdout("shape: empty\n");
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn malformed_input_fails() {
    shapejson()
        .arg("check")
        .write_stdin(r#"{"a": "#)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse JSON input"));
}

#[test]
fn missing_input_file_fails() {
    shapejson()
        .args(["format", "-i", "/nonexistent/input.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read file"));
}

#[test]
fn invalid_options_file_fails() {
    shapejson()
        .args(["format", "--options", bad_options_json_path()])
        .write_stdin("[]")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid options file"));
}

#[test]
fn member_only_options_are_rejected() {
    shapejson()
        .args(["format", "--options", member_options_json_path()])
        .write_stdin(r#"{"FirstName": "Ada"}"#)
        .assert()
        .failure()
        .stdout("")
        .stderr(predicate::str::contains("name_case"));
}

#[test]
fn no_subcommand_shows_usage() {
    shapejson()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}
