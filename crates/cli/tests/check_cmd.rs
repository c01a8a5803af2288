//! CLI tests for `cmdtree check`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::cargo;

fn cmdtree() -> Command {
    Command::new(cargo::cargo_bin!("cmdtree"))
}

fn router_sample() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../samples/router.json")
}

fn write_set(content: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("set.json");
    fs::write(&path, content).expect("write command set");
    (dir, path)
}

fn run_json(args: &[&str], file: &Path) -> (bool, serde_json::Value) {
    let output = cmdtree()
        .args(args)
        .arg(file)
        .args(["--output", "json"])
        .output()
        .expect("run cmdtree");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json = serde_json::from_str(&stdout).expect("valid json");
    (output.status.success(), json)
}

#[test]
fn sample_command_set_is_clean() {
    let (ok, json) = run_json(&["check"], &router_sample());
    assert!(ok);
    assert_eq!(json["success"], true);
    assert_eq!(json["modes"], 4);
    assert_eq!(json["diagnostics"].as_array().map(Vec::len), Some(0));
}

#[test]
fn shadowed_command_is_a_warning() {
    let (_dir, path) = write_set(
        r#"{"commands": [
            {"template": "show WORD", "handler": "show_any", "modes": [1]},
            {"template": "show Word1", "handler": "show_word1", "modes": [1]}
        ]}"#,
    );
    let (ok, json) = run_json(&["check"], &path);
    assert!(ok, "warnings must not fail the check");
    assert_eq!(json["success"], true);
    let diags = json["diagnostics"].as_array().expect("diagnostics array");
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0]["id"], "CLI2005");
    assert_eq!(diags[0]["severity"], "warn");
}

#[test]
fn malformed_grammar_fails_with_span() {
    let (_dir, path) = write_set(
        r#"{"commands": [{"template": "show (ip|ipv6", "handler": "x", "modes": [1]}]}"#,
    );
    let (ok, json) = run_json(&["check"], &path);
    assert!(!ok);
    assert_eq!(json["success"], false);
    let diag = &json["diagnostics"][0];
    assert_eq!(diag["id"], "CLI2002");
    assert_eq!(diag["context"]["template"], "show (ip|ipv6");
    assert!(diag["span"].is_object());
}

#[test]
fn unknown_mode_name_fails() {
    let (_dir, path) = write_set(
        r#"{"commands": [{"template": "show", "handler": "x", "modes": ["nowhere"]}]}"#,
    );
    let (ok, json) = run_json(&["check"], &path);
    assert!(!ok);
    assert_eq!(json["diagnostics"][0]["id"], "CLI2006");
}

#[test]
fn missing_file_emits_json_error_envelope() {
    let (ok, json) = run_json(&["check"], Path::new("nope-does-not-exist.json"));
    assert!(!ok);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "command_failed");
    assert!(
        json["message"]
            .as_str()
            .is_some_and(|m| m.contains("failed to load")),
        "unexpected message: {}",
        json["message"]
    );
}
