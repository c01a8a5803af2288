//! CLI tests for the `cmdtree explain` subcommand.

use std::process::Command;

use assert_cmd::cargo;

fn cmdtree() -> Command {
    Command::new(cargo::cargo_bin!("cmdtree"))
}

#[test]
fn explain_known_code_json_returns_explanation() {
    let output = cmdtree()
        .args(["explain", "CLI1002", "--output", "json"])
        .output()
        .expect("run explain command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid json");
    assert_eq!(json["id"], "CLI1002");
    assert!(json["explanation"].is_string());
}

#[test]
fn explain_unknown_code_json_returns_null_explanation() {
    let output = cmdtree()
        .args(["explain", "CLI9999", "--output", "json"])
        .output()
        .expect("run explain command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid json");
    assert!(json["explanation"].is_null());
}

#[test]
fn explain_pretty_shows_human_readable_text() {
    let output = cmdtree()
        .args(["explain", "CLI2005", "--output", "pretty"])
        .output()
        .expect("run explain command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("CLI2005") && stdout.contains("canonical line"), "{stdout}");
}
