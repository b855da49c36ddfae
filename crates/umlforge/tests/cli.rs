use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

const REQUIREMENTS: &str = "The library system manages Books and Members. \
    A Member can have multiple Books. Each Book has a title and an isbn.";

const USER_ACCOUNT: &str = r#"{
    "classes": [
        {"name": "User", "attributes": [{"name": "email"}], "methods": [{"name": "login"}]},
        {"name": "Account"}
    ],
    "relationships": [
        {"source": "User", "target": "Account", "type": "composition"}
    ]
}"#;

fn umlforge() -> Command {
    let mut cmd: Command = cargo_bin_cmd!("umlforge").into();
    cmd.env("NO_COLOR", "1");
    cmd.env_remove("UMLFORGE_MODEL_ENDPOINT");
    cmd
}

/// Writes `content` to `name` inside the tempdir and returns its path.
fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

// --- Binary startup ---

#[test]
fn binary_runs() {
    umlforge()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("umlforge"));
}

// --- Extract ---

#[test]
fn extract_renders_mermaid_from_file() {
    let tmp = TempDir::new().unwrap();
    let input = write_file(tmp.path(), "requirements.txt", REQUIREMENTS);

    umlforge()
        .arg("extract")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("classDiagram"))
        .stdout(predicate::str::contains("class Member"))
        .stderr(predicate::str::contains("rule_based"));
}

#[test]
fn extract_reads_stdin_as_json() {
    let model = stdout_json(
        umlforge()
            .args(["extract", "--format", "json"])
            .write_stdin(REQUIREMENTS),
    );

    let names: Vec<&str> = model["classes"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|c| c["name"].as_str())
        .collect();
    assert!(names.contains(&"Member"), "{names:?}");
}

#[test]
fn extract_applies_direction() {
    umlforge()
        .args(["extract", "-", "--direction", "LR"])
        .write_stdin(REQUIREMENTS)
        .assert()
        .success()
        .stdout(predicate::str::contains("direction LR"));
}

#[test]
fn extract_rejects_short_text() {
    umlforge()
        .arg("extract")
        .write_stdin("Too short.")
        .assert()
        .failure()
        .stderr(predicate::str::contains("short"));
}

#[test]
fn extract_rejects_unknown_format() {
    umlforge()
        .args(["extract", "--format", "svg"])
        .write_stdin(REQUIREMENTS)
        .assert()
        .failure()
        .stderr(predicate::str::contains("svg"));
}

// --- Render ---

#[test]
fn render_model_file() {
    let tmp = TempDir::new().unwrap();
    let model = write_file(tmp.path(), "model.json", USER_ACCOUNT);

    umlforge()
        .arg("render")
        .arg(&model)
        .args(["--direction", "rl"])
        .assert()
        .success()
        .stdout(predicate::str::contains("direction RL"))
        .stdout(predicate::str::contains("class User {"))
        .stdout(predicate::str::contains("*--"));
}

#[test]
fn render_rejects_invalid_model() {
    let tmp = TempDir::new().unwrap();
    let model = write_file(tmp.path(), "model.json", "{\"classes\": 3}");

    umlforge()
        .arg("render")
        .arg(&model)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid model"));
}

// --- Edit ---

#[test]
fn edit_reverses_relationship() {
    let tmp = TempDir::new().unwrap();
    let model = write_file(tmp.path(), "model.json", USER_ACCOUNT);
    let changes = write_file(
        tmp.path(),
        "changes.json",
        r#"[
            {"type": "remove_relationship", "source": "User", "target": "Account"},
            {"type": "add_relationship", "relationship": {"source": "Account", "target": "User", "type": "association"}}
        ]"#,
    );

    let updated = stdout_json(umlforge().arg("edit").arg(&model).arg(&changes));

    let relationships = updated["relationships"].as_array().unwrap();
    assert_eq!(relationships.len(), 1);
    assert_eq!(relationships[0]["source"], "Account");
    assert_eq!(relationships[0]["target"], "User");
}

#[test]
fn edit_reports_unknown_changes_as_skipped() {
    let tmp = TempDir::new().unwrap();
    let model = write_file(tmp.path(), "model.json", USER_ACCOUNT);

    umlforge()
        .arg("edit")
        .arg(&model)
        .arg("-")
        .args(["--format", "mermaid"])
        .write_stdin(r#"[{"type": "rotate_class", "class_name": "User"}]"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("class Account"))
        .stderr(predicate::str::contains("Skipped"));
}

#[test]
fn edit_logs_each_change_at_debug() {
    let tmp = TempDir::new().unwrap();
    let model = write_file(tmp.path(), "model.json", USER_ACCOUNT);

    umlforge()
        .env("RUST_LOG", "umlforge=debug")
        .arg("edit")
        .arg(&model)
        .arg("-")
        .write_stdin(r#"[{"type": "rotate_class", "class_name": "User"}]"#)
        .assert()
        .success()
        .stderr(predicate::str::contains("Parsed 1 change records"))
        .stderr(predicate::str::contains("Change 0 (rotate_class) -> Skipped"));
}

#[test]
fn edit_rejects_malformed_change() {
    let tmp = TempDir::new().unwrap();
    let model = write_file(tmp.path(), "model.json", USER_ACCOUNT);
    let changes = write_file(tmp.path(), "changes.json", r#"[{"type": "remove_class"}]"#);

    umlforge()
        .arg("edit")
        .arg(&model)
        .arg(&changes)
        .assert()
        .failure();
}

// --- Validate ---

#[test]
fn validate_accepts_rendered_diagram() {
    let tmp = TempDir::new().unwrap();
    let diagram = write_file(
        tmp.path(),
        "diagram.mmd",
        "classDiagram\n    class User {\n        +email: String\n    }\n    class Account\n    User --> Account\n",
    );

    umlforge()
        .arg("validate")
        .arg(&diagram)
        .assert()
        .success()
        .stderr(predicate::str::contains("valid"));
}

#[test]
fn validate_fails_on_unbalanced_braces() {
    umlforge()
        .args(["validate", "-"])
        .write_stdin("classDiagram\n    class User {\n        +email: String\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unbalanced"));
}

// --- Stats ---

#[test]
fn stats_prints_json_report() {
    let tmp = TempDir::new().unwrap();
    let model = write_file(tmp.path(), "model.json", USER_ACCOUNT);

    let report = stdout_json(umlforge().arg("stats").arg(&model).arg("--json"));

    assert_eq!(report["statistics"]["classes"]["total"], 2);
    assert!(report["quality_score"].as_u64().is_some());
    assert!(report["recommendations"].is_array());
}

#[test]
fn stats_prints_summary() {
    let tmp = TempDir::new().unwrap();
    let model = write_file(tmp.path(), "model.json", USER_ACCOUNT);

    umlforge()
        .arg("stats")
        .arg(&model)
        .assert()
        .success()
        .stdout(predicate::str::contains("Quality score"))
        .stdout(predicate::str::contains("Classes: 2"));
}
