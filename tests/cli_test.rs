mod common;

use assert_cmd::Command;
use common::TestProject;
use predicates::prelude::*;
use serde_json::Value;

const CLEAN: &str = "def get_user():\n    pass\n";
const DIRTY: &str = "def userData():\n    pass\n";

fn grammarops() -> Command {
    let mut cmd = Command::cargo_bin("grammarops").expect("binary is built");
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_analyze_clean_project_exits_zero() {
    let project = TestProject::new(&[("app.py", CLEAN)]);
    grammarops()
        .arg("analyze")
        .arg(project.root())
        .assert()
        .code(0)
        .stdout(predicate::str::contains("No naming issues found"));
}

#[test]
fn test_analyze_with_violations_exits_one() {
    let project = TestProject::new(&[("app.py", DIRTY)]);
    grammarops()
        .arg("analyze")
        .arg(project.root())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("userData"))
        .stdout(predicate::str::contains("Total issues: 2"));
}

#[test]
fn test_invalid_config_exits_two() {
    let project = TestProject::new(&[
        ("app.py", CLEAN),
        (
            ".grammarops.config.json",
            r#"{ "rules": { "python": { "widgets": { "style": "snake_case" } } } }"#,
        ),
    ]);
    grammarops()
        .arg("analyze")
        .arg(project.root())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown rule category 'widgets'"));
}

#[test]
fn test_bad_exception_pattern_exits_two() {
    let project = TestProject::new(&[
        ("app.py", CLEAN),
        (
            ".grammarops.config.json",
            r#"{ "exceptions": { "patterns": { "allow": ["(unclosed"] } } }"#,
        ),
    ]);
    grammarops()
        .arg("analyze")
        .arg(project.root())
        .assert()
        .code(2);
}

#[test]
fn test_analyze_json_output_is_valid() {
    let project = TestProject::new(&[("app.py", DIRTY)]);
    let output = grammarops()
        .args(["analyze", "--format", "json"])
        .arg(project.root())
        .output()
        .expect("run grammarops");
    assert_eq!(output.status.code(), Some(1));

    let json: Value = serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(json["summary"]["totalIssues"], 2);
    assert_eq!(json["violations"][0]["file"], "app.py");
    assert_eq!(json["violations"][0]["declarationName"], "userData");
    assert_eq!(json["violations"][0]["contextLabel"], "RegularFunction");
}

#[test]
fn test_analyze_writes_report_file() {
    let project = TestProject::new(&[("app.py", DIRTY)]);
    let report = project.path("report.json");
    grammarops()
        .args(["analyze", "-f", "json", "-o"])
        .arg(&report)
        .arg(project.root())
        .assert()
        .code(1);

    let json: Value = serde_json::from_str(&project.read("report.json")).unwrap();
    assert!(json["violations"].is_array());
}

#[test]
fn test_detect_json_lists_frameworks() {
    let project = TestProject::new(&[(
        "main.py",
        "from fastapi import FastAPI\n\napp = FastAPI()\n",
    )]);
    let output = grammarops()
        .args(["detect", "--format", "json"])
        .arg(project.root())
        .output()
        .expect("run grammarops");
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["frameworks"], serde_json::json!(["fastapi"]));
}

#[test]
fn test_learn_writes_learned_config() {
    let project = TestProject::new(&[("app.py", DIRTY)]);
    grammarops()
        .arg("learn")
        .arg(project.root())
        .assert()
        .success();

    let learned: Value =
        serde_json::from_str(&project.read(".grammarops.learned.json")).expect("learned JSON");
    assert!(learned["exceptions"]["functions"]
        .as_array()
        .unwrap()
        .contains(&Value::from("userData")));
}

#[test]
fn test_migrate_dry_run_then_apply_then_rollback() {
    let project = TestProject::new(&[("app.py", DIRTY)]);

    grammarops()
        .args(["migrate", "--dry-run"])
        .arg(project.root())
        .assert()
        .success()
        .stdout(predicate::str::contains("get_user_data"));
    assert_eq!(project.read("app.py"), DIRTY);

    grammarops()
        .args(["migrate", "--yes"])
        .arg(project.root())
        .assert()
        .success();
    assert_eq!(project.read("app.py"), "def get_user_data():\n    pass\n");

    grammarops()
        .args(["migrate", "--rollback"])
        .arg(project.root())
        .assert()
        .success();
    assert_eq!(project.read("app.py"), DIRTY);
}

#[test]
fn test_rollback_and_dry_run_conflict() {
    grammarops()
        .args(["migrate", "--rollback", "--dry-run", "."])
        .assert()
        .failure();
}
