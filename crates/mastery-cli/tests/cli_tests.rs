//! CLI integration tests using assert_cmd.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn mastery(dir: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("mastery").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env_remove("MASTERY_CATALOG")
        .env_remove("MASTERY_STATE_DIR");
    cmd
}

fn initialized() -> TempDir {
    let dir = TempDir::new().unwrap();
    mastery(dir.path()).arg("init").assert().success();
    dir
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    mastery(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created mastery.toml"))
        .stdout(predicate::str::contains("Created curriculum.json"));

    assert!(dir.path().join("mastery.toml").exists());
    assert!(dir.path().join("curriculum.json").exists());
}

#[test]
fn init_skips_existing() {
    let dir = initialized();

    mastery(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("mastery.toml already exists"))
        .stdout(predicate::str::contains("curriculum.json already exists"));
}

#[test]
fn validate_sample_curriculum() {
    let dir = initialized();

    mastery(dir.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 units, 5 subtopics"))
        .stdout(predicate::str::contains(
            "Unit 1 Trees (3 subtopics, starts at 'Binary trees')",
        ))
        .stdout(predicate::str::contains("Catalog valid."));
}

#[test]
fn validate_reports_warnings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("catalog.toml");
    std::fs::write(
        &path,
        r#"
[[units]]
name = "Recursion"
subtopics = ["Base cases"]
"#,
    )
    .unwrap();

    mastery(dir.path())
        .arg("validate")
        .arg("--catalog")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("[Recursion] WARNING"))
        .stdout(predicate::str::contains("1 warning(s) found."));
}

#[test]
fn validate_rejects_duplicate_subtopics() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dup.json");
    std::fs::write(
        &path,
        r#"[
  { "name": "A", "children": [ { "name": "Shared" } ] },
  { "name": "B", "children": [ { "name": "Shared" } ] }
]"#,
    )
    .unwrap();

    mastery(dir.path())
        .arg("validate")
        .arg("--catalog")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"))
        .stderr(predicate::str::contains("appears in both"));
}

#[test]
fn validate_nonexistent_file() {
    let dir = TempDir::new().unwrap();

    mastery(dir.path())
        .arg("validate")
        .arg("--catalog")
        .arg("nonexistent.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn stateful_command_without_curriculum_fails() {
    let dir = TempDir::new().unwrap();

    mastery(dir.path())
        .args(["enroll", "S1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("mastery init"));
}

#[test]
fn explicit_config_must_exist() {
    let dir = initialized();

    mastery(dir.path())
        .args(["--config", "missing.toml", "topics"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn enroll_is_idempotent() {
    let dir = initialized();
    let roster = dir.path().join("roster.txt");
    std::fs::write(&roster, "# term 1\nS2\n\nS3\n").unwrap();

    mastery(dir.path())
        .args(["enroll", "S1", "S2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Enrolled 2 new student(s) (2 total)."));

    mastery(dir.path())
        .args(["enroll", "--file"])
        .arg(&roster)
        .assert()
        .success()
        .stdout(predicate::str::contains("Enrolled 1 new student(s) (3 total)."));

    assert!(dir.path().join("mastery-state/snapshot.json").exists());
}

#[test]
fn enroll_requires_ids() {
    let dir = initialized();

    mastery(dir.path())
        .arg("enroll")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no student ids given"));
}

#[test]
fn add_question_infers_unit_and_type() {
    let dir = initialized();

    mastery(dir.path())
        .args([
            "add-question",
            "--id",
            "Q1",
            "--text",
            "【計算題】What is the height of a complete binary tree with 15 nodes?",
            "--topic",
            "Binary trees",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Added question Q1 (Unit 1 Trees / Binary trees, calculation)",
        ));

    mastery(dir.path())
        .args([
            "add-question",
            "--id",
            "Q1",
            "--text",
            "again",
            "--topic",
            "Binary trees",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("question already exists: Q1"));
}

#[test]
fn add_question_rejects_unit_mismatch() {
    let dir = initialized();

    mastery(dir.path())
        .args([
            "add-question",
            "--id",
            "Q1",
            "--text",
            "Define a heap.",
            "--topic",
            "Heaps",
            "--unit",
            "Unit 2 Hashing",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("belongs to unit 'Unit 1 Trees'"));
}

#[test]
fn questions_lists_the_bank() {
    let dir = initialized();
    mastery(dir.path())
        .args([
            "add-question",
            "--id",
            "Q-avl",
            "--text",
            "【簡答題】Why rotate?",
            "--topic",
            "AVL trees",
        ])
        .assert()
        .success();

    mastery(dir.path())
        .arg("questions")
        .assert()
        .success()
        .stdout(predicate::str::contains("Q-avl"))
        .stdout(predicate::str::contains("short-answer"))
        .stdout(predicate::str::contains("1 question(s)"));

    let output = mastery(dir.path())
        .args(["questions", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let questions: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(questions[0]["id"], "Q-avl");
    assert_eq!(questions[0]["unit"], "Unit 1 Trees");
    assert_eq!(questions[0]["attempt_count"], 0);
}

#[test]
fn set_type_accepts_labels_and_rejects_unknown() {
    let dir = initialized();
    mastery(dir.path())
        .args([
            "add-question",
            "--id",
            "Q1",
            "--text",
            "Define a heap.",
            "--topic",
            "Heaps",
        ])
        .assert()
        .success();

    mastery(dir.path())
        .args(["set-type", "Q1", "定義題"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Q1: definition (定義題)"));

    mastery(dir.path())
        .args(["set-type", "Q1", "essay"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid question type: essay"));

    mastery(dir.path())
        .args(["set-type", "Q404", "choice"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("question not found: Q404"));
}

#[test]
fn progress_for_unknown_student_fails() {
    let dir = initialized();

    mastery(dir.path())
        .args(["progress", "nobody"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("student not found: nobody"));
}

#[test]
fn progress_rejects_unknown_format() {
    let dir = initialized();
    mastery(dir.path()).args(["enroll", "S1"]).assert().success();

    mastery(dir.path())
        .args(["progress", "S1", "--format", "yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown format: yaml"));
}

#[test]
fn topics_lists_every_subtopic() {
    let dir = initialized();

    mastery(dir.path())
        .args(["topics", "--format", "markdown"])
        .assert()
        .success()
        .stdout(predicate::str::contains("| Unit 1 Trees | Binary trees | 0 | 0.00% |"))
        .stdout(predicate::str::contains(
            "| Unit 2 Hashing | Collision resolution | 0 | 0.00% |",
        ));
}

#[test]
fn reset_requires_a_target() {
    let dir = initialized();

    mastery(dir.path())
        .arg("reset")
        .assert()
        .failure()
        .stderr(predicate::str::contains("nothing to reset"));
}
