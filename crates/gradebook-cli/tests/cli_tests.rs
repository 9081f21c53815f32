//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A `gradebook` command isolated inside `dir`: no config file is found
/// and the database lives in the directory.
fn gradebook(dir: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("gradebook").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env_remove("GRADEBOOK_DATABASE")
        .env_remove("RUST_LOG")
        .arg("--database")
        .arg(dir.path().join("grades.db"));
    cmd
}

fn add_m1(dir: &TempDir) {
    gradebook(dir)
        .args([
            "add", "--name", "Midterm", "--date", "2025-06-15", "--score", "85.5", "--kind",
            "exam", "--duration", "60", "--questions", "20",
        ])
        .assert()
        .success();
}

fn add_essay(dir: &TempDir) {
    gradebook(dir)
        .args([
            "add",
            "--name",
            "Essay",
            "--date",
            "2025-06-20",
            "--score",
            "92",
            "--kind",
            "assignment",
            "--pages",
            "10",
            "--topic",
            "Magical realism",
        ])
        .assert()
        .success();
}

#[test]
fn add_prints_grade() {
    let dir = TempDir::new().unwrap();

    gradebook(&dir)
        .args([
            "add", "--name", "Midterm", "--date", "2025-06-15", "--score", "85.5", "--kind",
            "exam", "--duration", "60", "--questions", "20",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added 'Midterm' (Exam, grade 17.1)"));

    assert!(dir.path().join("grades.db").exists());
}

#[test]
fn add_duplicate_name_fails() {
    let dir = TempDir::new().unwrap();
    add_m1(&dir);

    gradebook(&dir)
        .args([
            "add", "--name", "Midterm", "--date", "2025-06-16", "--score", "50", "--kind",
            "presentation", "--duration", "20", "--audience", "10",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn add_rejects_invalid_input() {
    let dir = TempDir::new().unwrap();

    gradebook(&dir)
        .args([
            "add", "--name", "Quiz", "--date", "2025-06-15", "--score", "50", "--kind", "exam",
            "--duration", "10", "--questions", "20",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("duration_minutes"));

    gradebook(&dir)
        .args([
            "add", "--name", "M1", "--date", "2025-06-15", "--score", "50", "--kind", "exam",
            "--duration", "60", "--questions", "20",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 3 characters"));

    gradebook(&dir)
        .args([
            "add", "--name", "Talk", "--date", "2025-06-15", "--score", "50", "--kind",
            "presentation", "--duration", "20",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--audience is required"));

    gradebook(&dir)
        .args([
            "add", "--name", "Essay", "--date", "2025-06-20", "--score", "92", "--kind",
            "assignment", "--pages", "10", "--topic", "X",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("topic must be at least 3 characters"));
}

#[test]
fn list_and_filter() {
    let dir = TempDir::new().unwrap();
    add_m1(&dir);
    add_essay(&dir);

    gradebook(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Midterm"))
        .stdout(predicate::str::contains("Essay"))
        .stdout(predicate::str::contains("101.2"))
        .stdout(predicate::str::contains("2 evaluation(s)"));

    gradebook(&dir)
        .args(["list", "--kind", "assignment"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Essay"))
        .stdout(predicate::str::contains("Midterm").not());

    gradebook(&dir)
        .args(["list", "--kind", "presentation"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No presentation evaluations."));
}

#[test]
fn show_and_update() {
    let dir = TempDir::new().unwrap();
    add_m1(&dir);

    gradebook(&dir)
        .args(["show", "--name", "Midterm"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Questions:  20"))
        .stdout(predicate::str::contains("Grade:      17.1"));

    gradebook(&dir)
        .args([
            "update",
            "--original",
            "Midterm",
            "--name",
            "Midterm",
            "--date",
            "2025-06-15",
            "--score",
            "90",
            "--kind",
            "exam",
            "--duration",
            "60",
            "--questions",
            "20",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated 'Midterm' (Exam, grade 18.0)"));

    gradebook(&dir)
        .args(["show", "--name", "Midterm"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Base score: 90.0"));

    gradebook(&dir)
        .args(["show", "--name", "Nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn update_missing_original_fails() {
    let dir = TempDir::new().unwrap();

    gradebook(&dir)
        .args([
            "update", "--original", "Ghost", "--name", "Ghost", "--date", "2025-06-15",
            "--score", "90", "--kind", "exam", "--duration", "60", "--questions", "20",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn remove_present_and_absent() {
    let dir = TempDir::new().unwrap();
    add_m1(&dir);

    gradebook(&dir)
        .args(["remove", "--name", "Midterm"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 'Midterm'"));

    gradebook(&dir)
        .args(["remove", "--name", "Midterm"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No evaluation named 'Midterm'"));
}

#[test]
fn stats_formats() {
    let dir = TempDir::new().unwrap();
    add_m1(&dir);
    add_essay(&dir);

    gradebook(&dir)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Evaluations:   2"))
        .stdout(predicate::str::contains("Best:          Essay (101.2)"));

    gradebook(&dir)
        .args(["stats", "--format", "markdown"])
        .assert()
        .success()
        .stdout(predicate::str::contains("| Presentation | 0 | 0.0 | N/A |"));

    let output = gradebook(&dir)
        .args(["stats", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["total"], 2);
    assert_eq!(json["best_name"], "Essay");
    assert_eq!(json["per_kind"].as_array().unwrap().len(), 3);

    gradebook(&dir)
        .args(["stats", "--format", "yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown format"));
}

#[test]
fn stats_on_empty_database() {
    let dir = TempDir::new().unwrap();

    gradebook(&dir)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Average grade: 0.0"))
        .stdout(predicate::str::contains("Best:          N/A"));
}

#[test]
fn clear_requires_confirmation() {
    let dir = TempDir::new().unwrap();
    add_m1(&dir);

    gradebook(&dir)
        .arg("clear")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));

    gradebook(&dir)
        .args(["clear", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared 1 evaluation(s)"));

    gradebook(&dir)
        .args(["clear", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared 0 evaluation(s)"));

    gradebook(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No evaluations."));
}

#[test]
fn init_then_import_samples() {
    let dir = TempDir::new().unwrap();

    gradebook(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created gradebook.toml"))
        .stdout(predicate::str::contains(
            "Created data/sample-evaluations.json",
        ));
    assert!(dir.path().join("gradebook.toml").exists());

    gradebook(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));

    gradebook(&dir)
        .args(["import", "--file", "data/sample-evaluations.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 4 evaluation(s), rejected 0"));

    gradebook(&dir)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Evaluations:   4"))
        .stdout(predicate::str::contains("Ensayo Literatura (101.2)"));
}

#[test]
fn import_reports_rejections() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("legacy.json");
    std::fs::write(
        &file,
        r#"[
  {"nombre": "Examen Final", "fecha": "2025-07-01", "puntaje": 95.0, "tipo": "Examen",
   "duracion_min": 90, "num_preguntas": 30},
  {"nombre": "Examen Final", "fecha": "2025-07-02", "puntaje": 50.0, "tipo": "Examen",
   "duracion_min": 60, "num_preguntas": 10},
  {"nombre": "Sin Tema", "fecha": "2025-07-03", "puntaje": 70.0, "tipo": "Trabajo",
   "num_paginas": 5}
]"#,
    )
    .unwrap();

    gradebook(&dir)
        .arg("import")
        .arg("--file")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1 evaluation(s), rejected 2"))
        .stdout(predicate::str::contains("#2 'Examen Final'"))
        .stdout(predicate::str::contains("#3 'Sin Tema': invalid topic"));
}

#[test]
fn import_append_keeps_existing() {
    let dir = TempDir::new().unwrap();
    add_m1(&dir);
    add_essay(&dir);

    let file = dir.path().join("export.json");
    gradebook(&dir)
        .arg("export")
        .arg("--file")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 2 evaluation(s)"));

    gradebook(&dir)
        .args(["remove", "--name", "Essay"])
        .assert()
        .success();

    gradebook(&dir)
        .arg("import")
        .arg("--file")
        .arg(&file)
        .arg("--append")
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1 evaluation(s), rejected 1"));

    gradebook(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 evaluation(s)"));
}

#[test]
fn import_nonexistent_file() {
    let dir = TempDir::new().unwrap();

    gradebook(&dir)
        .args(["import", "--file", "no_such_file.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn report_writes_html() {
    let dir = TempDir::new().unwrap();
    add_m1(&dir);

    let output = dir.path().join("out").join("report.html");
    gradebook(&dir)
        .arg("report")
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("HTML report"));

    let html = std::fs::read_to_string(&output).unwrap();
    assert!(html.contains("Midterm"));
}

#[test]
fn report_defaults_to_report_dir() {
    let dir = TempDir::new().unwrap();

    gradebook(&dir).arg("report").assert().success();
    assert!(dir
        .path()
        .join("gradebook-reports")
        .join("gradebook-report.html")
        .exists());
}

#[test]
fn unreachable_database_rejects_changes() {
    let dir = TempDir::new().unwrap();

    #[allow(deprecated)]
    Command::cargo_bin("gradebook")
        .unwrap()
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .env_remove("GRADEBOOK_DATABASE")
        .arg("--database")
        .arg(dir.path().join("missing").join("grades.db"))
        .args([
            "add", "--name", "Midterm", "--date", "2025-06-15", "--score", "85.5", "--kind",
            "exam", "--duration", "60", "--questions", "20",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Warning: cannot open"))
        .stderr(predicate::str::contains("store unavailable"));
}

#[test]
fn database_from_environment() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("env.db");

    #[allow(deprecated)]
    Command::cargo_bin("gradebook")
        .unwrap()
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .env("GRADEBOOK_DATABASE", &db)
        .args([
            "add", "--name", "Midterm", "--date", "2025-06-15", "--score", "85.5", "--kind",
            "exam", "--duration", "60", "--questions", "20",
        ])
        .assert()
        .success();

    assert!(db.exists());
}

#[test]
fn help_output() {
    let dir = TempDir::new().unwrap();

    gradebook(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Track academic evaluations and their grades",
        ));
}

#[test]
fn version_output() {
    let dir = TempDir::new().unwrap();

    gradebook(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("gradebook"));
}
