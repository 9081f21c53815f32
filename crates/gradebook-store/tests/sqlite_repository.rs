//! Repository behaviour against a real SQLite database.

use chrono::NaiveDate;
use rusqlite::Connection;

use gradebook_core::repository::SkipReason;
use gradebook_core::{
    Evaluation, EvaluationKind, EvaluationRepository, ImportMode, PersistenceGateway, Removal,
    RepositoryError,
};
use gradebook_store::SqliteGateway;

fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, month, day).unwrap()
}

fn samples() -> Vec<Evaluation> {
    vec![
        Evaluation::exam("Matematicas Basicas", date(6, 15), 85.5, 60, 20).unwrap(),
        Evaluation::assignment(
            "Ensayo Literatura",
            date(6, 20),
            92.0,
            10,
            "La importancia del realismo mágico",
        )
        .unwrap(),
        Evaluation::presentation("Proyecto Final", date(6, 25), 78.0, 30, 50).unwrap(),
    ]
}

fn open_repo(path: &std::path::Path) -> EvaluationRepository<SqliteGateway> {
    let mut repo = EvaluationRepository::new(SqliteGateway::open(path));
    let report = repo.initialize();
    assert!(!report.is_degraded(), "{:?}", report.store_error);
    repo
}

#[test]
fn evaluations_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grades.db");

    {
        let mut repo = open_repo(&path);
        for evaluation in samples() {
            repo.add(evaluation).unwrap();
        }
    }

    let repo = open_repo(&path);
    assert_eq!(repo.evaluations(), samples().as_slice());
    assert_eq!(repo.best().unwrap().name(), "Ensayo Literatura");
}

#[test]
fn update_and_remove_persist() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grades.db");

    {
        let mut repo = open_repo(&path);
        for evaluation in samples() {
            repo.add(evaluation).unwrap();
        }
        let retake = Evaluation::exam("Matematicas Basicas", date(6, 15), 90.0, 60, 20).unwrap();
        repo.update("Matematicas Basicas", retake).unwrap();

        // Change kind: presentation becomes an assignment.
        let written =
            Evaluation::assignment("Proyecto Escrito", date(6, 25), 80.0, 20, "Informe").unwrap();
        repo.update("Proyecto Final", written).unwrap();

        assert_eq!(
            repo.remove_by_name("Ensayo Literatura").unwrap(),
            Removal::Removed
        );
    }

    let repo = open_repo(&path);
    assert_eq!(repo.len(), 2);
    assert_eq!(
        repo.find_by_name("Matematicas Basicas")
            .unwrap()
            .base_score(),
        90.0
    );
    let written = repo.find_by_name("Proyecto Escrito").unwrap();
    assert_eq!(written.kind(), EvaluationKind::Assignment);
    assert_eq!(written.topic(), Some("Informe"));

    let conn = Connection::open(&path).unwrap();
    let presentations: i64 = conn
        .query_row("SELECT COUNT(*) FROM presentations", [], |row| row.get(0))
        .unwrap();
    assert_eq!(presentations, 0);
}

#[test]
fn stale_session_cannot_reuse_a_topic() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grades.db");

    let mut first = open_repo(&path);
    let mut second = open_repo(&path);

    first
        .add(Evaluation::assignment("Essay A", date(6, 20), 92.0, 10, "Realism").unwrap())
        .unwrap();

    let clash = Evaluation::assignment("Essay B", date(6, 21), 80.0, 5, "Realism").unwrap();
    assert!(matches!(
        second.add(clash),
        Err(RepositoryError::DuplicateTopic(ref t)) if t == "Realism"
    ));

    let talk = Evaluation::presentation("Talk", date(6, 22), 70.0, 20, 30).unwrap();
    second.add(talk).unwrap();
    let retitled = Evaluation::assignment("Talk", date(6, 22), 70.0, 5, "Realism").unwrap();
    assert!(matches!(
        second.update("Talk", retitled),
        Err(RepositoryError::DuplicateTopic(_))
    ));

    let reopened = open_repo(&path);
    let topics: Vec<_> = reopened
        .evaluations()
        .iter()
        .filter_map(|e| e.topic())
        .collect();
    assert_eq!(topics, vec!["Realism"]);
    assert_eq!(reopened.len(), 2);
}

#[test]
fn clear_all_empties_every_table() {
    let gateway = SqliteGateway::in_memory();
    let mut repo = EvaluationRepository::new(gateway);
    repo.initialize();
    for evaluation in samples() {
        repo.add(evaluation).unwrap();
    }

    repo.clear_all().unwrap();
    repo.clear_all().unwrap();
    assert!(repo.is_empty());

    let mut conn = repo.gateway().connect().unwrap();
    assert!(conn.query_all_with_details().unwrap().is_empty());
}

#[test]
fn missing_directory_degrades_repository() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no-such-dir").join("grades.db");

    let mut repo = EvaluationRepository::new(SqliteGateway::open(&path));
    let report = repo.initialize();
    assert!(report.is_degraded());
    assert!(!repo.is_store_available());

    let err = repo.add(samples().remove(0)).unwrap_err();
    assert!(matches!(err, RepositoryError::StoreUnavailable(_)));
}

#[test]
fn legacy_rows_load_and_broken_rows_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");

    // Create the schema, then write rows the way older versions did.
    drop(open_repo(&path));
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "INSERT INTO evaluations (id, name, date, score, kind)
             VALUES (1, 'Examen Parcial', '2025-06-15', 85.5, 'Examen');
         INSERT INTO exams (evaluation_id, duration_minutes, num_questions) VALUES (1, 60, 20);
         INSERT INTO evaluations (id, name, date, score, kind)
             VALUES (2, 'Charla', '2025-06-25', 78.0, 'Presentacion');
         INSERT INTO presentations (evaluation_id, duration_minutes, audience_size)
             VALUES (2, 30, 50);
         INSERT INTO evaluations (id, name, date, score, kind)
             VALUES (3, 'Sin Detalle', '2025-06-20', 92.0, 'Trabajo');
         INSERT INTO evaluations (id, name, date, score, kind)
             VALUES (4, 'Fecha Rota', '20/06/2025', 92.0, 'Examen');
         INSERT INTO exams (evaluation_id, duration_minutes, num_questions) VALUES (4, 60, 20);",
    )
    .unwrap();
    drop(conn);

    let mut repo = EvaluationRepository::new(SqliteGateway::open(&path));
    let report = repo.initialize();

    assert_eq!(report.loaded, 2);
    assert_eq!(
        repo.find_by_name("Examen Parcial").unwrap().kind(),
        EvaluationKind::Exam
    );
    assert_eq!(
        repo.find_by_name("Charla").unwrap().kind(),
        EvaluationKind::Presentation
    );

    let skipped: Vec<_> = report
        .skipped
        .iter()
        .map(|s| (s.id, s.reason.clone()))
        .collect();
    assert_eq!(
        skipped,
        vec![
            (3, SkipReason::MissingDetail(EvaluationKind::Assignment)),
            (4, SkipReason::InvalidDate("20/06/2025".into())),
        ]
    );

    // A skipped row still blocks its name.
    let reuse = Evaluation::assignment("Sin Detalle", date(6, 20), 92.0, 5, "Nuevo").unwrap();
    assert!(matches!(
        repo.add(reuse),
        Err(RepositoryError::DuplicateName(_))
    ));
}

#[test]
fn import_and_export_through_sqlite() {
    let mut repo = EvaluationRepository::new(SqliteGateway::in_memory());
    repo.initialize();

    let records: Vec<_> = samples()
        .iter()
        .map(gradebook_core::EvaluationRecord::from)
        .collect();
    let report = repo.import(&records, ImportMode::Replace).unwrap();
    assert_eq!(report.imported, 3);

    assert_eq!(repo.export(), records);

    // Re-importing the same records in append mode rejects every one.
    let report = repo.import(&records, ImportMode::Append).unwrap();
    assert_eq!(report.imported, 0);
    assert_eq!(report.rejected.len(), 3);
}
