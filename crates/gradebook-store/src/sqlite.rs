//! SQLite-backed persistence gateway.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use gradebook_core::gateway::{
    GatewayConnection, GatewayOp, PersistenceGateway, RecordId, StoredRow,
};
use gradebook_core::{EvaluationDetails, EvaluationKind, StoreError};

use crate::error::{open_failed, operation_failed};
use crate::migrations::Migrator;

const SELECT_ALL: &str = "
    SELECT e.id, e.name, e.date, e.score, e.kind,
           x.duration_minutes, x.num_questions,
           a.page_count, a.topic,
           p.duration_minutes, p.audience_size
    FROM evaluations e
    LEFT JOIN exams x ON x.evaluation_id = e.id
    LEFT JOIN assignments a ON a.evaluation_id = e.id
    LEFT JOIN presentations p ON p.evaluation_id = e.id
    ORDER BY e.id";

#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    Memory,
}

/// Gateway over one SQLite database.
///
/// The database is opened and migrated on the first `connect`, so a bad
/// path shows up as a connection failure rather than at construction.
/// A failed open is retried on the next `connect`.
pub struct SqliteGateway {
    location: Location,
    conn: Mutex<Option<Connection>>,
}

impl SqliteGateway {
    /// Gateway for the database file at `path`, created if missing.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            location: Location::File(path.into()),
            conn: Mutex::new(None),
        }
    }

    /// Private in-memory database (for testing)
    pub fn in_memory() -> Self {
        Self {
            location: Location::Memory,
            conn: Mutex::new(None),
        }
    }

    /// The database file, or `None` for an in-memory database.
    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            Location::File(path) => Some(path),
            Location::Memory => None,
        }
    }

    fn open_connection(&self) -> Result<Connection, StoreError> {
        let conn = match &self.location {
            Location::File(path) => Connection::open(path)
                .map_err(|e| open_failed(&format!("opening {}", path.display()), e))?,
            Location::Memory => Connection::open_in_memory()
                .map_err(|e| open_failed("opening in-memory database", e))?,
        };
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| open_failed("enabling foreign keys", e))?;
        Migrator::new(&conn).migrate()?;
        tracing::debug!(location = ?self.location, "opened database");
        Ok(conn)
    }
}

impl PersistenceGateway for SqliteGateway {
    fn connect(&self) -> Result<Box<dyn GatewayConnection + '_>, StoreError> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| StoreError::Connection("connection lock poisoned".into()))?;
        if guard.is_none() {
            *guard = Some(self.open_connection()?);
        }

        let mut connection = SqliteConnection {
            guard,
            finished: false,
        };
        let begin = connection.conn()?.execute_batch("BEGIN IMMEDIATE");
        if let Err(err) = begin {
            // Nothing to roll back.
            connection.finished = true;
            return Err(operation_failed(GatewayOp::Connect)(err));
        }
        tracing::debug!("transaction started");
        Ok(Box::new(connection))
    }
}

/// An open transaction. Holds the gateway lock until dropped.
struct SqliteConnection<'a> {
    guard: MutexGuard<'a, Option<Connection>>,
    finished: bool,
}

impl SqliteConnection<'_> {
    fn conn(&self) -> Result<&Connection, StoreError> {
        self.guard
            .as_ref()
            .ok_or_else(|| StoreError::Connection("database is not open".into()))
    }

    fn end(&mut self, sql: &str, op: GatewayOp) -> Result<(), StoreError> {
        self.conn()?
            .execute_batch(sql)
            .map_err(operation_failed(op))?;
        self.finished = true;
        Ok(())
    }
}

fn detail_table(kind: EvaluationKind) -> &'static str {
    match kind {
        EvaluationKind::Exam => "exams",
        EvaluationKind::Assignment => "assignments",
        EvaluationKind::Presentation => "presentations",
    }
}

fn date_text(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn row_to_stored(row: &rusqlite::Row) -> Result<StoredRow, rusqlite::Error> {
    Ok(StoredRow {
        id: row.get(0)?,
        name: row.get(1)?,
        date: row.get(2)?,
        base_score: row.get(3)?,
        kind_tag: row.get(4)?,
        exam_duration_minutes: row.get(5)?,
        exam_num_questions: row.get(6)?,
        assignment_page_count: row.get(7)?,
        assignment_topic: row.get(8)?,
        presentation_duration_minutes: row.get(9)?,
        presentation_audience_size: row.get(10)?,
    })
}

impl GatewayConnection for SqliteConnection<'_> {
    fn insert_base(
        &mut self,
        name: &str,
        date: NaiveDate,
        base_score: f64,
        kind: EvaluationKind,
    ) -> Result<RecordId, StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO evaluations (name, date, score, kind) VALUES (?1, ?2, ?3, ?4)",
            params![name, date_text(date), base_score, kind.tag()],
        )
        .map_err(operation_failed(GatewayOp::InsertBase))?;
        Ok(conn.last_insert_rowid())
    }

    fn insert_detail(
        &mut self,
        id: RecordId,
        details: &EvaluationDetails,
    ) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let result = match details {
            EvaluationDetails::Exam {
                duration_minutes,
                num_questions,
            } => conn.execute(
                "INSERT INTO exams (evaluation_id, duration_minutes, num_questions)
                 VALUES (?1, ?2, ?3)",
                params![id, duration_minutes, num_questions],
            ),
            EvaluationDetails::Assignment { page_count, topic } => conn.execute(
                "INSERT INTO assignments (evaluation_id, page_count, topic) VALUES (?1, ?2, ?3)",
                params![id, page_count, topic],
            ),
            EvaluationDetails::Presentation {
                duration_minutes,
                audience_size,
            } => conn.execute(
                "INSERT INTO presentations (evaluation_id, duration_minutes, audience_size)
                 VALUES (?1, ?2, ?3)",
                params![id, duration_minutes, audience_size],
            ),
        };
        result.map_err(operation_failed(GatewayOp::InsertDetail))?;
        Ok(())
    }

    fn delete_detail(&mut self, kind: EvaluationKind, id: RecordId) -> Result<(), StoreError> {
        let sql = format!("DELETE FROM {} WHERE evaluation_id = ?1", detail_table(kind));
        self.conn()?
            .execute(&sql, [id])
            .map_err(operation_failed(GatewayOp::DeleteDetail))?;
        Ok(())
    }

    fn delete_base(&mut self, id: RecordId) -> Result<(), StoreError> {
        self.conn()?
            .execute("DELETE FROM evaluations WHERE id = ?1", [id])
            .map_err(operation_failed(GatewayOp::DeleteBase))?;
        Ok(())
    }

    fn update_base(
        &mut self,
        id: RecordId,
        name: &str,
        date: NaiveDate,
        base_score: f64,
        kind: EvaluationKind,
    ) -> Result<(), StoreError> {
        let changed = self
            .conn()?
            .execute(
                "UPDATE evaluations SET name = ?2, date = ?3, score = ?4, kind = ?5 WHERE id = ?1",
                params![id, name, date_text(date), base_score, kind.tag()],
            )
            .map_err(operation_failed(GatewayOp::UpdateBase))?;
        if changed == 0 {
            return Err(StoreError::operation(
                GatewayOp::UpdateBase.name(),
                format!("no evaluation with id {id}"),
            ));
        }
        Ok(())
    }

    fn query_all_with_details(&mut self) -> Result<Vec<StoredRow>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(SELECT_ALL)
            .map_err(operation_failed(GatewayOp::QueryAll))?;
        let rows = stmt
            .query_map([], row_to_stored)
            .map_err(operation_failed(GatewayOp::QueryAll))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(operation_failed(GatewayOp::QueryAll))?;
        Ok(rows)
    }

    fn find_id_by_name(&mut self, name: &str) -> Result<Option<RecordId>, StoreError> {
        self.conn()?
            .query_row(
                "SELECT id FROM evaluations WHERE name = ?1 ORDER BY id LIMIT 1",
                [name],
                |row| row.get(0),
            )
            .optional()
            .map_err(operation_failed(GatewayOp::FindIdByName))
    }

    fn find_assignment_id_by_topic(
        &mut self,
        topic: &str,
    ) -> Result<Option<RecordId>, StoreError> {
        self.conn()?
            .query_row(
                "SELECT evaluation_id FROM assignments WHERE topic = ?1 ORDER BY evaluation_id LIMIT 1",
                [topic],
                |row| row.get(0),
            )
            .optional()
            .map_err(operation_failed(GatewayOp::FindIdByTopic))
    }

    fn clear_all(&mut self) -> Result<(), StoreError> {
        self.conn()?
            .execute_batch(
                "DELETE FROM exams;
                 DELETE FROM assignments;
                 DELETE FROM presentations;
                 DELETE FROM evaluations;",
            )
            .map_err(operation_failed(GatewayOp::ClearAll))
    }

    fn commit(mut self: Box<Self>) -> Result<(), StoreError> {
        self.end("COMMIT", GatewayOp::Commit)?;
        tracing::debug!("transaction committed");
        Ok(())
    }

    fn rollback(mut self: Box<Self>) -> Result<(), StoreError> {
        self.end("ROLLBACK", GatewayOp::Rollback)
    }
}

impl Drop for SqliteConnection<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Some(conn) = self.guard.as_ref() {
            if let Err(err) = conn.execute_batch("ROLLBACK") {
                tracing::warn!(error = %err, "rollback on drop failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 20).unwrap()
    }

    fn essay() -> EvaluationDetails {
        EvaluationDetails::Assignment {
            page_count: 10,
            topic: "Realism".into(),
        }
    }

    #[test]
    fn committed_rows_join_with_details() {
        let gateway = SqliteGateway::in_memory();
        let mut conn = gateway.connect().unwrap();
        let id = conn
            .insert_base("Essay", date(), 92.0, EvaluationKind::Assignment)
            .unwrap();
        conn.insert_detail(id, &essay()).unwrap();
        conn.commit().unwrap();

        let mut conn = gateway.connect().unwrap();
        let rows = conn.query_all_with_details().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, id);
        assert_eq!(rows[0].date, "2025-06-20");
        assert_eq!(rows[0].kind_tag, "Assignment");
        assert_eq!(rows[0].assignment_page_count, Some(10));
        assert_eq!(rows[0].assignment_topic.as_deref(), Some("Realism"));
        assert!(rows[0].exam_duration_minutes.is_none());
        assert_eq!(conn.find_id_by_name("Essay").unwrap(), Some(id));
        assert_eq!(conn.find_id_by_name("essay").unwrap(), None);
        assert_eq!(conn.find_assignment_id_by_topic("Realism").unwrap(), Some(id));
        assert_eq!(conn.find_assignment_id_by_topic("realism").unwrap(), None);
    }

    #[test]
    fn dropped_connection_rolls_back() {
        let gateway = SqliteGateway::in_memory();
        {
            let mut conn = gateway.connect().unwrap();
            conn.insert_base("Essay", date(), 92.0, EvaluationKind::Assignment)
                .unwrap();
        }
        let mut conn = gateway.connect().unwrap();
        assert!(conn.query_all_with_details().unwrap().is_empty());
    }

    #[test]
    fn explicit_rollback_discards_work() {
        let gateway = SqliteGateway::in_memory();
        let mut conn = gateway.connect().unwrap();
        conn.insert_base("Essay", date(), 92.0, EvaluationKind::Assignment)
            .unwrap();
        conn.rollback().unwrap();

        let mut conn = gateway.connect().unwrap();
        assert_eq!(conn.find_id_by_name("Essay").unwrap(), None);
    }

    #[test]
    fn detail_for_missing_base_fails() {
        let gateway = SqliteGateway::in_memory();
        let mut conn = gateway.connect().unwrap();
        let err = conn.insert_detail(42, &essay()).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Operation {
                operation: "insert_detail",
                ..
            }
        ));
    }

    #[test]
    fn update_of_missing_row_fails() {
        let gateway = SqliteGateway::in_memory();
        let mut conn = gateway.connect().unwrap();
        assert!(conn
            .update_base(7, "Nope", date(), 50.0, EvaluationKind::Exam)
            .is_err());
    }

    #[test]
    fn delete_details_then_base() {
        let gateway = SqliteGateway::in_memory();
        let mut conn = gateway.connect().unwrap();
        let id = conn
            .insert_base("Essay", date(), 92.0, EvaluationKind::Assignment)
            .unwrap();
        conn.insert_detail(id, &essay()).unwrap();
        conn.delete_details(id).unwrap();
        conn.delete_base(id).unwrap();
        assert!(conn.query_all_with_details().unwrap().is_empty());
        conn.clear_all().unwrap();
        conn.commit().unwrap();
    }

    #[test]
    fn missing_directory_is_unreachable() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = SqliteGateway::open(dir.path().join("missing").join("grades.db"));
        assert!(matches!(
            gateway.connect().err(),
            Some(StoreError::Connection(_))
        ));
        assert!(gateway.path().is_some());
    }
}
