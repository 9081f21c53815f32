//! In-memory persistence gateway.
//!
//! Satisfies the gateway contract without any external store: each
//! connection works on a copy of the tables and `commit` publishes it.
//! Faults can be injected per operation to exercise rollback paths.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;

use crate::error::StoreError;
use crate::gateway::{GatewayConnection, GatewayOp, PersistenceGateway, RecordId, StoredRow};
use crate::model::{EvaluationDetails, EvaluationKind};

#[derive(Debug, Clone)]
struct BaseRow {
    name: String,
    date: String,
    base_score: f64,
    kind_tag: String,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    next_id: RecordId,
    base: BTreeMap<RecordId, BaseRow>,
    exams: BTreeMap<RecordId, (i64, i64)>,
    assignments: BTreeMap<RecordId, (i64, String)>,
    presentations: BTreeMap<RecordId, (i64, i64)>,
}

impl Tables {
    fn allocate_id(&mut self) -> RecordId {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
struct Faults {
    unreachable: bool,
    failing: HashSet<GatewayOp>,
}

/// Transactional in-memory gateway.
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    tables: Mutex<Tables>,
    faults: Mutex<Faults>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `connect` fail as if the store were offline.
    pub fn set_unreachable(&self, unreachable: bool) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.unreachable = unreachable;
        }
    }

    /// Make every future call of `op` fail.
    pub fn fail_on(&self, op: GatewayOp) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.failing.insert(op);
        }
    }

    /// Remove all injected faults.
    pub fn clear_faults(&self) {
        if let Ok(mut faults) = self.faults.lock() {
            *faults = Faults::default();
        }
    }

    /// Insert a row as-is, bypassing validation. Detail columns that are
    /// `None` produce no detail row, mimicking a partially written record.
    pub fn seed_raw_row(&self, row: StoredRow) -> RecordId {
        let mut tables = match self.tables.lock() {
            Ok(tables) => tables,
            Err(poisoned) => poisoned.into_inner(),
        };
        let id = tables.allocate_id();
        tables.base.insert(
            id,
            BaseRow {
                name: row.name,
                date: row.date,
                base_score: row.base_score,
                kind_tag: row.kind_tag,
            },
        );
        if let (Some(d), Some(q)) = (row.exam_duration_minutes, row.exam_num_questions) {
            tables.exams.insert(id, (d, q));
        }
        if let (Some(p), Some(t)) = (row.assignment_page_count, row.assignment_topic) {
            tables.assignments.insert(id, (p, t));
        }
        if let (Some(d), Some(a)) = (
            row.presentation_duration_minutes,
            row.presentation_audience_size,
        ) {
            tables.presentations.insert(id, (d, a));
        }
        id
    }

    /// Number of committed base rows.
    pub fn base_row_count(&self) -> usize {
        self.tables.lock().map(|t| t.base.len()).unwrap_or(0)
    }

    /// Number of committed detail rows across all kinds.
    pub fn detail_row_count(&self) -> usize {
        self.tables
            .lock()
            .map(|t| t.exams.len() + t.assignments.len() + t.presentations.len())
            .unwrap_or(0)
    }

    /// Committed base-row names in id order.
    pub fn stored_names(&self) -> Vec<String> {
        self.tables
            .lock()
            .map(|t| t.base.values().map(|row| row.name.clone()).collect())
            .unwrap_or_default()
    }

    fn check(&self, op: GatewayOp) -> Result<(), StoreError> {
        let faults = self
            .faults
            .lock()
            .map_err(|_| StoreError::Connection("fault table poisoned".into()))?;
        if faults.failing.contains(&op) {
            return Err(StoreError::operation(op.name(), "injected failure"));
        }
        Ok(())
    }
}

impl PersistenceGateway for InMemoryGateway {
    fn connect(&self) -> Result<Box<dyn GatewayConnection + '_>, StoreError> {
        {
            let faults = self
                .faults
                .lock()
                .map_err(|_| StoreError::Connection("fault table poisoned".into()))?;
            if faults.unreachable || faults.failing.contains(&GatewayOp::Connect) {
                return Err(StoreError::Connection("in-memory store is offline".into()));
            }
        }
        let guard = self
            .tables
            .lock()
            .map_err(|_| StoreError::Connection("store lock poisoned".into()))?;
        let working = guard.clone();
        tracing::debug!("in-memory transaction started");
        Ok(Box::new(MemoryConnection {
            gateway: self,
            committed: guard,
            working,
        }))
    }
}

/// Holds the table lock for the lifetime of the transaction.
struct MemoryConnection<'a> {
    gateway: &'a InMemoryGateway,
    committed: MutexGuard<'a, Tables>,
    working: Tables,
}

impl GatewayConnection for MemoryConnection<'_> {
    fn insert_base(
        &mut self,
        name: &str,
        date: NaiveDate,
        base_score: f64,
        kind: EvaluationKind,
    ) -> Result<RecordId, StoreError> {
        self.gateway.check(GatewayOp::InsertBase)?;
        let id = self.working.allocate_id();
        self.working.base.insert(
            id,
            BaseRow {
                name: name.to_string(),
                date: date.to_string(),
                base_score,
                kind_tag: kind.tag().to_string(),
            },
        );
        Ok(id)
    }

    fn insert_detail(
        &mut self,
        id: RecordId,
        details: &EvaluationDetails,
    ) -> Result<(), StoreError> {
        self.gateway.check(GatewayOp::InsertDetail)?;
        if !self.working.base.contains_key(&id) {
            return Err(StoreError::operation(
                GatewayOp::InsertDetail.name(),
                format!("no base row with id {id}"),
            ));
        }
        match details {
            EvaluationDetails::Exam {
                duration_minutes,
                num_questions,
            } => {
                self.working.exams.insert(
                    id,
                    (i64::from(*duration_minutes), i64::from(*num_questions)),
                );
            }
            EvaluationDetails::Assignment { page_count, topic } => {
                self.working
                    .assignments
                    .insert(id, (i64::from(*page_count), topic.clone()));
            }
            EvaluationDetails::Presentation {
                duration_minutes,
                audience_size,
            } => {
                self.working.presentations.insert(
                    id,
                    (i64::from(*duration_minutes), i64::from(*audience_size)),
                );
            }
        }
        Ok(())
    }

    fn delete_detail(&mut self, kind: EvaluationKind, id: RecordId) -> Result<(), StoreError> {
        self.gateway.check(GatewayOp::DeleteDetail)?;
        match kind {
            EvaluationKind::Exam => {
                self.working.exams.remove(&id);
            }
            EvaluationKind::Assignment => {
                self.working.assignments.remove(&id);
            }
            EvaluationKind::Presentation => {
                self.working.presentations.remove(&id);
            }
        }
        Ok(())
    }

    fn delete_base(&mut self, id: RecordId) -> Result<(), StoreError> {
        self.gateway.check(GatewayOp::DeleteBase)?;
        self.working.base.remove(&id);
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
        self.gateway.check(GatewayOp::UpdateBase)?;
        let row = self.working.base.get_mut(&id).ok_or_else(|| {
            StoreError::operation(GatewayOp::UpdateBase.name(), format!("no base row with id {id}"))
        })?;
        row.name = name.to_string();
        row.date = date.to_string();
        row.base_score = base_score;
        row.kind_tag = kind.tag().to_string();
        Ok(())
    }

    fn query_all_with_details(&mut self) -> Result<Vec<StoredRow>, StoreError> {
        self.gateway.check(GatewayOp::QueryAll)?;
        let tables = &self.working;
        Ok(tables
            .base
            .iter()
            .map(|(id, row)| {
                let exam = tables.exams.get(id);
                let assignment = tables.assignments.get(id);
                let presentation = tables.presentations.get(id);
                StoredRow {
                    id: *id,
                    name: row.name.clone(),
                    date: row.date.clone(),
                    base_score: row.base_score,
                    kind_tag: row.kind_tag.clone(),
                    exam_duration_minutes: exam.map(|e| e.0),
                    exam_num_questions: exam.map(|e| e.1),
                    assignment_page_count: assignment.map(|a| a.0),
                    assignment_topic: assignment.map(|a| a.1.clone()),
                    presentation_duration_minutes: presentation.map(|p| p.0),
                    presentation_audience_size: presentation.map(|p| p.1),
                }
            })
            .collect())
    }

    fn find_id_by_name(&mut self, name: &str) -> Result<Option<RecordId>, StoreError> {
        self.gateway.check(GatewayOp::FindIdByName)?;
        Ok(self
            .working
            .base
            .iter()
            .find(|(_, row)| row.name == name)
            .map(|(id, _)| *id))
    }

    fn find_assignment_id_by_topic(
        &mut self,
        topic: &str,
    ) -> Result<Option<RecordId>, StoreError> {
        self.gateway.check(GatewayOp::FindIdByTopic)?;
        Ok(self
            .working
            .assignments
            .iter()
            .find(|(_, (_, stored))| stored == topic)
            .map(|(id, _)| *id))
    }

    fn clear_all(&mut self) -> Result<(), StoreError> {
        self.gateway.check(GatewayOp::ClearAll)?;
        self.working.exams.clear();
        self.working.assignments.clear();
        self.working.presentations.clear();
        self.working.base.clear();
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.gateway.check(GatewayOp::Commit)?;
        let MemoryConnection {
            mut committed,
            working,
            ..
        } = *self;
        *committed = working;
        tracing::debug!("in-memory transaction committed");
        Ok(())
    }

    fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        tracing::debug!("in-memory transaction rolled back");
        Ok(())
    }
}
