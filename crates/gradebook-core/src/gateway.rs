//! Persistence gateway traits.
//!
//! The durable store keeps one base row per evaluation plus one detail row
//! in the table for its kind. Implemented by `gradebook-store` (SQLite) and
//! by `memory::InMemoryGateway`.

use chrono::NaiveDate;

use crate::error::StoreError;
use crate::model::{EvaluationDetails, EvaluationKind};

/// Identifier the store assigns to a base row.
pub type RecordId = i64;

/// A durable store that hands out transaction-scoped connections.
pub trait PersistenceGateway {
    /// Open a connection with a fresh transaction.
    ///
    /// Fails with `StoreError::Connection` when the store is unreachable.
    fn connect(&self) -> Result<Box<dyn GatewayConnection + '_>, StoreError>;
}

/// One open transaction against the store.
///
/// Dropping a connection without calling `commit` rolls the transaction back.
pub trait GatewayConnection {
    /// Insert a base row and return its generated id.
    fn insert_base(
        &mut self,
        name: &str,
        date: NaiveDate,
        base_score: f64,
        kind: EvaluationKind,
    ) -> Result<RecordId, StoreError>;

    /// Insert the detail row for `id` into the table matching the details' kind.
    fn insert_detail(&mut self, id: RecordId, details: &EvaluationDetails)
        -> Result<(), StoreError>;

    /// Delete the detail row for `id` from one kind's table.
    fn delete_detail(&mut self, kind: EvaluationKind, id: RecordId) -> Result<(), StoreError>;

    /// Delete the detail rows for `id` from every kind's table.
    fn delete_details(&mut self, id: RecordId) -> Result<(), StoreError> {
        for kind in EvaluationKind::ALL {
            self.delete_detail(kind, id)?;
        }
        Ok(())
    }

    fn delete_base(&mut self, id: RecordId) -> Result<(), StoreError>;

    fn update_base(
        &mut self,
        id: RecordId,
        name: &str,
        date: NaiveDate,
        base_score: f64,
        kind: EvaluationKind,
    ) -> Result<(), StoreError>;

    /// All base rows left-joined with their detail rows, in id order.
    fn query_all_with_details(&mut self) -> Result<Vec<StoredRow>, StoreError>;

    fn find_id_by_name(&mut self, name: &str) -> Result<Option<RecordId>, StoreError>;

    /// Id of the assignment whose detail row has exactly this topic.
    fn find_assignment_id_by_topic(&mut self, topic: &str)
        -> Result<Option<RecordId>, StoreError>;

    /// Delete every detail row, then every base row.
    fn clear_all(&mut self) -> Result<(), StoreError>;

    fn commit(self: Box<Self>) -> Result<(), StoreError>;

    fn rollback(self: Box<Self>) -> Result<(), StoreError>;

    /// Release the connection. Any uncommitted work is rolled back.
    fn close(self: Box<Self>) {}
}

/// A base row joined with whichever detail rows exist for it.
///
/// Detail columns are `None` when the join found no row, the date is the
/// stored text, and the kind is the stored tag; the repository decides
/// whether the row is usable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredRow {
    pub id: RecordId,
    pub name: String,
    pub date: String,
    pub base_score: f64,
    pub kind_tag: String,
    pub exam_duration_minutes: Option<i64>,
    pub exam_num_questions: Option<i64>,
    pub assignment_page_count: Option<i64>,
    pub assignment_topic: Option<String>,
    pub presentation_duration_minutes: Option<i64>,
    pub presentation_audience_size: Option<i64>,
}

/// Gateway operations, used to name failures and for fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOp {
    Connect,
    InsertBase,
    InsertDetail,
    DeleteDetail,
    DeleteBase,
    UpdateBase,
    QueryAll,
    FindIdByName,
    FindIdByTopic,
    ClearAll,
    Commit,
    Rollback,
}

impl GatewayOp {
    pub fn name(&self) -> &'static str {
        match self {
            GatewayOp::Connect => "connect",
            GatewayOp::InsertBase => "insert_base",
            GatewayOp::InsertDetail => "insert_detail",
            GatewayOp::DeleteDetail => "delete_detail",
            GatewayOp::DeleteBase => "delete_base",
            GatewayOp::UpdateBase => "update_base",
            GatewayOp::QueryAll => "query_all_with_details",
            GatewayOp::FindIdByName => "find_id_by_name",
            GatewayOp::FindIdByTopic => "find_assignment_id_by_topic",
            GatewayOp::ClearAll => "clear_all",
            GatewayOp::Commit => "commit",
            GatewayOp::Rollback => "rollback",
        }
    }
}
