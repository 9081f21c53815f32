//! The evaluation repository.
//!
//! Owns the session's evaluations in insertion order and mirrors every
//! mutation into a [`PersistenceGateway`]. The gateway is always written
//! first. Memory changes only after the transaction commits, so a failed
//! write leaves both sides as they were.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::error::{RepositoryError, StoreError, ValidationError};
use crate::exchange::EvaluationRecord;
use crate::gateway::{GatewayConnection, PersistenceGateway, RecordId, StoredRow};
use crate::model::{Evaluation, EvaluationDetails, EvaluationKind, KindFilter};
use crate::statistics::{self, KindStats, Summary};

/// Why a stored row could not be loaded.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkipReason {
    #[error("unknown kind tag '{0}'")]
    UnknownKind(String),

    #[error("unparseable date '{0}'")]
    InvalidDate(String),

    #[error("no {0} detail row")]
    MissingDetail(EvaluationKind),

    #[error("{field} value {value} is out of range")]
    OutOfRange { field: &'static str, value: i64 },

    #[error("name '{0}' is already loaded")]
    DuplicateName(String),

    #[error("topic '{0}' is already loaded")]
    DuplicateTopic(String),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// A stored row that `initialize` left out of memory.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    pub id: RecordId,
    pub name: String,
    pub reason: SkipReason,
}

/// Outcome of `initialize`.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: Vec<SkippedRow>,
    /// Set when the store could not be read; the repository is then degraded.
    pub store_error: Option<StoreError>,
}

impl LoadReport {
    pub fn is_degraded(&self) -> bool {
        self.store_error.is_some()
    }
}

/// Result of `remove_by_name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Removed,
    NotFound,
}

/// How `import` treats the existing evaluations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportMode {
    /// Clear everything first.
    #[default]
    Replace,
    /// Keep existing evaluations and add the new ones.
    Append,
}

/// An import record that was not added.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRecord {
    /// Position in the input sequence.
    pub index: usize,
    pub name: String,
    pub reason: String,
}

/// Outcome of `import`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub rejected: Vec<RejectedRecord>,
}

/// In-memory evaluation set backed by a persistence gateway.
pub struct EvaluationRepository<G: PersistenceGateway> {
    gateway: G,
    evaluations: Vec<Evaluation>,
    store_available: bool,
}

impl<G: PersistenceGateway> EvaluationRepository<G> {
    /// Create an empty repository. Call [`initialize`](Self::initialize)
    /// before mutating; until then the store counts as unavailable.
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            evaluations: Vec::new(),
            store_available: false,
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Load every stored evaluation, replacing what is in memory.
    ///
    /// Never fails: an unreadable store leaves the repository empty and
    /// degraded, and unusable rows are reported in `skipped`.
    pub fn initialize(&mut self) -> LoadReport {
        self.evaluations.clear();

        let rows = match self.read_rows() {
            Ok(rows) => rows,
            Err(err) => {
                tracing::warn!(error = %err, "store unavailable, continuing in memory-only mode");
                self.store_available = false;
                return LoadReport {
                    store_error: Some(err),
                    ..Default::default()
                };
            }
        };
        self.store_available = true;

        let mut report = LoadReport::default();
        for row in rows {
            let converted = row_to_evaluation(&row).and_then(|evaluation| {
                if self.find_by_name(evaluation.name()).is_some() {
                    return Err(SkipReason::DuplicateName(row.name.clone()));
                }
                let taken = evaluation
                    .topic()
                    .filter(|topic| self.topic_in_use(topic, None))
                    .map(str::to_string);
                match taken {
                    Some(topic) => Err(SkipReason::DuplicateTopic(topic)),
                    None => Ok(evaluation),
                }
            });
            match converted {
                Ok(evaluation) => self.evaluations.push(evaluation),
                Err(reason) => {
                    tracing::warn!(id = row.id, name = %row.name, %reason, "skipping stored row");
                    report.skipped.push(SkippedRow {
                        id: row.id,
                        name: row.name,
                        reason,
                    });
                }
            }
        }
        report.loaded = self.evaluations.len();

        tracing::info!(
            loaded = report.loaded,
            skipped = report.skipped.len(),
            "loaded evaluations from store"
        );
        report
    }

    fn read_rows(&self) -> Result<Vec<StoredRow>, StoreError> {
        let mut conn = self.gateway.connect()?;
        let rows = conn.query_all_with_details()?;
        conn.close();
        Ok(rows)
    }

    /// Add a new evaluation and return the stored copy.
    pub fn add(&mut self, evaluation: Evaluation) -> Result<&Evaluation, RepositoryError> {
        self.ensure_available()?;

        if self.find_by_name(evaluation.name()).is_some() {
            return Err(RepositoryError::DuplicateName(evaluation.name().to_string()));
        }
        if let Some(topic) = evaluation.topic() {
            if self.topic_in_use(topic, None) {
                return Err(RepositoryError::DuplicateTopic(topic.to_string()));
            }
        }

        let id = self.in_transaction(|conn| {
            if conn.find_id_by_name(evaluation.name())?.is_some() {
                return Err(RepositoryError::DuplicateName(evaluation.name().to_string()));
            }
            if let Some(topic) = evaluation.topic() {
                if conn.find_assignment_id_by_topic(topic)?.is_some() {
                    return Err(RepositoryError::DuplicateTopic(topic.to_string()));
                }
            }
            let id = conn.insert_base(
                evaluation.name(),
                evaluation.date(),
                evaluation.base_score(),
                evaluation.kind(),
            )?;
            conn.insert_detail(id, evaluation.details())?;
            Ok(id)
        })?;

        tracing::info!(id, name = %evaluation.name(), kind = %evaluation.kind(), "added evaluation");
        let index = self.evaluations.len();
        self.evaluations.push(evaluation);
        Ok(&self.evaluations[index])
    }

    /// Delete the evaluation with this name from the store and from memory.
    pub fn remove_by_name(&mut self, name: &str) -> Result<Removal, RepositoryError> {
        self.ensure_available()?;

        let removed = self.in_transaction(|conn| match conn.find_id_by_name(name)? {
            Some(id) => {
                conn.delete_details(id)?;
                conn.delete_base(id)?;
                Ok(true)
            }
            None => Ok(false),
        })?;

        let position = self.position(name);
        if let Some(index) = position {
            self.evaluations.remove(index);
        }

        if removed {
            tracing::info!(name, "removed evaluation");
            Ok(Removal::Removed)
        } else {
            if position.is_some() {
                tracing::warn!(name, "purged in-memory evaluation missing from store");
            }
            Ok(Removal::NotFound)
        }
    }

    /// Replace the evaluation named `original` with `replacement`.
    ///
    /// The kind may change. The updated entry keeps its position.
    pub fn update(
        &mut self,
        original: &str,
        replacement: Evaluation,
    ) -> Result<&Evaluation, RepositoryError> {
        self.ensure_available()?;

        let renamed = replacement.name() != original;
        if renamed && self.find_by_name(replacement.name()).is_some() {
            return Err(RepositoryError::DuplicateName(
                replacement.name().to_string(),
            ));
        }
        if let Some(topic) = replacement.topic() {
            if self.topic_in_use(topic, Some(original)) {
                return Err(RepositoryError::DuplicateTopic(topic.to_string()));
            }
        }

        let id = self.in_transaction(|conn| {
            let id = conn
                .find_id_by_name(original)?
                .ok_or_else(|| RepositoryError::NotFound(original.to_string()))?;
            if renamed {
                if let Some(other) = conn.find_id_by_name(replacement.name())? {
                    if other != id {
                        return Err(RepositoryError::DuplicateName(
                            replacement.name().to_string(),
                        ));
                    }
                }
            }
            if let Some(topic) = replacement.topic() {
                if let Some(other) = conn.find_assignment_id_by_topic(topic)? {
                    if other != id {
                        return Err(RepositoryError::DuplicateTopic(topic.to_string()));
                    }
                }
            }
            conn.update_base(
                id,
                replacement.name(),
                replacement.date(),
                replacement.base_score(),
                replacement.kind(),
            )?;
            conn.delete_details(id)?;
            conn.insert_detail(id, replacement.details())?;
            Ok(id)
        })?;

        tracing::info!(id, original, name = %replacement.name(), "updated evaluation");
        let index = match self.position(original) {
            Some(index) => {
                self.evaluations[index] = replacement;
                index
            }
            None => {
                self.evaluations.push(replacement);
                self.evaluations.len() - 1
            }
        };
        Ok(&self.evaluations[index])
    }

    /// Delete every evaluation. Calling it on an empty repository is a no-op.
    pub fn clear_all(&mut self) -> Result<(), RepositoryError> {
        self.ensure_available()?;
        self.in_transaction(|conn| Ok(conn.clear_all()?))?;
        let cleared = self.evaluations.len();
        self.evaluations.clear();
        tracing::info!(cleared, "cleared all evaluations");
        Ok(())
    }

    /// Add a batch of records, optionally replacing the current set.
    ///
    /// Records that fail conversion or collide with an existing name or
    /// topic are rejected and the import continues. A store failure stops
    /// the import and is returned; records added before it stay added.
    pub fn import(
        &mut self,
        records: &[EvaluationRecord],
        mode: ImportMode,
    ) -> Result<ImportReport, RepositoryError> {
        self.ensure_available()?;
        if mode == ImportMode::Replace {
            self.clear_all()?;
        }

        let mut report = ImportReport::default();
        for (index, record) in records.iter().enumerate() {
            let outcome = match record.to_evaluation() {
                Ok(evaluation) => self.add(evaluation).map(|_| ()),
                Err(err) => {
                    report.rejected.push(RejectedRecord {
                        index,
                        name: record.name.clone(),
                        reason: err.to_string(),
                    });
                    continue;
                }
            };
            match outcome {
                Ok(()) => report.imported += 1,
                Err(err) if err.is_store_failure() => return Err(err),
                Err(err) => report.rejected.push(RejectedRecord {
                    index,
                    name: record.name.clone(),
                    reason: err.to_string(),
                }),
            }
        }

        tracing::info!(
            imported = report.imported,
            rejected = report.rejected.len(),
            "import finished"
        );
        Ok(report)
    }

    /// Flat records for every evaluation, in insertion order.
    pub fn export(&self) -> Vec<EvaluationRecord> {
        self.evaluations.iter().map(EvaluationRecord::from).collect()
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Evaluation> {
        self.evaluations.iter().find(|e| e.name() == name)
    }

    pub fn filter_by_kind(&self, filter: impl Into<KindFilter>) -> Vec<&Evaluation> {
        let filter = filter.into();
        self.evaluations
            .iter()
            .filter(|e| filter.matches(e.kind()))
            .collect()
    }

    pub fn average(&self) -> f64 {
        statistics::average_grade(&self.evaluations)
    }

    pub fn best(&self) -> Option<&Evaluation> {
        statistics::best(&self.evaluations)
    }

    pub fn stats_by_kind(&self) -> Vec<KindStats> {
        statistics::stats_by_kind(&self.evaluations)
    }

    pub fn summary(&self) -> Summary {
        statistics::summarize(&self.evaluations)
    }

    pub fn evaluations(&self) -> &[Evaluation] {
        &self.evaluations
    }

    pub fn len(&self) -> usize {
        self.evaluations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evaluations.is_empty()
    }

    pub fn is_store_available(&self) -> bool {
        self.store_available
    }

    fn ensure_available(&self) -> Result<(), RepositoryError> {
        if self.store_available {
            Ok(())
        } else {
            Err(RepositoryError::StoreUnavailable(
                "repository is in memory-only mode".into(),
            ))
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.evaluations.iter().position(|e| e.name() == name)
    }

    fn topic_in_use(&self, topic: &str, excluding: Option<&str>) -> bool {
        self.evaluations
            .iter()
            .filter(|e| Some(e.name()) != excluding)
            .any(|e| e.topic() == Some(topic))
    }

    /// Run `work` inside one gateway transaction. Commits on success,
    /// rolls back on error.
    fn in_transaction<T>(
        &self,
        work: impl FnOnce(&mut dyn GatewayConnection) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let mut conn = self.gateway.connect()?;
        match work(&mut *conn) {
            Ok(value) => {
                conn.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = conn.rollback() {
                    tracing::warn!(error = %rollback_err, "rollback failed");
                }
                tracing::debug!(error = %err, "transaction rolled back");
                Err(err)
            }
        }
    }
}

/// Rebuild an evaluation from a joined row.
fn row_to_evaluation(row: &StoredRow) -> Result<Evaluation, SkipReason> {
    let kind: EvaluationKind = row
        .kind_tag
        .parse()
        .map_err(|_| SkipReason::UnknownKind(row.kind_tag.clone()))?;
    let date = NaiveDate::parse_from_str(row.date.trim(), "%Y-%m-%d")
        .map_err(|_| SkipReason::InvalidDate(row.date.clone()))?;

    let missing = || SkipReason::MissingDetail(kind);
    let details = match kind {
        EvaluationKind::Exam => EvaluationDetails::Exam {
            duration_minutes: column(
                "duration_minutes",
                row.exam_duration_minutes.ok_or_else(missing)?,
            )?,
            num_questions: column(
                "num_questions",
                row.exam_num_questions.ok_or_else(missing)?,
            )?,
        },
        EvaluationKind::Assignment => EvaluationDetails::Assignment {
            page_count: column(
                "page_count",
                row.assignment_page_count.ok_or_else(missing)?,
            )?,
            topic: row.assignment_topic.clone().ok_or_else(missing)?,
        },
        EvaluationKind::Presentation => EvaluationDetails::Presentation {
            duration_minutes: column(
                "duration_minutes",
                row.presentation_duration_minutes.ok_or_else(missing)?,
            )?,
            audience_size: column(
                "audience_size",
                row.presentation_audience_size.ok_or_else(missing)?,
            )?,
        },
    };

    Ok(Evaluation::new(
        row.name.clone(),
        date,
        row.base_score,
        details,
    )?)
}

fn column(field: &'static str, value: i64) -> Result<u32, SkipReason> {
    u32::try_from(value).map_err(|_| SkipReason::OutOfRange { field, value })
}
