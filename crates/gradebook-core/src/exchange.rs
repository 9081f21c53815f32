//! Flat records for file import and export.
//!
//! A record carries every kind-specific field as optional. Older files use
//! Spanish field names, which are accepted as aliases.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::RecordError;
use crate::model::{Evaluation, EvaluationDetails, EvaluationKind};

/// One evaluation as stored in an exchange file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EvaluationRecord {
    #[serde(alias = "nombre")]
    pub name: String,
    /// ISO-8601 calendar date.
    #[serde(alias = "fecha")]
    pub date: String,
    #[serde(alias = "puntaje")]
    pub base_score: f64,
    #[serde(alias = "tipo")]
    pub kind: String,
    #[serde(
        default,
        alias = "duracion_min",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration_minutes: Option<u32>,
    #[serde(
        default,
        alias = "num_preguntas",
        skip_serializing_if = "Option::is_none"
    )]
    pub num_questions: Option<u32>,
    #[serde(
        default,
        alias = "num_paginas",
        skip_serializing_if = "Option::is_none"
    )]
    pub page_count: Option<u32>,
    #[serde(default, alias = "tema", skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(
        default,
        alias = "tamano_audiencia",
        skip_serializing_if = "Option::is_none"
    )]
    pub audience_size: Option<u32>,
}

impl EvaluationRecord {
    /// Build and validate the evaluation this record describes.
    ///
    /// Missing kind-specific fields default to 0 or "", which then fail the
    /// usual range checks for that kind.
    pub fn to_evaluation(&self) -> Result<Evaluation, RecordError> {
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .map_err(|_| RecordError::InvalidDate(self.date.clone()))?;
        let kind: EvaluationKind = self
            .kind
            .parse()
            .map_err(|_| RecordError::UnknownKind(self.kind.clone()))?;

        let details = match kind {
            EvaluationKind::Exam => EvaluationDetails::Exam {
                duration_minutes: self.duration_minutes.unwrap_or(0),
                num_questions: self.num_questions.unwrap_or(0),
            },
            EvaluationKind::Assignment => EvaluationDetails::Assignment {
                page_count: self.page_count.unwrap_or(0),
                topic: self.topic.clone().unwrap_or_default(),
            },
            EvaluationKind::Presentation => EvaluationDetails::Presentation {
                duration_minutes: self.duration_minutes.unwrap_or(0),
                audience_size: self.audience_size.unwrap_or(0),
            },
        };

        Ok(Evaluation::new(
            self.name.clone(),
            date,
            self.base_score,
            details,
        )?)
    }
}

impl From<&Evaluation> for EvaluationRecord {
    fn from(evaluation: &Evaluation) -> Self {
        let mut record = EvaluationRecord {
            name: evaluation.name().to_string(),
            date: evaluation.date().format("%Y-%m-%d").to_string(),
            base_score: evaluation.base_score(),
            kind: evaluation.kind().tag().to_string(),
            ..Default::default()
        };
        match evaluation.details() {
            EvaluationDetails::Exam {
                duration_minutes,
                num_questions,
            } => {
                record.duration_minutes = Some(*duration_minutes);
                record.num_questions = Some(*num_questions);
            }
            EvaluationDetails::Assignment { page_count, topic } => {
                record.page_count = Some(*page_count);
                record.topic = Some(topic.clone());
            }
            EvaluationDetails::Presentation {
                duration_minutes,
                audience_size,
            } => {
                record.duration_minutes = Some(*duration_minutes);
                record.audience_size = Some(*audience_size);
            }
        }
        record
    }
}

/// Read a JSON array of records from a file.
pub fn load_records(path: &Path) -> Result<Vec<EvaluationRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let records: Vec<EvaluationRecord> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    tracing::debug!(count = records.len(), path = %path.display(), "loaded records");
    Ok(records)
}

/// Write records to a file as a pretty-printed JSON array.
pub fn save_records(path: &Path, records: &[EvaluationRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    let json = serde_json::to_string_pretty(records).context("failed to serialize records")?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::debug!(count = records.len(), path = %path.display(), "saved records");
    Ok(())
}
