//! Core data model types for gradebook.
//!
//! An `Evaluation` is a graded academic activity. Its shared fields live on
//! the struct; everything that depends on the kind lives in the closed
//! `EvaluationDetails` enum, so the kind can never disagree with the data.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Minimum name length accepted from interactive input. Construction itself
/// only requires a non-blank name so short codes like "M1" stay valid.
pub const NAME_MIN_CHARS: usize = 3;
/// Minimum topic length accepted from interactive input.
pub const TOPIC_MIN_CHARS: usize = 3;
pub const NAME_MAX_CHARS: usize = 100;
pub const TOPIC_MAX_CHARS: usize = 255;
pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 100.0;

/// The closed set of evaluation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EvaluationKind {
    Exam,
    Assignment,
    Presentation,
}

impl EvaluationKind {
    /// All kinds in reporting order.
    pub const ALL: [EvaluationKind; 3] = [
        EvaluationKind::Exam,
        EvaluationKind::Assignment,
        EvaluationKind::Presentation,
    ];

    /// Tag written to the store's base table.
    pub fn tag(&self) -> &'static str {
        match self {
            EvaluationKind::Exam => "Exam",
            EvaluationKind::Assignment => "Assignment",
            EvaluationKind::Presentation => "Presentation",
        }
    }
}

impl fmt::Display for EvaluationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for EvaluationKind {
    type Err = String;

    /// Accepts the English tags case-insensitively, plus the Spanish tags
    /// found in older data files and databases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exam" | "examen" => Ok(EvaluationKind::Exam),
            "assignment" | "trabajo" => Ok(EvaluationKind::Assignment),
            "presentation" | "presentacion" | "presentación" => Ok(EvaluationKind::Presentation),
            other => Err(format!("unknown evaluation kind: {other}")),
        }
    }
}

/// A kind filter for listing: one kind, or everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KindFilter {
    #[default]
    All,
    Only(EvaluationKind),
}

impl KindFilter {
    pub fn matches(&self, kind: EvaluationKind) -> bool {
        match self {
            KindFilter::All => true,
            KindFilter::Only(k) => *k == kind,
        }
    }
}

impl From<EvaluationKind> for KindFilter {
    fn from(kind: EvaluationKind) -> Self {
        KindFilter::Only(kind)
    }
}

impl fmt::Display for KindFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KindFilter::All => f.write_str("All"),
            KindFilter::Only(kind) => kind.fmt(f),
        }
    }
}

impl FromStr for KindFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" | "todos" => Ok(KindFilter::All),
            other => other.parse().map(KindFilter::Only),
        }
    }
}

/// Kind-specific fields of an evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationDetails {
    Exam {
        duration_minutes: u32,
        num_questions: u32,
    },
    Assignment {
        page_count: u32,
        topic: String,
    },
    Presentation {
        duration_minutes: u32,
        audience_size: u32,
    },
}

impl EvaluationDetails {
    pub fn kind(&self) -> EvaluationKind {
        match self {
            EvaluationDetails::Exam { .. } => EvaluationKind::Exam,
            EvaluationDetails::Assignment { .. } => EvaluationKind::Assignment,
            EvaluationDetails::Presentation { .. } => EvaluationKind::Presentation,
        }
    }

    /// The assignment topic, if this is an assignment.
    pub fn topic(&self) -> Option<&str> {
        match self {
            EvaluationDetails::Assignment { topic, .. } => Some(topic),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        match self {
            EvaluationDetails::Exam {
                duration_minutes,
                num_questions,
            } => {
                check_range("duration_minutes", *duration_minutes, 15, 300)?;
                check_range("num_questions", *num_questions, 1, 100)
            }
            EvaluationDetails::Assignment { page_count, topic } => {
                check_range("page_count", *page_count, 1, 100)?;
                if topic.trim().is_empty() {
                    return Err(ValidationError::new("topic", "must not be empty"));
                }
                if topic.chars().count() > TOPIC_MAX_CHARS {
                    return Err(ValidationError::new(
                        "topic",
                        format!("must be at most {TOPIC_MAX_CHARS} characters"),
                    ));
                }
                Ok(())
            }
            EvaluationDetails::Presentation {
                duration_minutes,
                audience_size,
            } => {
                check_range("duration_minutes", *duration_minutes, 5, 60)?;
                check_range("audience_size", *audience_size, 1, 1000)
            }
        }
    }
}

fn check_range(field: &'static str, value: u32, min: u32, max: u32) -> Result<(), ValidationError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::new(
            field,
            format!("must be between {min} and {max}, got {value}"),
        ))
    }
}

/// A single graded academic activity.
///
/// Fields are private: an `Evaluation` only exists if every constraint held
/// at construction, and it is replaced rather than mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    name: String,
    date: NaiveDate,
    base_score: f64,
    details: EvaluationDetails,
}

impl Evaluation {
    /// Construct and validate an evaluation.
    ///
    /// Names must be non-blank and at most [`NAME_MAX_CHARS`] characters.
    /// The [`NAME_MIN_CHARS`] and [`TOPIC_MIN_CHARS`] minimums are checked
    /// on interactive input only, so imported and stored short names load.
    pub fn new(
        name: impl Into<String>,
        date: NaiveDate,
        base_score: f64,
        details: EvaluationDetails,
    ) -> Result<Self, ValidationError> {
        let name = name.into();

        let name_len = name.chars().count();
        if name.trim().is_empty() {
            return Err(ValidationError::new("name", "must not be empty"));
        }
        if name_len > NAME_MAX_CHARS {
            return Err(ValidationError::new(
                "name",
                format!("must be at most {NAME_MAX_CHARS} characters, got {name_len}"),
            ));
        }
        // NaN fails `contains`, so it is rejected here too.
        if !(SCORE_MIN..=SCORE_MAX).contains(&base_score) {
            return Err(ValidationError::new(
                "base_score",
                format!("must be between {SCORE_MIN:.1} and {SCORE_MAX:.1}, got {base_score}"),
            ));
        }
        details.validate()?;

        Ok(Self {
            name,
            date,
            base_score,
            details,
        })
    }

    pub fn exam(
        name: impl Into<String>,
        date: NaiveDate,
        base_score: f64,
        duration_minutes: u32,
        num_questions: u32,
    ) -> Result<Self, ValidationError> {
        Self::new(
            name,
            date,
            base_score,
            EvaluationDetails::Exam {
                duration_minutes,
                num_questions,
            },
        )
    }

    pub fn assignment(
        name: impl Into<String>,
        date: NaiveDate,
        base_score: f64,
        page_count: u32,
        topic: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Self::new(
            name,
            date,
            base_score,
            EvaluationDetails::Assignment {
                page_count,
                topic: topic.into(),
            },
        )
    }

    pub fn presentation(
        name: impl Into<String>,
        date: NaiveDate,
        base_score: f64,
        duration_minutes: u32,
        audience_size: u32,
    ) -> Result<Self, ValidationError> {
        Self::new(
            name,
            date,
            base_score,
            EvaluationDetails::Presentation {
                duration_minutes,
                audience_size,
            },
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    pub fn kind(&self) -> EvaluationKind {
        self.details.kind()
    }

    pub fn details(&self) -> &EvaluationDetails {
        &self.details
    }

    pub fn topic(&self) -> Option<&str> {
        self.details.topic()
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}, date {}, score {:.1}",
            self.kind(),
            self.name,
            self.date,
            self.base_score
        )?;
        match &self.details {
            EvaluationDetails::Exam {
                duration_minutes,
                num_questions,
            } => write!(f, ", {duration_minutes} min, {num_questions} questions"),
            EvaluationDetails::Assignment { page_count, topic } => {
                write!(f, ", {page_count} pages, topic {topic}")
            }
            EvaluationDetails::Presentation {
                duration_minutes,
                audience_size,
            } => write!(f, ", {duration_minutes} min, audience {audience_size}"),
        }
    }
}
