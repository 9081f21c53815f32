//! Subcommand implementations and the argument types they share.

use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::Args;

use gradebook_core::model::{NAME_MIN_CHARS, TOPIC_MIN_CHARS};
use gradebook_core::{Evaluation, EvaluationDetails, EvaluationKind, EvaluationRepository};
use gradebook_store::{load_config_from, GradebookConfig, SqliteGateway};

pub mod add;
pub mod clear;
pub mod export;
pub mod import;
pub mod init;
pub mod list;
pub mod remove;
pub mod report;
pub mod show;
pub mod stats;
pub mod update;

/// Where the evaluations live.
#[derive(Args, Debug, Clone, Default)]
pub struct StoreArgs {
    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database file (overrides the config file and GRADEBOOK_DATABASE)
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,
}

/// A loaded configuration and an initialized repository.
pub struct Session {
    pub config: GradebookConfig,
    pub repo: EvaluationRepository<SqliteGateway>,
}

impl Session {
    pub fn open(args: &StoreArgs) -> Result<Self> {
        let mut config = load_config_from(args.config.as_deref())?;
        if let Some(database) = &args.database {
            config.database = database.clone();
        }

        tracing::debug!(database = %config.database.display(), "opening gradebook");
        let mut repo = EvaluationRepository::new(config.gateway());
        let report = repo.initialize();
        if let Some(err) = &report.store_error {
            eprintln!(
                "Warning: cannot open {} ({err}); changes will not be saved.",
                config.database.display()
            );
        }
        if !report.skipped.is_empty() {
            eprintln!(
                "Warning: {} stored evaluation(s) could not be loaded.",
                report.skipped.len()
            );
            for row in &report.skipped {
                eprintln!("  #{} '{}': {}", row.id, row.name, row.reason);
            }
        }

        Ok(Self { config, repo })
    }
}

/// Fields of an evaluation, as given on the command line.
#[derive(Args, Debug, Clone)]
pub struct EvaluationArgs {
    /// Evaluation name (3-100 characters)
    #[arg(long)]
    pub name: String,

    /// Date (YYYY-MM-DD)
    #[arg(long)]
    pub date: NaiveDate,

    /// Base score, 0.0 to 100.0
    #[arg(long)]
    pub score: f64,

    /// Kind: exam, assignment, presentation
    #[arg(long)]
    pub kind: EvaluationKind,

    /// Duration in minutes (exam, presentation)
    #[arg(long)]
    pub duration: Option<u32>,

    /// Number of questions (exam)
    #[arg(long)]
    pub questions: Option<u32>,

    /// Page count (assignment)
    #[arg(long)]
    pub pages: Option<u32>,

    /// Topic (assignment)
    #[arg(long)]
    pub topic: Option<String>,

    /// Audience size (presentation)
    #[arg(long)]
    pub audience: Option<u32>,
}

impl EvaluationArgs {
    /// Build and validate the evaluation these arguments describe.
    pub fn to_evaluation(&self) -> Result<Evaluation> {
        let name = self.name.trim();
        if name.chars().count() < NAME_MIN_CHARS {
            bail!("name must be at least {NAME_MIN_CHARS} characters");
        }
        if self.kind == EvaluationKind::Assignment {
            if let Some(topic) = &self.topic {
                if topic.trim().chars().count() < TOPIC_MIN_CHARS {
                    bail!("topic must be at least {TOPIC_MIN_CHARS} characters");
                }
            }
        }

        let details = match self.kind {
            EvaluationKind::Exam => EvaluationDetails::Exam {
                duration_minutes: required(self.duration, "--duration", self.kind)?,
                num_questions: required(self.questions, "--questions", self.kind)?,
            },
            EvaluationKind::Assignment => EvaluationDetails::Assignment {
                page_count: required(self.pages, "--pages", self.kind)?,
                topic: required(self.topic.clone(), "--topic", self.kind)?,
            },
            EvaluationKind::Presentation => EvaluationDetails::Presentation {
                duration_minutes: required(self.duration, "--duration", self.kind)?,
                audience_size: required(self.audience, "--audience", self.kind)?,
            },
        };

        Ok(Evaluation::new(name, self.date, self.score, details)?)
    }
}

fn required<T>(value: Option<T>, flag: &str, kind: EvaluationKind) -> Result<T> {
    match value {
        Some(v) => Ok(v),
        None => bail!("{flag} is required for {} evaluations", kind.tag().to_lowercase()),
    }
}

/// One-line description of the kind-specific fields.
pub fn details_summary(details: &EvaluationDetails) -> String {
    match details {
        EvaluationDetails::Exam {
            duration_minutes,
            num_questions,
        } => format!("{duration_minutes} min, {num_questions} questions"),
        EvaluationDetails::Assignment { page_count, topic } => {
            format!("{page_count} pages, {topic}")
        }
        EvaluationDetails::Presentation {
            duration_minutes,
            audience_size,
        } => format!("{duration_minutes} min, audience {audience_size}"),
    }
}
