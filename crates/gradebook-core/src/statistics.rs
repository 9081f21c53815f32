//! Aggregate statistics over a set of evaluations.
//!
//! All functions are linear scans over the grades; nothing is cached.

use serde::{Deserialize, Serialize};

use crate::model::{Evaluation, EvaluationKind};

/// Placeholder shown when a kind has no evaluations.
pub const NO_BEST: &str = "N/A";

/// Arithmetic mean of the computed grades, or 0.0 when empty.
pub fn average_grade<'a>(evaluations: impl IntoIterator<Item = &'a Evaluation>) -> f64 {
    let (sum, count) = evaluations
        .into_iter()
        .fold((0.0f64, 0usize), |(sum, count), e| {
            (sum + e.compute_grade(), count + 1)
        });
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// The evaluation with the highest grade. Ties go to the earliest one.
pub fn best<'a>(evaluations: impl IntoIterator<Item = &'a Evaluation>) -> Option<&'a Evaluation> {
    let mut best: Option<(&Evaluation, f64)> = None;
    for evaluation in evaluations {
        let grade = evaluation.compute_grade();
        match best {
            Some((_, top)) if grade <= top => {}
            _ => best = Some((evaluation, grade)),
        }
    }
    best.map(|(e, _)| e)
}

/// Statistics for one evaluation kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindStats {
    pub kind: EvaluationKind,
    pub count: usize,
    pub average: f64,
    /// Name of the best evaluation of this kind, or "N/A".
    pub best_name: String,
    /// Grade of the best evaluation of this kind, or 0.0.
    pub best_grade: f64,
}

/// Per-kind statistics, always one entry per kind in `EvaluationKind::ALL` order.
pub fn stats_by_kind(evaluations: &[Evaluation]) -> Vec<KindStats> {
    EvaluationKind::ALL
        .iter()
        .map(|&kind| {
            let of_kind = || evaluations.iter().filter(move |e| e.kind() == kind);
            let count = of_kind().count();
            let top = best(of_kind());
            KindStats {
                kind,
                count,
                average: average_grade(of_kind()),
                best_name: top
                    .map(|e| e.name().to_string())
                    .unwrap_or_else(|| NO_BEST.to_string()),
                best_grade: top.map(|e| e.compute_grade()).unwrap_or(0.0),
            }
        })
        .collect()
}

/// Everything the summary panel shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub average: f64,
    pub best_name: Option<String>,
    pub best_grade: Option<f64>,
    pub per_kind: Vec<KindStats>,
}

/// Compute the full summary for a set of evaluations.
pub fn summarize(evaluations: &[Evaluation]) -> Summary {
    let top = best(evaluations);
    Summary {
        total: evaluations.len(),
        average: average_grade(evaluations),
        best_name: top.map(|e| e.name().to_string()),
        best_grade: top.map(|e| e.compute_grade()),
        per_kind: stats_by_kind(evaluations),
    }
}

impl Summary {
    /// Format the summary as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Summary:** {} evaluations, average grade {:.1}, best {}\n\n",
            self.total,
            self.average,
            self.best_label()
        ));

        md.push_str("| Kind | Count | Average | Best |\n");
        md.push_str("|------|-------|---------|------|\n");
        for stats in &self.per_kind {
            if stats.count == 0 {
                md.push_str(&format!("| {} | 0 | 0.0 | {} |\n", stats.kind, NO_BEST));
            } else {
                md.push_str(&format!(
                    "| {} | {} | {:.1} | {} ({:.1}) |\n",
                    stats.kind, stats.count, stats.average, stats.best_name, stats.best_grade
                ));
            }
        }

        md
    }

    /// "name (grade)" for the overall best, or "N/A".
    pub fn best_label(&self) -> String {
        match (&self.best_name, self.best_grade) {
            (Some(name), Some(grade)) => format!("{name} ({grade:.1})"),
            _ => NO_BEST.to_string(),
        }
    }
}
