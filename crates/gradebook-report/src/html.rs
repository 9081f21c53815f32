//! Self-contained HTML report: summary, per-kind breakdown, evaluation list.
//!
//! Styles and the sorting script are inlined so the file can be opened or
//! mailed on its own.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use gradebook_core::statistics::{KindStats, Summary};
use gradebook_core::{Evaluation, EvaluationDetails, EvaluationRecord};

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Machine-readable copy embedded at the bottom of the page.
#[derive(Serialize)]
struct EmbeddedData<'a> {
    generated_at: DateTime<Utc>,
    summary: &'a Summary,
    evaluations: Vec<EvaluationRecord>,
}

/// Render the report page.
pub fn generate_html(
    evaluations: &[Evaluation],
    summary: &Summary,
    generated_at: DateTime<Utc>,
) -> String {
    let mut page = format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Gradebook: {} evaluations</title>\n<style>{STYLE}</style>\n</head>\n<body>\n",
        summary.total
    );

    page.push_str(&format!(
        "<h1>Gradebook</h1>\n<p class=\"meta\">{} evaluations | average grade {:.1} | best {} | {}</p>\n",
        summary.total,
        summary.average,
        html_escape(&summary.best_label()),
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    page.push_str(&kind_section(summary));
    page.push_str(&evaluation_section(evaluations));
    page.push_str(&data_section(evaluations, summary, generated_at));

    page.push_str(&format!("<script>{SORT_SCRIPT}</script>\n</body>\n</html>\n"));
    page
}

/// Write the report, creating parent directories as needed.
pub fn write_html_report(
    evaluations: &[Evaluation],
    summary: &Summary,
    path: &Path,
) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    let page = generate_html(evaluations, summary, Utc::now());
    std::fs::write(path, page).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "wrote HTML report");
    Ok(())
}

fn kind_section(summary: &Summary) -> String {
    let mut out = String::from(
        "<section id=\"by-kind\">\n<h2>By kind</h2>\n<table>\n\
         <tr><th>Kind</th><th>Count</th><th>Average</th><th>Best</th></tr>\n",
    );
    for stats in &summary.per_kind {
        let best = if stats.count == 0 {
            html_escape(&stats.best_name)
        } else {
            format!("{} ({:.1})", html_escape(&stats.best_name), stats.best_grade)
        };
        out.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{:.1}</td><td>{}</td></tr>\n",
            stats.kind, stats.count, stats.average, best
        ));
    }
    out.push_str("</table>\n");
    if summary.total > 0 {
        out.push_str(&average_chart(&summary.per_kind));
    }
    out.push_str("</section>\n");
    out
}

fn evaluation_section(evaluations: &[Evaluation]) -> String {
    let mut out = String::from("<section id=\"evaluations\">\n<h2>Evaluations</h2>\n");
    if evaluations.is_empty() {
        out.push_str("<p class=\"meta\">No evaluations recorded.</p>\n</section>\n");
        return out;
    }

    out.push_str("<table class=\"sortable\">\n<thead><tr>");
    for (col, heading) in ["Name", "Kind", "Date", "Score", "Grade", "Details"]
        .iter()
        .enumerate()
    {
        out.push_str(&format!("<th data-col=\"{col}\">{heading}</th>"));
    }
    out.push_str("</tr></thead>\n<tbody>\n");

    for evaluation in evaluations {
        let grade = evaluation.compute_grade();
        out.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{:.1}</td><td class=\"{}\">{:.1}</td><td>{}</td></tr>\n",
            html_escape(evaluation.name()),
            evaluation.kind(),
            evaluation.date(),
            evaluation.base_score(),
            grade_class(grade),
            grade,
            html_escape(&details_text(evaluation.details())),
        ));
    }
    out.push_str("</tbody>\n</table>\n</section>\n");
    out
}

fn data_section(
    evaluations: &[Evaluation],
    summary: &Summary,
    generated_at: DateTime<Utc>,
) -> String {
    let data = EmbeddedData {
        generated_at,
        summary,
        evaluations: evaluations.iter().map(EvaluationRecord::from).collect(),
    };
    let json = match serde_json::to_string_pretty(&data) {
        Ok(json) => json,
        Err(err) => {
            tracing::warn!(error = %err, "could not embed report data");
            return String::new();
        }
    };
    format!(
        "<section id=\"data\">\n<details><summary>JSON data</summary>\n<pre>{}</pre></details>\n</section>\n",
        html_escape(&json)
    )
}

fn details_text(details: &EvaluationDetails) -> String {
    match details {
        EvaluationDetails::Exam {
            duration_minutes,
            num_questions,
        } => format!("{duration_minutes} min, {num_questions} questions"),
        EvaluationDetails::Assignment { page_count, topic } => {
            format!("{page_count} pages, topic: {topic}")
        }
        EvaluationDetails::Presentation {
            duration_minutes,
            audience_size,
        } => format!("{duration_minutes} min, audience {audience_size}"),
    }
}

fn grade_class(grade: f64) -> &'static str {
    if grade >= 80.0 {
        "high"
    } else if grade >= 50.0 {
        "mid"
    } else {
        "low"
    }
}

/// Bars of the average grade per kind, scaled to the largest average or 100.
fn average_chart(per_kind: &[KindStats]) -> String {
    const ROW: usize = 28;
    const GAP: usize = 8;
    const LABEL: usize = 120;
    const BAR: f64 = 360.0;

    let top = per_kind.iter().map(|s| s.average).fold(100.0f64, f64::max);
    let height = per_kind.len() * (ROW + GAP) + GAP;

    let mut svg = format!(
        "<svg class=\"chart\" viewBox=\"0 0 {} {height}\" width=\"{}\" height=\"{height}\">\n",
        LABEL + BAR as usize + 60,
        LABEL + BAR as usize + 60,
    );
    for (row, stats) in per_kind.iter().enumerate() {
        let y = GAP + row * (ROW + GAP);
        let mid = y + ROW / 2;
        let length = (stats.average / top * BAR).round() as usize;
        svg.push_str(&format!(
            "<text x=\"{}\" y=\"{mid}\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            LABEL - 8,
            stats.kind
        ));
        svg.push_str(&format!(
            "<rect class=\"{}\" x=\"{LABEL}\" y=\"{y}\" width=\"{length}\" height=\"{ROW}\"/>\n",
            grade_class(stats.average)
        ));
        svg.push_str(&format!(
            "<text x=\"{}\" y=\"{mid}\" dominant-baseline=\"middle\">{:.1}</text>\n",
            LABEL + length + 6,
            stats.average
        ));
    }
    svg.push_str("</svg>\n");
    svg
}

const STYLE: &str = r#"
body { font: 15px/1.5 Georgia, 'Times New Roman', serif; max-width: 60rem; margin: 2rem auto; padding: 0 1rem; color: #222; background: #fdfcf8; }
h1 { border-bottom: 3px double #8b6f47; padding-bottom: .25rem; }
h2 { color: #5a4632; margin-top: 2.5rem; }
.meta { color: #777; font-style: italic; }
table { border-collapse: collapse; width: 100%; }
th { text-align: left; border-bottom: 2px solid #8b6f47; padding: .4rem .6rem; }
td { border-bottom: 1px solid #e4dccf; padding: .4rem .6rem; }
table.sortable th { cursor: pointer; user-select: none; }
td.high { background: #e3f1df; }
td.mid { background: #f7efd2; }
td.low { background: #f6dcd8; }
svg.chart text { font: 13px sans-serif; fill: #333; }
svg.chart rect.high { fill: #4f8a3c; }
svg.chart rect.mid { fill: #c9a227; }
svg.chart rect.low { fill: #b5483b; }
pre { background: #f3efe6; padding: 1rem; overflow-x: auto; font-size: 12px; }
"#;

// Score and grade columns compare numerically.
const SORT_SCRIPT: &str = r#"
document.querySelectorAll('table.sortable th').forEach(th => {
  th.addEventListener('click', () => {
    const body = th.closest('table').tBodies[0];
    const col = Number(th.dataset.col);
    const numeric = col === 3 || col === 4;
    const desc = th.dataset.order !== 'desc';
    const key = row => row.cells[col].textContent;
    const rows = [...body.rows].sort((a, b) => {
      const order = numeric ? parseFloat(key(a)) - parseFloat(key(b)) : key(a).localeCompare(key(b));
      return desc ? -order : order;
    });
    th.dataset.order = desc ? 'desc' : 'asc';
    body.append(...rows);
  });
});
"#;
