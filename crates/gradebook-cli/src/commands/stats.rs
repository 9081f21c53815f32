//! The `gradebook stats` command.

use anyhow::{bail, Result};
use comfy_table::{Cell, Table};

use gradebook_core::statistics::NO_BEST;

use super::{Session, StoreArgs};

pub fn execute(store: &StoreArgs, format: String) -> Result<()> {
    let session = Session::open(store)?;
    let summary = session.repo.summary();

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", summary.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        "text" => {
            println!("Evaluations:   {}", summary.total);
            println!("Average grade: {:.1}", summary.average);
            println!("Best:          {}", summary.best_label());

            let mut table = Table::new();
            table.set_header(vec!["Kind", "Count", "Average", "Best", "Best grade"]);
            for stats in &summary.per_kind {
                let best_grade = if stats.count == 0 {
                    NO_BEST.to_string()
                } else {
                    format!("{:.1}", stats.best_grade)
                };
                table.add_row(vec![
                    Cell::new(stats.kind),
                    Cell::new(stats.count),
                    Cell::new(format!("{:.1}", stats.average)),
                    Cell::new(&stats.best_name),
                    Cell::new(best_grade),
                ]);
            }
            println!("\n{table}");
        }
        other => bail!("unknown format '{other}' (expected text, json or markdown)"),
    }

    Ok(())
}
