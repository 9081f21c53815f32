//! The `gradebook list` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use gradebook_core::KindFilter;

use super::{details_summary, Session, StoreArgs};

pub fn execute(store: &StoreArgs, kind: KindFilter) -> Result<()> {
    let session = Session::open(store)?;
    let evaluations = session.repo.filter_by_kind(kind);

    if evaluations.is_empty() {
        match kind {
            KindFilter::All => println!("No evaluations."),
            KindFilter::Only(k) => println!("No {} evaluations.", k.tag().to_lowercase()),
        }
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Name", "Kind", "Date", "Score", "Grade", "Details"]);
    for evaluation in &evaluations {
        table.add_row(vec![
            Cell::new(evaluation.name()),
            Cell::new(evaluation.kind()),
            Cell::new(evaluation.date()),
            Cell::new(format!("{:.1}", evaluation.base_score())),
            Cell::new(format!("{:.1}", evaluation.compute_grade())),
            Cell::new(details_summary(evaluation.details())),
        ]);
    }

    println!("{table}");
    println!("{} evaluation(s)", evaluations.len());
    Ok(())
}
