//! The `gradebook import` command.

use std::path::PathBuf;

use anyhow::Result;

use gradebook_core::exchange::load_records;
use gradebook_core::ImportMode;

use super::{Session, StoreArgs};

pub fn execute(store: &StoreArgs, file: PathBuf, append: bool) -> Result<()> {
    let records = load_records(&file)?;
    let mut session = Session::open(store)?;

    let mode = if append {
        ImportMode::Append
    } else {
        ImportMode::Replace
    };
    let report = session.repo.import(&records, mode)?;

    println!(
        "Imported {} evaluation(s), rejected {}",
        report.imported,
        report.rejected.len()
    );
    for rejected in &report.rejected {
        println!(
            "  #{} '{}': {}",
            rejected.index + 1,
            rejected.name,
            rejected.reason
        );
    }
    Ok(())
}
