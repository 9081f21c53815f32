//! The `gradebook export` command.

use std::path::PathBuf;

use anyhow::Result;

use gradebook_core::exchange::save_records;

use super::{Session, StoreArgs};

pub fn execute(store: &StoreArgs, file: PathBuf) -> Result<()> {
    let session = Session::open(store)?;
    let records = session.repo.export();
    save_records(&file, &records)?;
    println!(
        "Exported {} evaluation(s) to {}",
        records.len(),
        file.display()
    );
    Ok(())
}
