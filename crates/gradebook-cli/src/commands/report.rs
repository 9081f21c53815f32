//! The `gradebook report` command.

use std::path::PathBuf;

use anyhow::Result;

use gradebook_report::write_html_report;

use super::{Session, StoreArgs};

pub fn execute(store: &StoreArgs, output: Option<PathBuf>) -> Result<()> {
    let session = Session::open(store)?;
    let path =
        output.unwrap_or_else(|| session.config.report_dir.join("gradebook-report.html"));

    write_html_report(session.repo.evaluations(), &session.repo.summary(), &path)?;
    println!("HTML report: {}", path.display());
    Ok(())
}
