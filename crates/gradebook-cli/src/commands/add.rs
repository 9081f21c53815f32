//! The `gradebook add` command.

use anyhow::Result;

use super::{EvaluationArgs, Session, StoreArgs};

pub fn execute(store: &StoreArgs, args: EvaluationArgs) -> Result<()> {
    let evaluation = args.to_evaluation()?;
    let mut session = Session::open(store)?;

    let added = session.repo.add(evaluation)?;
    println!(
        "Added '{}' ({}, grade {:.1})",
        added.name(),
        added.kind(),
        added.compute_grade()
    );
    Ok(())
}
