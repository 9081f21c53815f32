//! The `gradebook update` command.

use anyhow::Result;

use super::{EvaluationArgs, Session, StoreArgs};

pub fn execute(store: &StoreArgs, original: String, args: EvaluationArgs) -> Result<()> {
    let replacement = args.to_evaluation()?;
    let mut session = Session::open(store)?;

    let updated = session.repo.update(&original, replacement)?;
    if updated.name() == original {
        println!(
            "Updated '{}' ({}, grade {:.1})",
            updated.name(),
            updated.kind(),
            updated.compute_grade()
        );
    } else {
        println!(
            "Updated '{}' -> '{}' ({}, grade {:.1})",
            original,
            updated.name(),
            updated.kind(),
            updated.compute_grade()
        );
    }
    Ok(())
}
