//! The `gradebook clear` command.

use anyhow::{bail, Result};

use super::{Session, StoreArgs};

pub fn execute(store: &StoreArgs, yes: bool) -> Result<()> {
    if !yes {
        bail!("refusing to delete every evaluation without --yes");
    }

    let mut session = Session::open(store)?;
    let count = session.repo.len();
    session.repo.clear_all()?;
    println!("Cleared {count} evaluation(s)");
    Ok(())
}
