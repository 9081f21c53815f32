//! The `gradebook remove` command.

use anyhow::Result;

use gradebook_core::Removal;

use super::{Session, StoreArgs};

pub fn execute(store: &StoreArgs, name: String) -> Result<()> {
    let mut session = Session::open(store)?;

    match session.repo.remove_by_name(&name)? {
        Removal::Removed => println!("Removed '{name}'"),
        Removal::NotFound => println!("No evaluation named '{name}'"),
    }
    Ok(())
}
