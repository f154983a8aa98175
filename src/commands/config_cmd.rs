//! Config file utilities
//! Usage: moor config [path|restore-backup]

use anyhow::Result;
use colored::Colorize;

use crate::config::AtomicConfigStore;

pub fn path() -> Result<()> {
    println!("{}", AtomicConfigStore::default_path().display());
    Ok(())
}

pub fn restore_backup() -> Result<()> {
    let store = AtomicConfigStore::new(AtomicConfigStore::default_path());
    store.restore_backup()?;
    println!(
        "{} Restored {} from backup",
        "✓".green().bold(),
        store.path().display()
    );
    Ok(())
}
