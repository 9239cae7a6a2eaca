//! Backup command handlers

use anyhow::{bail, Result};

use linkkeep_core::{BackupOutcome, JsonPersistence, Store};

use crate::output::Output;

/// Back up the link file now
pub fn create(persistence: &JsonPersistence, output: &Output) -> Result<()> {
    match persistence.backup() {
        BackupOutcome::Created(path) => {
            output.success(&format!("Backup created: {}", path.display()));
            Ok(())
        }
        BackupOutcome::NothingToBackUp => {
            output.message("No link file to back up.");
            Ok(())
        }
        BackupOutcome::Failed(reason) => bail!("Backup failed: {}", reason),
    }
}

/// List backups, most recent first
pub fn list(persistence: &JsonPersistence, output: &Output) -> Result<Vec<String>> {
    let names = persistence.list_backups()?;
    output.print_backups(&names);
    Ok(names)
}

/// Restore a backup (the most recent if `name` is `None`)
///
/// Returns the store reloaded from the restored file.
pub fn restore(persistence: &JsonPersistence, name: Option<&str>, output: &Output) -> Result<Store> {
    let restored = persistence.restore(name)?;

    if let BackupOutcome::Created(path) = &restored.safety_backup {
        output.message(&format!("Current links backed up to {}", path.display()));
    }
    output.success(&format!(
        "Restored {} links from backup {}",
        restored.store.len(),
        restored.name
    ));
    Ok(restored.store)
}
