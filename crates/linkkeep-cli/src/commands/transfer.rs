//! Import and export command handlers

use std::path::Path;

use anyhow::Result;

use linkkeep_core::{ImportSummary, Store};

use crate::bookmarks;
use crate::csv_io;
use crate::output::Output;

/// Import links from a CSV file
///
/// Rows without a URL, and rows the reader cannot decode, are counted as
/// errors; the rest of the file still goes in.
pub fn import_csv(store: &mut Store, path: &Path, output: &Output) -> Result<ImportSummary> {
    let rows = csv_io::read_records(path)?;
    let mut summary = store.bulk_import(rows.records);
    summary.errors += rows.unreadable;

    report_import(&summary, output);
    Ok(summary)
}

/// Export every link to a CSV file
pub fn export_csv(store: &Store, path: &Path, output: &Output) -> Result<usize> {
    let count = csv_io::write_records(path, &store.export_records())?;
    output.success(&format!(
        "Successfully exported {} links to {}",
        count,
        path.display()
    ));
    Ok(count)
}

/// Import links from a browser bookmark export
pub fn import_html(store: &mut Store, path: &Path, output: &Output) -> Result<ImportSummary> {
    let records = bookmarks::read_bookmarks(path)?;
    if records.is_empty() {
        output.message("No bookmarks found in folders.");
        return Ok(ImportSummary::default());
    }

    let summary = store.bulk_import(records);
    report_import(&summary, output);
    Ok(summary)
}

fn report_import(summary: &ImportSummary, output: &Output) {
    output.success(&format!("Import completed: {}", summary));
}
