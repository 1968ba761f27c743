//! Inspect command implementation.

use super::{print, RecordView};
use crate::error::CliResult;
use crossync_store::FileStore;
use serde::Serialize;
use std::path::Path;

/// Store inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Store path.
    pub path: String,
    /// Number of registered entities.
    pub identity_count: usize,
    /// Number of entities with a stored record.
    pub record_count: usize,
    /// Stored records, ordered by entity id.
    pub records: Vec<RecordView>,
}

/// Runs the inspect command.
pub fn run(path: &Path, format: &str) -> CliResult<()> {
    let result = execute(path)?;
    print(&result, format, print_text_output)
}

/// Collects statistics and records of the store at `path`.
pub fn execute(path: &Path) -> CliResult<InspectResult> {
    let store = FileStore::open(path, false)?;
    let table = store.table()?;
    Ok(InspectResult {
        path: path.display().to_string(),
        identity_count: table.identity_count(),
        record_count: table.record_count(),
        records: table.records().iter().map(RecordView::from).collect(),
    })
}

fn print_text_output(result: &InspectResult) {
    println!("crossync Store: {}", result.path);
    println!("==============");
    println!();
    println!("Registered entities: {}", result.identity_count);
    println!("Stored records:      {}", result.record_count);
    println!(
        "Without data:        {}",
        result.identity_count.saturating_sub(result.record_count)
    );

    if !result.records.is_empty() {
        println!();
        for record in &result.records {
            record.print_text();
        }
    }
}
