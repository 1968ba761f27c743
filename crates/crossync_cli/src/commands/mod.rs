//! CLI command implementations.

pub mod ensure;
pub mod fetch;
pub mod inspect;
pub mod serve;
pub mod submit;

use crate::error::{CliError, CliResult};
use crossync_core::{EntityId, Record, SyncCoordinator};
use crossync_store::FileStore;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Printable form of a record.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct RecordView {
    /// Entity id.
    pub entity_id: String,
    /// Version token, absent for the empty record.
    pub version: Option<String>,
    /// Last write time in milliseconds since the epoch.
    pub timestamp: u64,
    /// Payload size in bytes.
    pub payload_size: usize,
    /// Payload as text, with invalid UTF-8 replaced.
    pub payload: String,
}

impl From<&Record> for RecordView {
    fn from(record: &Record) -> Self {
        Self {
            entity_id: record.entity_id.to_string(),
            version: record.version.map(|v| v.to_string()),
            timestamp: record.timestamp.as_millis(),
            payload_size: record.payload.len(),
            payload: String::from_utf8_lossy(&record.payload).into_owned(),
        }
    }
}

impl RecordView {
    fn print_text(&self) {
        println!("Entity: {}", self.entity_id);
        println!(
            "  Version:   {}",
            self.version.as_deref().unwrap_or("(none)")
        );
        println!("  Timestamp: {}", self.timestamp);
        println!("  Payload:   {} bytes", self.payload_size);
        if self.payload_size > 0 {
            println!("  {}", self.payload);
        }
    }
}

/// Prints `value` as pretty JSON, or through `text` for any other format.
fn print<T: Serialize>(value: &T, format: &str, text: impl FnOnce(&T)) -> CliResult<()> {
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(value)?),
        _ => text(value),
    }
    Ok(())
}

fn parse_entity(id: &str) -> CliResult<EntityId> {
    Ok(id.parse::<EntityId>()?)
}

/// Opens a coordinator over the store at `path`.
///
/// Each invocation starts with an empty cache, so conflicts with other
/// writers are detected by the store-side version check.
fn open_coordinator(path: &Path, create: bool) -> CliResult<SyncCoordinator<FileStore>> {
    let store = FileStore::open(path, create)?;
    Ok(SyncCoordinator::with_store(Arc::new(store)))
}

fn invalid(message: impl Into<String>) -> CliError {
    CliError::InvalidArgument(message.into())
}
