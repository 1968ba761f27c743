//! Fetch command implementation.

use super::{open_coordinator, parse_entity, print, RecordView};
use crate::error::CliResult;
use std::path::Path;

/// Runs the fetch command.
pub fn run(path: &Path, id: &str, format: &str) -> CliResult<()> {
    let view = execute(path, id)?;
    print(&view, format, RecordView::print_text)
}

/// Reads the stored record, or the empty record if none is stored.
pub fn execute(path: &Path, id: &str) -> CliResult<RecordView> {
    let entity_id = parse_entity(id)?;
    let coordinator = open_coordinator(path, false)?;
    let record = coordinator.fetch(entity_id)?;
    Ok(RecordView::from(&record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use crossync_core::{EntityId, StoreError};
    use tempfile::tempdir;

    #[test]
    fn unknown_entity_reads_as_empty() {
        let dir = tempdir().unwrap();
        crossync_store::FileStore::open(dir.path(), true).unwrap();
        let id = EntityId::new();

        let view = execute(dir.path(), &id.to_string()).unwrap();
        assert_eq!(view.entity_id, id.to_string());
        assert_eq!(view.version, None);
        assert_eq!(view.payload_size, 0);
    }

    #[test]
    fn missing_store_is_reported() {
        let dir = tempdir().unwrap();
        let result = execute(&dir.path().join("absent"), &EntityId::new().to_string());
        assert!(matches!(
            result,
            Err(CliError::Store(StoreError::Unavailable(_)))
        ));
    }
}
