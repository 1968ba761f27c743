//! Ensure command implementation.

use super::{open_coordinator, parse_entity};
use crate::error::CliResult;
use std::path::Path;

/// Runs the ensure command.
pub fn run(path: &Path, id: &str) -> CliResult<()> {
    let entity_id = parse_entity(id)?;
    if execute(path, id)? {
        println!("Registered {entity_id}");
    } else {
        println!("{entity_id} already registered");
    }
    Ok(())
}

/// Registers the entity. Returns whether it was newly created.
pub fn execute(path: &Path, id: &str) -> CliResult<bool> {
    let entity_id = parse_entity(id)?;
    let coordinator = open_coordinator(path, true)?;
    Ok(coordinator.ensure_exists(entity_id)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use crossync_core::{EntityId, SyncError};
    use tempfile::tempdir;

    #[test]
    fn registers_once() {
        let dir = tempdir().unwrap();
        let id = EntityId::new().to_string();
        assert!(execute(dir.path(), &id).unwrap());
        assert!(!execute(dir.path(), &id).unwrap());
    }

    #[test]
    fn rejects_malformed_id() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            execute(dir.path(), "not-a-uuid"),
            Err(CliError::Sync(SyncError::InvalidIdentity(_)))
        ));
    }
}
