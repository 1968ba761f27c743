//! Submit command implementation.

use super::{invalid, open_coordinator, parse_entity};
use crate::error::CliResult;
use crossync_core::{Record, UpdateOutcome, VersionToken};
use std::path::Path;

/// Outcome of a submission, with the version it proposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitReport {
    /// Version token generated for the submitted record.
    pub version: VersionToken,
    /// Whether the store accepted it.
    pub outcome: UpdateOutcome,
}

/// Runs the submit command.
pub fn run(path: &Path, id: &str, payload: &str, expected: &str) -> CliResult<()> {
    let report = execute(path, id, payload, expected)?;
    match report.outcome {
        UpdateOutcome::Accepted => println!("Accepted, new version {}", report.version),
        UpdateOutcome::Rejected { current_version } => match current_version {
            Some(current) => println!("Rejected, current version is {current}"),
            None => println!("Rejected, entity has no stored version"),
        },
    }
    Ok(())
}

/// Submits `payload` under a fresh version token.
pub fn execute(path: &Path, id: &str, payload: &str, expected: &str) -> CliResult<SubmitReport> {
    let entity_id = parse_entity(id)?;
    let expected = parse_expected(expected)?;
    let coordinator = open_coordinator(path, true)?;

    let version = VersionToken::new();
    let outcome =
        coordinator.submit_update(Record::new(entity_id, version, payload), expected.as_ref())?;
    Ok(SubmitReport { version, outcome })
}

fn parse_expected(expected: &str) -> CliResult<Option<VersionToken>> {
    if expected.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    expected
        .parse()
        .map(Some)
        .map_err(|_| invalid(format!("expected version must be a UUID or \"none\": {expected}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fetch;
    use crate::error::CliError;
    use crossync_core::EntityId;
    use tempfile::tempdir;

    #[test]
    fn parse_expected_accepts_none_and_uuids() {
        assert_eq!(parse_expected("none").unwrap(), None);
        assert_eq!(parse_expected("NONE").unwrap(), None);

        let version = VersionToken::new();
        assert_eq!(
            parse_expected(&version.to_string()).unwrap(),
            Some(version)
        );
        assert!(matches!(
            parse_expected("v1"),
            Err(CliError::InvalidArgument(_))
        ));
    }

    #[test]
    fn stale_submission_is_rejected_across_invocations() {
        let dir = tempdir().unwrap();
        let id = EntityId::new().to_string();

        let first = execute(dir.path(), &id, "sword", "none").unwrap();
        assert!(first.outcome.is_accepted());

        // A second invocation starts with an empty cache; the store catches it.
        let stale = execute(dir.path(), &id, "shield", "none").unwrap();
        assert_eq!(
            stale.outcome,
            UpdateOutcome::Rejected {
                current_version: Some(first.version)
            }
        );

        let next = execute(dir.path(), &id, "shield", &first.version.to_string()).unwrap();
        assert!(next.outcome.is_accepted());

        let view = fetch::execute(dir.path(), &id).unwrap();
        assert_eq!(view.payload, "shield");
        assert_eq!(view.version, Some(next.version.to_string()));
    }
}
