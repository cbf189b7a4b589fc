//! Trigger-driven backup type selection.
//!
//! Pure rule table: first matching rule wins, unrecognized input falls
//! through to a full backup. No side effects, no error paths.

use crate::category::{BackupTrigger, BackupType};

/// Change descriptors that force a full backup on push because the
/// database schema may have moved.
const DATABASE_MARKERS: [&str; 3] = ["prisma", "database", "schema"];

/// Change descriptors that force a full backup on push because they touch
/// authentication or security surfaces.
const SECURITY_MARKERS: [&str; 2] = ["auth", "security"];

/// Resolve the backup type for a run from its trigger and the change
/// descriptors that accompanied it (changed paths, commit subjects, or
/// whatever the caller has at hand).
///
/// Rules, first match wins:
/// 1. release runs always take a full backup
/// 2. scheduled runs only refresh the database dump
/// 3. pushes touching database schema or security surfaces escalate to full
/// 4. other pushes take an incremental backup
/// 5. everything else, including manual runs, defaults to full
pub fn resolve<S: AsRef<str>>(trigger: BackupTrigger, changes: &[S]) -> BackupType {
    match trigger {
        BackupTrigger::Release => BackupType::Full,
        BackupTrigger::Schedule => BackupType::Database,
        BackupTrigger::Push => {
            if mentions_any(changes, &DATABASE_MARKERS) || mentions_any(changes, &SECURITY_MARKERS)
            {
                BackupType::Full
            } else {
                BackupType::Incremental
            }
        }
        BackupTrigger::Manual => BackupType::Full,
    }
}

fn mentions_any<S: AsRef<str>>(changes: &[S], markers: &[&str]) -> bool {
    changes.iter().any(|change| {
        let change = change.as_ref().to_ascii_lowercase();
        markers.iter().any(|marker| change.contains(marker))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const NO_CHANGES: [&str; 0] = [];

    #[test]
    fn release_always_resolves_full() {
        assert_eq!(resolve(BackupTrigger::Release, &NO_CHANGES), BackupType::Full);
        assert_eq!(
            resolve(BackupTrigger::Release, &["prisma/schema.prisma"]),
            BackupType::Full
        );
    }

    #[test]
    fn schedule_resolves_database() {
        assert_eq!(
            resolve(BackupTrigger::Schedule, &NO_CHANGES),
            BackupType::Database
        );
        assert_eq!(
            resolve(BackupTrigger::Schedule, &["src/auth/login.rs"]),
            BackupType::Database
        );
    }

    #[test]
    fn push_with_schema_changes_escalates_to_full() {
        assert_eq!(
            resolve(BackupTrigger::Push, &["apps/api/prisma/schema.prisma"]),
            BackupType::Full
        );
        assert_eq!(
            resolve(BackupTrigger::Push, &["migrations/database.sql"]),
            BackupType::Full
        );
    }

    #[test]
    fn push_with_security_changes_escalates_to_full() {
        assert_eq!(
            resolve(BackupTrigger::Push, &["src/auth/session.rs"]),
            BackupType::Full
        );
        assert_eq!(
            resolve(BackupTrigger::Push, &["SECURITY.md"]),
            BackupType::Full
        );
    }

    #[test]
    fn ordinary_push_resolves_incremental() {
        assert_eq!(
            resolve(BackupTrigger::Push, &["README.md", "src/display.rs"]),
            BackupType::Incremental
        );
    }

    #[test]
    fn manual_defaults_to_full() {
        assert_eq!(resolve(BackupTrigger::Manual, &NO_CHANGES), BackupType::Full);
    }

    proptest! {
        #[test]
        fn release_and_schedule_ignore_change_descriptors(changes in proptest::collection::vec(".*", 0..8)) {
            prop_assert_eq!(resolve(BackupTrigger::Release, &changes), BackupType::Full);
            prop_assert_eq!(resolve(BackupTrigger::Schedule, &changes), BackupType::Database);
        }

        #[test]
        fn push_never_resolves_to_a_single_category(changes in proptest::collection::vec(".*", 0..8)) {
            let resolved = resolve(BackupTrigger::Push, &changes);
            prop_assert!(resolved == BackupType::Full || resolved == BackupType::Incremental);
        }
    }
}
