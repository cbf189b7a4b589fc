//! # Valv Core
//!
//! Domain model and decision logic for the Valv backup engine:
//! backup categories and triggers, artifact handles, inventory
//! reconciliation, retention planning, threshold alerting, and the
//! persisted status/run reports.
//!
//! Everything in this crate is deterministic given its inputs. The only
//! I/O here is report persistence, which always goes through an atomic
//! write-to-temp-then-rename so readers never observe a torn document.

pub mod alert;
pub mod artifact;
pub mod category;
pub mod inventory;
pub mod report;
pub mod retention;
pub mod selector;

pub use alert::{evaluate_alerts, Alert, AlertKind, AlertThresholds, Severity};
pub use artifact::{mint_identifier, BackupArtifact, StorageLocation};
pub use category::{BackupCategory, BackupTrigger, BackupType};
pub use inventory::{CategoryInventories, GlobalView, Inventory};
pub use report::{
    HealthVerdict, ReportError, ReportedArtifact, RunReport, RunStatus, StatusReport,
    RUN_REPORT_FILE, STATUS_REPORT_FILE,
};
pub use retention::expired;
pub use selector::resolve;
