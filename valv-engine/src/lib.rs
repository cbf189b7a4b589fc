//! valv-engine
//!
//! Runtime coordinating one backup or monitoring run end to end. The CLI
//! is a thin shell over [`engine::BackupRuntime`]; every sequencing rule
//! (produce before publish, publish before retain, one clock reading per
//! monitoring run) lives here.

pub mod engine;

pub use engine::{BackupRuntime, EngineError, RunOutcome};
