//! ## valv-cli
//! **Unified operational interface**
//! Valv main entrypoint with the backup pipeline and the inventory
//! monitoring mode.
//!
//! ### Expectations:
//! - POSIX-compliant argument parsing
//! - Exit code 0 only when the run had nothing fatal to say
//! - Structured logs for every lifecycle milestone

use clap::Parser;
use valv_telemetry::logging::EventLogger;
use valv_telemetry::metrics::MetricsRecorder;

mod commands;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    EventLogger::init();
    let metrics = MetricsRecorder::new();
    let cli = Cli::parse();

    match cli.command {
        Commands::Backup(args) => commands::run_backup_command(args, metrics).await,
        Commands::Monitor(args) => commands::run_monitor_command(args, metrics).await,
    }
}
