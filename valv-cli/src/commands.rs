use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing::{error, info, warn};

use valv_config::{ConfigError, ValvConfig};
use valv_core::{BackupTrigger, BackupType};
use valv_engine::BackupRuntime;
use valv_telemetry::metrics::MetricsRecorder;

#[derive(Parser)]
#[command(name = "valv", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one backup pipeline (produce, publish, rotate)
    Backup(BackupArgs),
    /// Reconcile local and remote inventories and write the status report
    Monitor(MonitorArgs),
}

#[derive(Args, Debug, Clone)]
pub struct BackupArgs {
    /// Backup type; resolved from the trigger when omitted.
    #[arg(short = 't', long)]
    pub backup_type: Option<BackupType>,

    /// Event that initiated this run.
    #[arg(long, default_value = "manual")]
    pub trigger: BackupTrigger,

    /// Change descriptor feeding the type selector (repeatable).
    #[arg(long = "change")]
    pub changes: Vec<String>,

    /// Alternate configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct MonitorArgs {
    /// Alternate configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

fn load_config(path: Option<&Path>) -> Result<ValvConfig, ConfigError> {
    match path {
        Some(path) => ValvConfig::load_from_path(path),
        None => ValvConfig::load(),
    }
}

pub async fn run_backup_command(
    args: BackupArgs,
    metrics: MetricsRecorder,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = load_config(args.config.as_deref())?;
    let runtime = BackupRuntime::connect(config, metrics).await?;

    let outcome = runtime
        .run_backup(args.backup_type, args.trigger, &args.changes)
        .await?;

    info!(
        backup_type = %outcome.backup_type,
        artifacts = outcome.artifacts.len(),
        total_bytes = outcome.total_bytes(),
        uploaded = outcome.uploaded,
        rotated = outcome.deleted.len(),
        "backup run finished"
    );
    if !outcome.upload_failures.is_empty() {
        warn!(
            failures = outcome.upload_failures.len(),
            "some artifacts were not published and remain local only"
        );
    }
    Ok(())
}

pub async fn run_monitor_command(
    args: MonitorArgs,
    metrics: MetricsRecorder,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = load_config(args.config.as_deref())?;
    let runtime = BackupRuntime::connect(config, metrics).await?;

    let report = runtime.run_monitor().await?;

    info!(
        status = ?report.status,
        local = report.local_total,
        remote = report.remote_count,
        alerts = report.alerts.len(),
        "status report written"
    );

    if report.has_critical() {
        error!("critical backup alerts present");
        std::process::exit(1);
    }
    Ok(())
}
