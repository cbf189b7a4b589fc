use thiserror::Error;
use tokio::task::JoinError;
use valv_config::ConfigError;
use valv_core::ReportError;
use valv_remote::RemoteError;
use valv_store::StoreError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Production error: {0}")]
    Production(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Remote storage error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Task error: {0}")]
    Join(#[from] JoinError),
}
