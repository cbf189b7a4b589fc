//! Error types for the remote storage tier.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("remote store connection failed: {message}")]
    Connect { message: String },

    #[error("upload of {key} failed: {message}")]
    Upload { key: String, message: String },

    #[error("remote listing failed: {message}")]
    List { message: String },
}
