//! valv-store
//!
//! The local half of the backup pipeline: producing artifacts by driving
//! the external dump and archive tools, and scanning or pruning what is
//! already on disk. Decision logic lives in valv-core; this crate only
//! wraps the I/O.

pub mod error;
pub mod local;
pub mod producer;

pub use error::StoreError;
pub use local::LocalStore;
pub use producer::{ArtifactProducer, CommandProducer};
