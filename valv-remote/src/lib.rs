//! valv-remote
//!
//! The durable remote tier. A small `RemoteStore` trait covers the two
//! operations the engine needs (put and list); behind it sit the S3
//! backend used in production and an in-memory store with fault injection
//! for tests. The `Publisher` on top owns key derivation, object
//! metadata, and the unconfigured/no-op and degraded-scan policies.

pub mod error;
pub mod publisher;
pub mod s3;
pub mod store;

pub use error::RemoteError;
pub use publisher::{PublishDisposition, Publisher, RemoteScan};
pub use s3::S3RemoteStore;
pub use store::{MemoryRemoteStore, ObjectMeta, RemoteObject, RemoteStore};
