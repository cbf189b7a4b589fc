//! The `RemoteStore` seam and the in-memory backend used by tests.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use valv_core::BackupCategory;

use crate::error::RemoteError;

/// Metadata attached to every published object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    pub category: BackupCategory,
    pub created_at: DateTime<Utc>,
    pub project: String,
}

/// One object as seen by a remote listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    pub key: String,
    pub size_bytes: u64,
    pub last_modified: DateTime<Utc>,
}

/// Minimal remote object store interface.
///
/// `put` with an existing key overwrites; re-publishing an artifact is
/// always safe.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn put(&self, key: &str, source: &Path, meta: &ObjectMeta) -> Result<(), RemoteError>;

    /// List every object whose key starts with `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<RemoteObject>, RemoteError>;
}

/// In-memory backend with fault injection, for exercising publisher and
/// engine behavior without any network.
#[derive(Default)]
pub struct MemoryRemoteStore {
    objects: Mutex<BTreeMap<String, RemoteObject>>,
    fail_puts: AtomicBool,
    fail_lists: AtomicBool,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `put` fail.
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `list` fail.
    pub fn fail_lists(&self, fail: bool) {
        self.fail_lists.store(fail, Ordering::SeqCst);
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().len()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().keys().cloned().collect()
    }

    /// Insert an object directly, bypassing `put`. Lets tests shape the
    /// remote inventory without touching a filesystem.
    pub fn seed(&self, key: &str, size_bytes: u64, last_modified: DateTime<Utc>) {
        self.objects.lock().insert(
            key.to_string(),
            RemoteObject {
                key: key.to_string(),
                size_bytes,
                last_modified,
            },
        );
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn put(&self, key: &str, source: &Path, meta: &ObjectMeta) -> Result<(), RemoteError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(RemoteError::Upload {
                key: key.to_string(),
                message: "injected upload fault".to_string(),
            });
        }

        let size_bytes = std::fs::metadata(source)
            .map_err(|e| RemoteError::Upload {
                key: key.to_string(),
                message: e.to_string(),
            })?
            .len();

        self.objects.lock().insert(
            key.to_string(),
            RemoteObject {
                key: key.to_string(),
                size_bytes,
                last_modified: meta.created_at,
            },
        );
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<RemoteObject>, RemoteError> {
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(RemoteError::List {
                message: "injected listing fault".to_string(),
            });
        }

        Ok(self
            .objects
            .lock()
            .values()
            .filter(|object| object.key.starts_with(prefix))
            .cloned()
            .collect())
    }
}
