//! S3 backend for the remote store.

use std::path::Path;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::primitives::ByteStream;
use chrono::{DateTime, Utc};

use valv_config::RemoteConfig;

use crate::error::RemoteError;
use crate::store::{ObjectMeta, RemoteObject, RemoteStore};

/// Production backend over an S3 bucket.
///
/// Credentials come from the AWS default provider chain, so CI secrets,
/// instance profiles, and local profiles all work unchanged.
pub struct S3RemoteStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3RemoteStore {
    /// Build a client for the configured bucket and region.
    pub async fn connect(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let bucket = config.bucket.clone().ok_or_else(|| RemoteError::Connect {
            message: "remote bucket is not configured".to_string(),
        })?;

        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        Ok(Self {
            client: aws_sdk_s3::Client::new(&shared),
            bucket,
        })
    }
}

fn content_type_for(key: &str) -> &'static str {
    if key.ends_with(".gz") {
        "application/gzip"
    } else if key.ends_with(".json") {
        "application/json"
    } else {
        "application/octet-stream"
    }
}

#[async_trait]
impl RemoteStore for S3RemoteStore {
    async fn put(&self, key: &str, source: &Path, meta: &ObjectMeta) -> Result<(), RemoteError> {
        let body = ByteStream::from_path(source)
            .await
            .map_err(|e| RemoteError::Upload {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type_for(key))
            .metadata("backup-date", meta.created_at.to_rfc3339())
            .metadata("backup-type", meta.category.to_string())
            .metadata("project", &meta.project)
            .send()
            .await
            .map_err(|e| RemoteError::Upload {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<RemoteObject>, RemoteError> {
        let mut objects = Vec::new();
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| RemoteError::List {
                message: e.to_string(),
            })?;
            for object in page.contents() {
                let Some(key) = object.key() else { continue };
                let last_modified = object
                    .last_modified()
                    .and_then(|ts| DateTime::<Utc>::from_timestamp(ts.secs(), ts.subsec_nanos()))
                    .unwrap_or_else(Utc::now);
                objects.push(RemoteObject {
                    key: key.to_string(),
                    size_bytes: object.size().unwrap_or(0).max(0) as u64,
                    last_modified,
                });
            }
        }

        Ok(objects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types_follow_the_artifact_extension() {
        assert_eq!(
            content_type_for("backups/database/a.sql.gz"),
            "application/gzip"
        );
        assert_eq!(content_type_for("backups/config/a.json"), "application/json");
        assert_eq!(
            content_type_for("backups/other/a.bin"),
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn connect_requires_a_bucket() {
        let config = RemoteConfig::default();
        assert!(matches!(
            S3RemoteStore::connect(&config).await,
            Err(RemoteError::Connect { .. })
        ));
    }
}
