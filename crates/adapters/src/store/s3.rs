// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! S3-compatible object store driver
//!
//! Backed by the `object_store` crate's S3 client, bound to the single
//! ETL bucket the worker watches. MinIO is the usual deployment; plain
//! HTTP endpoints are allowed when `secure` is off.

use super::{ObjectStore, StoreError, KEEP_FILENAME};
use async_trait::async_trait;
use castiron_core::{ObjectEvent, ObjectId};
use futures::TryStreamExt;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as StorePath;
use object_store::ObjectStore as _;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Connection settings for the S3 driver.
#[derive(Debug, Clone)]
pub struct S3Config {
    pub host: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub secure: bool,
    pub notification_arn: String,
}

/// Object store adapter for one S3-compatible bucket.
pub struct S3ObjectStore {
    client: AmazonS3,
    bucket: String,
}

impl S3ObjectStore {
    /// Build a client for the configured bucket.
    ///
    /// The bucket → broker notification route is provisioned out of
    /// band (it is an admin-plane call); the ARN is logged here so a
    /// misconfigured deployment is visible at startup.
    pub fn connect(config: &S3Config) -> Result<Self, StoreError> {
        let scheme = if config.secure { "https" } else { "http" };
        let client = AmazonS3Builder::new()
            .with_endpoint(format!("{scheme}://{}", config.host))
            .with_bucket_name(&config.bucket)
            .with_access_key_id(&config.access_key)
            .with_secret_access_key(&config.secret_key)
            .with_region("us-east-1")
            .with_allow_http(!config.secure)
            .build()?;

        tracing::info!(
            bucket = %config.bucket,
            notification_arn = %config.notification_arn,
            "object store connected"
        );
        Ok(Self {
            client,
            bucket: config.bucket.clone(),
        })
    }

    fn location(&self, obj: &ObjectId) -> Result<StorePath, StoreError> {
        if obj.namespace != self.bucket {
            return Err(StoreError::Namespace(obj.namespace.clone()));
        }
        Ok(StorePath::from(obj.path.as_str()))
    }

    fn check_namespace(&self, namespace: &str) -> Result<(), StoreError> {
        if namespace != self.bucket {
            return Err(StoreError::Namespace(namespace.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list(
        &self,
        namespace: &str,
        prefix: Option<&str>,
        recursive: bool,
    ) -> Result<Vec<ObjectId>, StoreError> {
        self.check_namespace(namespace)?;
        let prefix = prefix.map(|p| StorePath::from(p.trim_end_matches('/')));

        let mut ids = Vec::new();
        if recursive {
            let mut stream = self.client.list(prefix.as_ref());
            while let Some(meta) = stream.try_next().await? {
                ids.push(ObjectId::new(namespace, meta.location.to_string()));
            }
        } else {
            let listing = self.client.list_with_delimiter(prefix.as_ref()).await?;
            for dir in listing.common_prefixes {
                ids.push(ObjectId::new(namespace, format!("{dir}/")));
            }
            for meta in listing.objects {
                ids.push(ObjectId::new(namespace, meta.location.to_string()));
            }
        }
        Ok(ids)
    }

    async fn read(&self, obj: &ObjectId) -> Result<Vec<u8>, StoreError> {
        let location = self.location(obj)?;
        let body = self.client.get(&location).await?.bytes().await?;
        Ok(body.to_vec())
    }

    async fn write(&self, obj: &ObjectId, data: &[u8]) -> Result<(), StoreError> {
        let location = self.location(obj)?;
        self.client
            .put(&location, bytes::Bytes::copy_from_slice(data))
            .await?;
        Ok(())
    }

    async fn download(&self, src: &ObjectId, dest: &Path) -> Result<(), StoreError> {
        let location = self.location(src)?;
        let body = self.client.get(&location).await?.bytes().await?;
        tokio::fs::write(dest, body).await?;
        Ok(())
    }

    async fn upload(&self, src: &Path, dest: &ObjectId) -> Result<(), StoreError> {
        let location = self.location(dest)?;
        let body = tokio::fs::read(src).await?;
        self.client.put(&location, body.into()).await?;
        Ok(())
    }

    async fn move_object(&self, src: &ObjectId, dest: &ObjectId) -> Result<(), StoreError> {
        let from = self.location(src)?;
        let to = self.location(dest)?;
        self.client.copy(&from, &to).await?;
        self.client.delete(&from).await?;
        Ok(())
    }

    async fn delete(&self, obj: &ObjectId) -> Result<(), StoreError> {
        let location = self.location(obj)?;
        self.client.delete(&location).await?;
        Ok(())
    }

    async fn metadata(&self, obj: &ObjectId) -> Result<HashMap<String, String>, StoreError> {
        let location = self.location(obj)?;
        let meta = self.client.head(&location).await?;

        let mut map = HashMap::new();
        map.insert("content-length".to_string(), meta.size.to_string());
        map.insert("last-modified".to_string(), meta.last_modified.to_rfc3339());
        if let Some(e_tag) = meta.e_tag {
            map.insert("etag".to_string(), e_tag);
        }
        if let Some(version) = meta.version {
            map.insert("version".to_string(), version);
        }
        Ok(map)
    }

    async fn ensure_directory(&self, dir: &ObjectId) -> Result<(), StoreError> {
        let existing = self.list(&dir.namespace, Some(&dir.path), false).await?;
        if existing.is_empty() {
            let keep = ObjectId::new(&dir.namespace, format!("{}/{KEEP_FILENAME}", dir.path));
            self.write(&keep, b"").await?;
        }
        Ok(())
    }

    fn parse_notification(&self, raw: &Value) -> Result<ObjectEvent, StoreError> {
        super::parse_s3_notification(raw)
    }
}
