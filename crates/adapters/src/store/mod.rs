// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Object store adapters

mod notification;
mod s3;

pub use notification::parse_s3_notification;
pub use s3::{S3Config, S3ObjectStore};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeObjectStore;

use async_trait::async_trait;
use castiron_core::{ObjectEvent, ObjectId};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Sentinel written into otherwise-empty staging directories so they
/// exist as listable prefixes.
pub const KEEP_FILENAME: &str = ".keep";

/// Errors from object store operations.
///
/// The worker treats all of these as fatal to the file pipeline that
/// hit them but never to the worker itself.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(#[from] object_store::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid notification payload: {0}")]
    Notification(String),

    #[error("namespace {0:?} is not served by this store")]
    Namespace(String),

    #[error("{0}")]
    Backend(String),
}

/// Adapter for an S3-compatible object store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List object ids under a prefix. With `recursive` false only the
    /// immediate children of the prefix are returned.
    async fn list(
        &self,
        namespace: &str,
        prefix: Option<&str>,
        recursive: bool,
    ) -> Result<Vec<ObjectId>, StoreError>;

    /// Read an object's full body.
    async fn read(&self, obj: &ObjectId) -> Result<Vec<u8>, StoreError>;

    /// Write an object, replacing any existing body.
    async fn write(&self, obj: &ObjectId, data: &[u8]) -> Result<(), StoreError>;

    /// Download an object to a local file.
    async fn download(&self, src: &ObjectId, dest: &Path) -> Result<(), StoreError>;

    /// Upload a local file to an object.
    async fn upload(&self, src: &Path, dest: &ObjectId) -> Result<(), StoreError>;

    /// Move an object: copy then delete. Repeating an identical
    /// `src` → `dst` move is idempotent in effect, but the object is
    /// briefly present at both locations.
    async fn move_object(&self, src: &ObjectId, dest: &ObjectId) -> Result<(), StoreError>;

    /// Delete an object.
    async fn delete(&self, obj: &ObjectId) -> Result<(), StoreError>;

    /// Retrieve an object's metadata as a string map.
    async fn metadata(&self, obj: &ObjectId) -> Result<HashMap<String, String>, StoreError>;

    /// If nothing exists under `dir.path/`, write an empty sentinel at
    /// `dir.path/.keep` so the directory is listable.
    async fn ensure_directory(&self, dir: &ObjectId) -> Result<(), StoreError>;

    /// Parse a raw notification payload into an object event.
    fn parse_notification(&self, raw: &Value) -> Result<ObjectEvent, StoreError>;
}
