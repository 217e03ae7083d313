// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory fake object store for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ObjectStore, StoreError, KEEP_FILENAME};
use async_trait::async_trait;
use castiron_core::{ObjectEvent, ObjectId};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

struct FakeStoreState {
    objects: BTreeMap<ObjectId, Vec<u8>>,
    move_errors: u32,
}

/// In-memory object store keyed the same way as the real bucket.
#[derive(Clone)]
pub struct FakeObjectStore {
    inner: Arc<Mutex<FakeStoreState>>,
}

impl Default for FakeObjectStore {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeStoreState {
                objects: BTreeMap::new(),
                move_errors: 0,
            })),
        }
    }
}

impl FakeObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without going through the async trait.
    pub fn put_object(&self, obj: &ObjectId, data: &[u8]) {
        self.inner.lock().objects.insert(obj.clone(), data.to_vec());
    }

    /// Fail the next `count` move operations with a backend error.
    pub fn inject_move_errors(&self, count: u32) {
        self.inner.lock().move_errors = count;
    }

    pub fn contains(&self, obj: &ObjectId) -> bool {
        self.inner.lock().objects.contains_key(obj)
    }

    pub fn object(&self, obj: &ObjectId) -> Option<Vec<u8>> {
        self.inner.lock().objects.get(obj).cloned()
    }
}

fn under_prefix(path: &str, prefix: Option<&str>) -> bool {
    match prefix {
        None => true,
        Some(p) => {
            let p = p.trim_end_matches('/');
            path == p || path.starts_with(&format!("{p}/"))
        }
    }
}

#[async_trait]
impl ObjectStore for FakeObjectStore {
    async fn list(
        &self,
        namespace: &str,
        prefix: Option<&str>,
        recursive: bool,
    ) -> Result<Vec<ObjectId>, StoreError> {
        let inner = self.inner.lock();
        let mut ids = Vec::new();
        for id in inner.objects.keys() {
            if id.namespace != namespace || !under_prefix(&id.path, prefix) {
                continue;
            }
            if recursive {
                ids.push(id.clone());
                continue;
            }
            // Collapse nested keys to their first segment below the prefix
            let below = match prefix {
                Some(p) => id.path[p.trim_end_matches('/').len()..].trim_start_matches('/'),
                None => id.path.as_str(),
            };
            let entry = match below.split_once('/') {
                Some((dir, _)) => {
                    let base = prefix.map(|p| p.trim_end_matches('/')).unwrap_or("");
                    if base.is_empty() {
                        ObjectId::new(namespace, format!("{dir}/"))
                    } else {
                        ObjectId::new(namespace, format!("{base}/{dir}/"))
                    }
                }
                None => id.clone(),
            };
            if ids.last() != Some(&entry) {
                ids.push(entry);
            }
        }
        Ok(ids)
    }

    async fn read(&self, obj: &ObjectId) -> Result<Vec<u8>, StoreError> {
        self.object(obj)
            .ok_or_else(|| StoreError::Backend(format!("no such object: {obj}")))
    }

    async fn write(&self, obj: &ObjectId, data: &[u8]) -> Result<(), StoreError> {
        self.put_object(obj, data);
        Ok(())
    }

    async fn download(&self, src: &ObjectId, dest: &Path) -> Result<(), StoreError> {
        let body = self.read(src).await?;
        tokio::fs::write(dest, body).await?;
        Ok(())
    }

    async fn upload(&self, src: &Path, dest: &ObjectId) -> Result<(), StoreError> {
        let body = tokio::fs::read(src).await?;
        self.put_object(dest, &body);
        Ok(())
    }

    async fn move_object(&self, src: &ObjectId, dest: &ObjectId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if inner.move_errors > 0 {
            inner.move_errors -= 1;
            return Err(StoreError::Backend("injected move error".to_string()));
        }
        let body = inner
            .objects
            .get(src)
            .cloned()
            .ok_or_else(|| StoreError::Backend(format!("no such object: {src}")))?;
        inner.objects.insert(dest.clone(), body);
        inner.objects.remove(src);
        Ok(())
    }

    async fn delete(&self, obj: &ObjectId) -> Result<(), StoreError> {
        self.inner.lock().objects.remove(obj);
        Ok(())
    }

    async fn metadata(&self, obj: &ObjectId) -> Result<HashMap<String, String>, StoreError> {
        let body = self.read(obj).await?;
        let mut map = HashMap::new();
        map.insert("content-length".to_string(), body.len().to_string());
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

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
