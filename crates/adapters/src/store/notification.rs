// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! S3 bucket notification parsing

use super::StoreError;
use castiron_core::{EventType, ObjectEvent, ObjectId};
use serde_json::Value;

/// Parse an S3-style bucket notification payload.
///
/// The payload carries `Key` as `<bucket>/<path>` and an `EventName`
/// such as `s3:ObjectCreated:Put` or `s3:ObjectRemoved:Delete`. Any
/// event that is not a removal is treated as a put.
pub fn parse_s3_notification(raw: &Value) -> Result<ObjectEvent, StoreError> {
    let key = raw
        .get("Key")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::Notification("missing Key".to_string()))?;
    let (bucket, path) = key
        .split_once('/')
        .ok_or_else(|| StoreError::Notification(format!("Key {key:?} has no path component")))?;
    let event_name = raw
        .get("EventName")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::Notification("missing EventName".to_string()))?;

    let event_type = if event_name.starts_with("s3:ObjectRemoved") {
        EventType::Delete
    } else {
        EventType::Put
    };
    Ok(ObjectEvent::new(ObjectId::new(bucket, path), event_type))
}

#[cfg(test)]
#[path = "notification_tests.rs"]
mod tests;
