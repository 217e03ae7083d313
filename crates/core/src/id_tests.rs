// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn generate_is_unique() {
    let a = JobId::generate();
    let b = JobId::generate();
    assert_ne!(a, b);
}

#[test]
fn generate_is_short_and_unpadded() {
    let id = JobId::generate();
    // 16 UUID bytes in unpadded base64
    assert_eq!(id.as_str().len(), 22);
    assert!(!id.as_str().contains('='));
}

#[test]
fn job_id_display_matches_as_str() {
    let id = JobId::new("abc123");
    assert_eq!(id.to_string(), "abc123");
    assert_eq!(id.as_str(), "abc123");
}

#[test]
fn job_id_serde_is_a_plain_string() {
    let id = JobId::new("abc123");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"abc123\"");
}
