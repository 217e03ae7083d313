// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn obj(path: &str) -> ObjectId {
    ObjectId::new("etl", path)
}

#[tokio::test]
async fn write_then_read_round_trips() {
    let store = FakeObjectStore::new();
    store.write(&obj("cfg/a.toml"), b"glob = \"*\"").await.unwrap();

    assert_eq!(store.read(&obj("cfg/a.toml")).await.unwrap(), b"glob = \"*\"");
}

#[tokio::test]
async fn read_missing_object_fails() {
    let store = FakeObjectStore::new();
    assert!(store.read(&obj("nope")).await.is_err());
}

#[tokio::test]
async fn move_object_relocates_body() {
    let store = FakeObjectStore::new();
    store.write(&obj("cfg/inbox/data.csv"), b"1,2,3").await.unwrap();

    store
        .move_object(&obj("cfg/inbox/data.csv"), &obj("cfg/processing/data.csv"))
        .await
        .unwrap();

    assert!(!store.contains(&obj("cfg/inbox/data.csv")));
    assert_eq!(
        store.object(&obj("cfg/processing/data.csv")).unwrap(),
        b"1,2,3"
    );
}

#[tokio::test]
async fn injected_move_error_is_one_shot() {
    let store = FakeObjectStore::new();
    store.write(&obj("a"), b"x").await.unwrap();
    store.inject_move_errors(1);

    assert!(store.move_object(&obj("a"), &obj("b")).await.is_err());
    assert!(store.contains(&obj("a")));

    store.move_object(&obj("a"), &obj("b")).await.unwrap();
    assert!(store.contains(&obj("b")));
}

#[tokio::test]
async fn list_recursive_filters_by_prefix() {
    let store = FakeObjectStore::new();
    store.write(&obj("cfg/in/data.csv"), b"").await.unwrap();
    store.write(&obj("cfg/in/sub/deep.csv"), b"").await.unwrap();
    store.write(&obj("cfg/inbox/other.csv"), b"").await.unwrap();

    let ids = store.list("etl", Some("cfg/in"), true).await.unwrap();
    assert_eq!(ids, vec![obj("cfg/in/data.csv"), obj("cfg/in/sub/deep.csv")]);
}

#[tokio::test]
async fn list_non_recursive_collapses_subdirectories() {
    let store = FakeObjectStore::new();
    store.write(&obj("cfg/in/data.csv"), b"").await.unwrap();
    store.write(&obj("cfg/in/sub/deep.csv"), b"").await.unwrap();

    let ids = store.list("etl", Some("cfg/in"), false).await.unwrap();
    assert_eq!(ids, vec![obj("cfg/in/data.csv"), obj("cfg/in/sub/")]);
}

#[tokio::test]
async fn list_ignores_other_namespaces() {
    let store = FakeObjectStore::new();
    store
        .write(&ObjectId::new("staging", "cfg/a.toml"), b"")
        .await
        .unwrap();

    assert!(store.list("etl", None, true).await.unwrap().is_empty());
}

#[tokio::test]
async fn ensure_directory_writes_keep_sentinel_once() {
    let store = FakeObjectStore::new();

    store.ensure_directory(&obj("cfg/inbox")).await.unwrap();
    assert_eq!(store.object(&obj("cfg/inbox/.keep")).unwrap(), b"");

    // Non-empty directory is left alone
    store.write(&obj("cfg/archive/data.csv"), b"x").await.unwrap();
    store.ensure_directory(&obj("cfg/archive")).await.unwrap();
    assert!(!store.contains(&obj("cfg/archive/.keep")));
}

#[tokio::test]
async fn download_and_upload_use_local_files() {
    let store = FakeObjectStore::new();
    let dir = tempfile::tempdir().unwrap();
    store.write(&obj("cfg/in/data.csv"), b"payload").await.unwrap();

    let local = dir.path().join("data.csv");
    store.download(&obj("cfg/in/data.csv"), &local).await.unwrap();
    assert_eq!(std::fs::read(&local).unwrap(), b"payload");

    store.upload(&local, &obj("cfg/error/log.txt")).await.unwrap();
    assert_eq!(store.object(&obj("cfg/error/log.txt")).unwrap(), b"payload");
}

#[tokio::test]
async fn metadata_reports_content_length() {
    let store = FakeObjectStore::new();
    store.write(&obj("cfg/in/data.csv"), b"0123456789").await.unwrap();

    let meta = store.metadata(&obj("cfg/in/data.csv")).await.unwrap();
    assert_eq!(meta.get("content-length").map(String::as_str), Some("10"));
}
