// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::handler::{FileHandler, HandlerError};
use castiron_adapters::{FakeMessageProducer, FakeObjectStore, ProducedMessage};
use parking_lot::Mutex;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

const BUCKET: &str = "etl";

const CSV_SHELL_CONFIG: &str = r#"
inbox_directory = "in"
glob = "*.csv"
shell = "cat \"$ETL_FILENAME\" > /dev/null"
"#;

fn obj(path: &str) -> ObjectId {
    ObjectId::new(BUCKET, path)
}

fn put_payload(path: &str) -> Value {
    json!({
        "Key": format!("{BUCKET}/{path}"),
        "EventName": "s3:ObjectCreated:Put",
    })
}

fn delete_payload(path: &str) -> Value {
    json!({
        "Key": format!("{BUCKET}/{path}"),
        "EventName": "s3:ObjectRemoved:Delete",
    })
}

struct Harness {
    store: FakeObjectStore,
    producer: FakeMessageProducer,
    processor: EventProcessor<FakeObjectStore, FakeMessageProducer>,
}

async fn start(store: FakeObjectStore) -> Harness {
    start_with_handlers(store, HandlerRegistry::new()).await
}

async fn start_with_handlers(store: FakeObjectStore, handlers: HandlerRegistry) -> Harness {
    let producer = FakeMessageProducer::new();
    let processor = EventProcessor::start(
        store.clone(),
        producer.clone(),
        handlers,
        EngineConfig {
            bucket: BUCKET.to_string(),
            database_env: DatabaseEnv::default(),
        },
    )
    .await
    .unwrap();
    Harness {
        store,
        producer,
        processor,
    }
}

#[tokio::test]
async fn startup_scan_registers_configs_and_seeds_directories() {
    let store = FakeObjectStore::new();
    store.put_object(&obj("cfg/a.toml"), CSV_SHELL_CONFIG.as_bytes());

    let h = start(store).await;

    assert_eq!(h.processor.config_count(), 1);
    assert!(h.store.contains(&obj("cfg/in/.keep")));
    assert!(h.store.contains(&obj("cfg/processing/.keep")));
    assert!(h.store.contains(&obj("cfg/archive/.keep")));
    // Error directory is created on demand, not at registration
    assert!(!h.store.contains(&obj("cfg/error/.keep")));
}

#[tokio::test]
async fn startup_scan_skips_invalid_configs() {
    let store = FakeObjectStore::new();
    store.put_object(&obj("cfg/bad.toml"), b"glob = {{{");
    store.put_object(&obj("cfg/a.toml"), CSV_SHELL_CONFIG.as_bytes());

    let h = start(store).await;

    assert_eq!(h.processor.config_count(), 1);
}

#[tokio::test]
async fn shell_job_archives_file_and_reports_success() {
    let store = FakeObjectStore::new();
    store.put_object(&obj("cfg/a.toml"), CSV_SHELL_CONFIG.as_bytes());
    let mut h = start(store).await;

    h.store.put_object(&obj("cfg/in/data.csv"), b"0123456789");
    h.processor.process(&put_payload("cfg/in/data.csv")).await;

    assert!(h.store.contains(&obj("cfg/archive/data.csv")));
    assert!(!h.store.contains(&obj("cfg/in/data.csv")));
    assert!(!h.store.contains(&obj("cfg/processing/data.csv")));

    let messages = h.producer.messages();
    assert_eq!(messages.len(), 2);
    assert!(matches!(
        &messages[0],
        ProducedMessage::Created { filename, handler, uploader, .. }
            if filename == "data.csv" && handler == "a.toml" && uploader == "castiron"
    ));
    assert!(matches!(
        &messages[1],
        ProducedMessage::Status { status: JobStatus::Success, .. }
    ));
    assert_eq!(messages[0].job_id(), messages[1].job_id());
}

#[tokio::test]
async fn failed_shell_job_moves_file_to_error_and_uploads_log() {
    let store = FakeObjectStore::new();
    store.put_object(
        &obj("cfg/a.toml"),
        br#"
inbox_directory = "in"
glob = "*.csv"
save_error_log = true
shell = "echo doomed; exit 3"
"#,
    );
    let mut h = start(store).await;

    h.store.put_object(&obj("cfg/in/data.csv"), b"1,2,3");
    h.processor.process(&put_payload("cfg/in/data.csv")).await;

    assert!(h.store.contains(&obj("cfg/error/data.csv")));
    assert!(!h.store.contains(&obj("cfg/in/data.csv")));
    assert!(!h.store.contains(&obj("cfg/processing/data.csv")));

    let log = h.store.object(&obj("cfg/error/data_csv_error_log.txt")).unwrap();
    assert!(String::from_utf8_lossy(&log).contains("doomed"));

    let messages = h.producer.messages();
    assert!(matches!(
        messages.last(),
        Some(ProducedMessage::Status { status: JobStatus::Failure, .. })
    ));
}

#[tokio::test]
async fn failed_job_without_save_error_log_uploads_nothing() {
    let store = FakeObjectStore::new();
    store.put_object(
        &obj("cfg/a.toml"),
        br#"
inbox_directory = "in"
glob = "*.csv"
shell = "exit 1"
"#,
    );
    let mut h = start(store).await;

    h.store.put_object(&obj("cfg/in/data.csv"), b"1");
    h.processor.process(&put_payload("cfg/in/data.csv")).await;

    assert!(h.store.contains(&obj("cfg/error/data.csv")));
    assert!(!h.store.contains(&obj("cfg/error/data_csv_error_log.txt")));
}

#[tokio::test]
async fn progress_pipe_relays_updates_in_order() {
    let store = FakeObjectStore::new();
    store.put_object(
        &obj("cfg/a.toml"),
        br#"
inbox_directory = "in"
glob = "*.csv"
shell = "printf 'task load\nprogress 1/4\nprogress 0.5\ncommitted 42\n' > \"$PIZZA_TRACKER\""
"#,
    );
    let mut h = start(store).await;

    h.store.put_object(&obj("cfg/in/data.csv"), b"1,2,3");
    h.processor.process(&put_payload("cfg/in/data.csv")).await;

    let messages = h.producer.messages();
    let job_id = messages[0].job_id().clone();
    assert!(messages.iter().all(|m| m.job_id() == &job_id));
    assert!(matches!(&messages[0], ProducedMessage::Created { .. }));
    assert_eq!(
        messages[1],
        ProducedMessage::Task {
            job_id: job_id.clone(),
            task: "load".to_string(),
        }
    );
    assert_eq!(
        messages[2],
        ProducedMessage::Progress {
            job_id: job_id.clone(),
            progress: 0.25,
        }
    );
    assert_eq!(
        messages[3],
        ProducedMessage::Progress {
            job_id: job_id.clone(),
            progress: 0.5,
        }
    );
    assert_eq!(
        messages[4],
        ProducedMessage::Committed {
            job_id: job_id.clone(),
            committed: 42,
        }
    );
    assert_eq!(
        messages[5],
        ProducedMessage::Status {
            job_id,
            status: JobStatus::Success,
        }
    );
}

#[tokio::test]
async fn glob_miss_leaves_file_untouched() {
    let store = FakeObjectStore::new();
    store.put_object(&obj("cfg/a.toml"), CSV_SHELL_CONFIG.as_bytes());
    let mut h = start(store).await;

    h.store.put_object(&obj("cfg/in/data.txt"), b"nope");
    h.processor.process(&put_payload("cfg/in/data.txt")).await;

    assert!(h.store.contains(&obj("cfg/in/data.txt")));
    assert!(h.producer.messages().is_empty());
}

#[tokio::test]
async fn file_outside_any_inbox_is_ignored() {
    let store = FakeObjectStore::new();
    store.put_object(&obj("cfg/a.toml"), CSV_SHELL_CONFIG.as_bytes());
    let mut h = start(store).await;

    h.store.put_object(&obj("elsewhere/data.csv"), b"nope");
    h.processor.process(&put_payload("elsewhere/data.csv")).await;

    assert_eq!(h.processor.config_count(), 1);
    assert!(h.store.contains(&obj("elsewhere/data.csv")));
    assert!(h.producer.messages().is_empty());
}

#[tokio::test]
async fn disabling_a_config_unregisters_it() {
    let store = FakeObjectStore::new();
    store.put_object(&obj("cfg/a.toml"), CSV_SHELL_CONFIG.as_bytes());
    let mut h = start(store).await;
    assert_eq!(h.processor.config_count(), 1);

    h.store.put_object(
        &obj("cfg/a.toml"),
        br#"
enabled = false
inbox_directory = "in"
glob = "*.csv"
shell = "true"
"#,
    );
    h.processor.process(&put_payload("cfg/a.toml")).await;
    assert_eq!(h.processor.config_count(), 0);

    h.store.put_object(&obj("cfg/in/data.csv"), b"1");
    h.processor.process(&put_payload("cfg/in/data.csv")).await;

    assert!(h.store.contains(&obj("cfg/in/data.csv")));
    assert!(h.producer.messages().is_empty());
}

#[tokio::test]
async fn deleting_a_config_stops_processing() {
    let store = FakeObjectStore::new();
    store.put_object(&obj("cfg/a.toml"), CSV_SHELL_CONFIG.as_bytes());
    let mut h = start(store).await;

    h.processor.process(&delete_payload("cfg/a.toml")).await;
    assert_eq!(h.processor.config_count(), 0);

    h.store.put_object(&obj("cfg/in/data2.csv"), b"1");
    h.processor.process(&put_payload("cfg/in/data2.csv")).await;

    assert!(h.store.contains(&obj("cfg/in/data2.csv")));
    assert!(h.producer.messages().is_empty());
}

#[tokio::test]
async fn deleting_an_unknown_config_is_a_no_op() {
    let mut h = start(FakeObjectStore::new()).await;

    h.processor.process(&delete_payload("cfg/ghost.toml")).await;
    h.processor.process(&delete_payload("cfg/ghost.toml")).await;

    assert_eq!(h.processor.config_count(), 0);
    assert!(h.producer.messages().is_empty());
}

#[tokio::test]
async fn data_file_deletes_are_ignored() {
    let store = FakeObjectStore::new();
    store.put_object(&obj("cfg/a.toml"), CSV_SHELL_CONFIG.as_bytes());
    let mut h = start(store).await;

    h.store.put_object(&obj("cfg/in/data.csv"), b"1");
    h.processor.process(&delete_payload("cfg/in/data.csv")).await;

    assert_eq!(h.processor.config_count(), 1);
    assert!(h.store.contains(&obj("cfg/in/data.csv")));
    assert!(h.producer.messages().is_empty());
}

#[tokio::test]
async fn config_put_via_notification_registers_and_seeds() {
    let mut h = start(FakeObjectStore::new()).await;

    h.store.put_object(&obj("cfg/a.toml"), CSV_SHELL_CONFIG.as_bytes());
    h.processor.process(&put_payload("cfg/a.toml")).await;

    assert_eq!(h.processor.config_count(), 1);
    assert!(h.store.contains(&obj("cfg/in/.keep")));
}

#[tokio::test]
async fn invalid_config_put_is_consumed_without_registration() {
    let mut h = start(FakeObjectStore::new()).await;

    h.store.put_object(&obj("cfg/bad.toml"), b"shell = \"true\"");
    h.processor.process(&put_payload("cfg/bad.toml")).await;

    assert_eq!(h.processor.config_count(), 0);
    assert!(h.producer.messages().is_empty());
}

#[tokio::test]
async fn stage_in_failure_aborts_without_terminal_status() {
    let store = FakeObjectStore::new();
    store.put_object(&obj("cfg/a.toml"), CSV_SHELL_CONFIG.as_bytes());
    let mut h = start(store).await;

    h.store.put_object(&obj("cfg/in/data.csv"), b"1");
    h.store.inject_move_errors(1);
    h.processor.process(&put_payload("cfg/in/data.csv")).await;

    // The claim went out but the pipeline stopped at stage-in
    let messages = h.producer.messages();
    assert_eq!(messages.len(), 1);
    assert!(matches!(&messages[0], ProducedMessage::Created { .. }));
    assert!(h.store.contains(&obj("cfg/in/data.csv")));

    // The worker keeps dispatching afterwards
    h.processor.process(&put_payload("cfg/in/data.csv")).await;
    assert!(h.store.contains(&obj("cfg/archive/data.csv")));
}

#[tokio::test]
async fn overlapping_globs_resolve_to_first_config_in_key_order() {
    let store = FakeObjectStore::new();
    store.put_object(&obj("cfg/b.toml"), CSV_SHELL_CONFIG.as_bytes());
    store.put_object(&obj("cfg/a.toml"), CSV_SHELL_CONFIG.as_bytes());
    let mut h = start(store).await;
    assert_eq!(h.processor.config_count(), 2);

    h.store.put_object(&obj("cfg/in/data.csv"), b"1");
    h.processor.process(&put_payload("cfg/in/data.csv")).await;

    let messages = h.producer.messages();
    assert!(matches!(
        &messages[0],
        ProducedMessage::Created { handler, .. } if handler == "a.toml"
    ));
    assert_eq!(messages.len(), 2);
}

#[derive(Clone, Default)]
struct RecordingHandler {
    calls: Arc<Mutex<Vec<(PathBuf, HandlerContext)>>>,
}

impl FileHandler for RecordingHandler {
    fn run(&self, data_file: &Path, ctx: HandlerContext) -> Result<(), HandlerError> {
        self.calls.lock().push((data_file.to_path_buf(), ctx));
        Ok(())
    }
}

struct FailingHandler;

impl FileHandler for FailingHandler {
    fn run(&self, _data_file: &Path, _ctx: HandlerContext) -> Result<(), HandlerError> {
        Err(HandlerError::from("boom"))
    }
}

struct TrackingHandler;

impl FileHandler for TrackingHandler {
    fn run(&self, _data_file: &Path, ctx: HandlerContext) -> Result<(), HandlerError> {
        let pipe = ctx
            .pizza_tracker
            .ok_or_else(|| HandlerError::from("no tracker offered"))?;
        let mut pipe = std::fs::OpenOptions::new()
            .write(true)
            .open(pipe)
            .map_err(|e| HandlerError(e.to_string()))?;
        pipe.write_all(b"progress 0.5\n")
            .map_err(|e| HandlerError(e.to_string()))?;
        Ok(())
    }
}

const RECORDER_CONFIG: &str = r#"
inbox_directory = "in"
glob = "*.csv"

[python]
module = "test.recorder"
supports_pizza_tracker = true
supports_metadata = true
"#;

#[tokio::test]
async fn in_process_handler_receives_declared_context() {
    let store = FakeObjectStore::new();
    store.put_object(&obj("cfg/a.toml"), RECORDER_CONFIG.as_bytes());
    let recorder = RecordingHandler::default();
    let mut handlers = HandlerRegistry::new();
    handlers.register("test.recorder", recorder.clone());
    let mut h = start_with_handlers(store, handlers).await;

    h.store.put_object(&obj("cfg/in/data.csv"), b"0123456789");
    h.processor.process(&put_payload("cfg/in/data.csv")).await;

    let calls = recorder.calls.lock();
    assert_eq!(calls.len(), 1);
    let (data_file, ctx) = &calls[0];
    assert!(data_file.ends_with("data.csv"));
    assert!(ctx.pizza_tracker.is_some());
    assert_eq!(
        ctx.file_metadata
            .as_ref()
            .and_then(|m| m.get("content-length"))
            .map(String::as_str),
        Some("10")
    );
    drop(calls);

    assert!(h.store.contains(&obj("cfg/archive/data.csv")));
    assert!(matches!(
        h.producer.messages().last(),
        Some(ProducedMessage::Status { status: JobStatus::Success, .. })
    ));
}

#[tokio::test]
async fn capability_flags_off_withhold_context() {
    let store = FakeObjectStore::new();
    store.put_object(
        &obj("cfg/a.toml"),
        br#"
inbox_directory = "in"
glob = "*.csv"

[python]
module = "test.recorder"
"#,
    );
    let recorder = RecordingHandler::default();
    let mut handlers = HandlerRegistry::new();
    handlers.register("test.recorder", recorder.clone());
    let mut h = start_with_handlers(store, handlers).await;

    h.store.put_object(&obj("cfg/in/data.csv"), b"1");
    h.processor.process(&put_payload("cfg/in/data.csv")).await;

    let calls = recorder.calls.lock();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].1.pizza_tracker.is_none());
    assert!(calls[0].1.file_metadata.is_none());
}

#[tokio::test]
async fn failing_handler_reports_failure_and_writes_diagnostic() {
    let store = FakeObjectStore::new();
    store.put_object(
        &obj("cfg/a.toml"),
        br#"
inbox_directory = "in"
glob = "*.csv"
save_error_log = true

[python]
module = "test.failing"
"#,
    );
    let mut handlers = HandlerRegistry::new();
    handlers.register("test.failing", FailingHandler);
    let mut h = start_with_handlers(store, handlers).await;

    h.store.put_object(&obj("cfg/in/data.csv"), b"1");
    h.processor.process(&put_payload("cfg/in/data.csv")).await;

    assert!(h.store.contains(&obj("cfg/error/data.csv")));
    let log = h.store.object(&obj("cfg/error/data_csv_error_log.txt")).unwrap();
    let log = String::from_utf8_lossy(&log);
    assert!(log.contains("test.failing"));
    assert!(log.contains("boom"));
    assert!(matches!(
        h.producer.messages().last(),
        Some(ProducedMessage::Status { status: JobStatus::Failure, .. })
    ));
}

#[tokio::test]
async fn handler_progress_writes_are_drained_after_the_run() {
    let store = FakeObjectStore::new();
    store.put_object(
        &obj("cfg/a.toml"),
        br#"
inbox_directory = "in"
glob = "*.csv"

[python]
module = "test.tracking"
supports_pizza_tracker = true
"#,
    );
    let mut handlers = HandlerRegistry::new();
    handlers.register("test.tracking", TrackingHandler);
    let mut h = start_with_handlers(store, handlers).await;

    h.store.put_object(&obj("cfg/in/data.csv"), b"1");
    h.processor.process(&put_payload("cfg/in/data.csv")).await;

    let messages = h.producer.messages();
    assert_eq!(messages.len(), 3);
    assert!(matches!(
        &messages[1],
        ProducedMessage::Progress { progress, .. } if *progress == 0.5
    ));
    assert!(matches!(
        &messages[2],
        ProducedMessage::Status { status: JobStatus::Success, .. }
    ));
}

#[tokio::test]
async fn config_naming_unknown_handler_is_rejected() {
    let store = FakeObjectStore::new();
    store.put_object(
        &obj("cfg/a.toml"),
        br#"
glob = "*.csv"

[python]
module = "missing.handler"
"#,
    );
    let h = start(store).await;

    assert_eq!(h.processor.config_count(), 0);
}

#[tokio::test]
async fn unparseable_notifications_are_ignored() {
    let store = FakeObjectStore::new();
    store.put_object(&obj("cfg/a.toml"), CSV_SHELL_CONFIG.as_bytes());
    let mut h = start(store).await;

    h.processor.process(&json!({"unexpected": true})).await;

    assert_eq!(h.processor.config_count(), 1);
    assert!(h.producer.messages().is_empty());
}
