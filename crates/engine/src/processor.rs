// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event processor
//!
//! The single consumer of object-store notifications. Keeps the
//! in-memory registry of processor configs, routes data-file puts to
//! the first matching config, and drives each matched file through the
//! staged pipeline while a shell command or in-process handler runs
//! against the downloaded copy.

use crate::env::{shell_environment, DatabaseEnv};
use crate::error::EngineError;
use crate::handler::{HandlerContext, HandlerRegistry};
use crate::tracker::{PizzaTracker, TrackerEvent};
use castiron_adapters::{JobStatus, MessageProducer, ObjectStore};
use castiron_core::paths;
use castiron_core::{
    EventType, InProcessConfig, JobId, ObjectId, ProcessorConfig, CONFIG_SUFFIX,
};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Uploader name stamped on every `job_created` message.
pub const UPLOADER: &str = "castiron";

/// How often a running child is reaped and its progress pipe drained.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

const OUTPUT_LOG_FILENAME: &str = "out.txt";

/// Static wiring for the event processor.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Bucket scanned for configs and watched for data files.
    pub bucket: String,
    /// Credentials forwarded to shell handlers.
    pub database_env: DatabaseEnv,
}

/// The worker's core state machine.
///
/// All registry access happens on the dispatch path; one notification
/// is processed to completion before the next is looked at.
pub struct EventProcessor<S, M> {
    store: S,
    producer: M,
    handlers: HandlerRegistry,
    registry: BTreeMap<ObjectId, ProcessorConfig>,
    config: EngineConfig,
}

impl<S: ObjectStore, M: MessageProducer> EventProcessor<S, M> {
    /// Scan the bucket for existing processor configs and return a
    /// processor ready for dispatch.
    ///
    /// Configs that fail to parse are logged and skipped; a failure to
    /// list the bucket itself is fatal.
    pub async fn start(
        store: S,
        producer: M,
        handlers: HandlerRegistry,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        let mut processor = Self {
            store,
            producer,
            handlers,
            registry: BTreeMap::new(),
            config,
        };

        let bucket = processor.config.bucket.clone();
        for obj in processor.store.list(&bucket, None, true).await? {
            if !obj.path.ends_with(CONFIG_SUFFIX) {
                continue;
            }
            if let Err(err) = processor.config_put(&obj).await {
                tracing::warn!(config = %obj, error = %err, "skipping config during startup scan");
            }
        }
        tracing::info!(configs = processor.registry.len(), "startup scan complete");
        Ok(processor)
    }

    /// Number of currently registered configs.
    pub fn config_count(&self) -> usize {
        self.registry.len()
    }

    /// Dispatch one raw notification payload.
    ///
    /// Never fails the worker: parse failures and aborted pipelines are
    /// logged and the event is consumed.
    pub async fn process(&mut self, payload: &Value) {
        let evt = match self.store.parse_notification(payload) {
            Ok(evt) => evt,
            Err(err) => {
                tracing::warn!(error = %err, "ignoring unparseable notification");
                return;
            }
        };

        let is_config = evt.object_id.path.ends_with(CONFIG_SUFFIX);
        match evt.event_type {
            EventType::Delete => {
                // Data-file deletes are not acted upon
                if is_config {
                    self.config_delete(&evt.object_id);
                }
            }
            EventType::Put if is_config => {
                if let Err(err) = self.config_put(&evt.object_id).await {
                    tracing::error!(config = %evt.object_id, error = %err, "config registration failed");
                }
            }
            EventType::Put => {
                if let Err(err) = self.file_put(&evt.object_id).await {
                    tracing::error!(object = %evt.object_id, error = %err, "file pipeline aborted");
                }
            }
        }
    }

    /// Register (or re-register) the config stored at `config_id`.
    ///
    /// Returns false for documents that do not validate. A valid but
    /// disabled config removes any prior registration under the same id.
    async fn config_put(&mut self, config_id: &ObjectId) -> Result<bool, EngineError> {
        let body = self.store.read(config_id).await?;
        let doc = String::from_utf8_lossy(&body);
        let cfg = match ProcessorConfig::parse(&doc) {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!(config = %config_id, error = %err, "invalid processor config");
                return Ok(false);
            }
        };

        if let Some(py) = &cfg.python {
            if !self.handlers.contains(&py.module) {
                tracing::warn!(
                    config = %config_id,
                    module = %py.module,
                    "config names an unknown in-process handler"
                );
                return Ok(false);
            }
        }

        if !cfg.enabled {
            if self.registry.remove(config_id).is_some() {
                tracing::info!(config = %config_id, "config disabled, unregistered");
            }
            return Ok(true);
        }

        let inbox = paths::inbox_path(config_id, &cfg, None);
        let processing = paths::processing_path(config_id, &cfg, None);
        let archive = paths::archive_path(config_id, &cfg, None);
        self.registry.insert(config_id.clone(), cfg);
        tracing::info!(config = %config_id, "config registered");

        // The error directory is created on demand by the first failure
        self.store.ensure_directory(&inbox).await?;
        self.store.ensure_directory(&processing).await?;
        self.store.ensure_directory(&archive).await?;
        Ok(true)
    }

    /// Drop the registration for `config_id`, if any. Idempotent.
    fn config_delete(&mut self, config_id: &ObjectId) -> bool {
        let removed = self.registry.remove(config_id).is_some();
        if removed {
            tracing::info!(config = %config_id, "config unregistered");
        }
        removed
    }

    /// Run the staged pipeline for a data file, if any config claims it.
    ///
    /// Configs are consulted in registry order (lexicographic by config
    /// id); the first match handles the file and iteration stops.
    async fn file_put(&mut self, data: &ObjectId) -> Result<bool, EngineError> {
        let matched = self.registry.iter().find_map(|(config_id, cfg)| {
            let claimed = paths::parent(data) == paths::inbox_path(config_id, cfg, None)
                && paths::glob_matches(data, config_id, cfg);
            claimed.then(|| (config_id.clone(), cfg.clone()))
        });
        let Some((config_id, cfg)) = matched else {
            return Ok(false);
        };

        let processing_file = paths::processing_path(&config_id, &cfg, Some(data));
        let archive_file = paths::archive_path(&config_id, &cfg, Some(data));
        let error_file = paths::error_path(&config_id, &cfg, Some(data));
        let log_object_name = format!("{}_error_log.txt", paths::filename(data).replace('.', "_"));
        let error_log_file =
            paths::error_path(&config_id, &cfg, Some(&paths::rename(data, &log_object_name)));

        let job_id = JobId::generate();
        tracing::info!(job_id = %job_id, object = %data, config = %config_id, "starting job");
        let _ = self
            .producer
            .job_created(
                &job_id,
                paths::filename(data),
                paths::filename(&config_id),
                UPLOADER,
            )
            .await;

        self.store.move_object(data, &processing_file).await?;

        let work_dir = tempfile::tempdir()?;
        let local_data_file = work_dir.path().join(paths::filename(data));
        self.store.download(&processing_file, &local_data_file).await?;
        let metadata = self.store.metadata(&processing_file).await?;
        let log_path = work_dir.path().join(OUTPUT_LOG_FILENAME);
        let mut tracker = PizzaTracker::create(work_dir.path())?;

        let success = match (&cfg.shell, &cfg.python) {
            (Some(command), _) => {
                self.run_shell(
                    command,
                    &local_data_file,
                    &metadata,
                    &log_path,
                    cfg.save_error_log,
                    &mut tracker,
                    &job_id,
                )
                .await?
            }
            (None, Some(py)) => {
                self.run_handler(py, &local_data_file, &metadata, &log_path, &mut tracker, &job_id)
                    .await?
            }
            (None, None) => {
                // Parse validation makes this unreachable for registered
                // configs; the file stays in processing.
                tracing::error!(config = %config_id, "no shell or in-process handler configured");
                return Ok(false);
            }
        };

        if success {
            self.store.move_object(&processing_file, &archive_file).await?;
            let _ = self.producer.job_evt_status(&job_id, JobStatus::Success).await;
            tracing::info!(job_id = %job_id, "job succeeded");
        } else {
            self.store.move_object(&processing_file, &error_file).await?;
            let _ = self.producer.job_evt_status(&job_id, JobStatus::Failure).await;
            if cfg.save_error_log {
                self.store.upload(&log_path, &error_log_file).await?;
            }
            tracing::warn!(job_id = %job_id, "job failed");
        }
        Ok(true)
    }

    /// Spawn the config's command through a login shell and poll it to
    /// completion, draining the progress pipe on every tick.
    #[allow(clippy::too_many_arguments)]
    async fn run_shell(
        &self,
        command: &str,
        data_file: &Path,
        metadata: &HashMap<String, String>,
        log_path: &Path,
        save_log: bool,
        tracker: &mut PizzaTracker,
        job_id: &JobId,
    ) -> Result<bool, EngineError> {
        let metadata_json = serde_json::to_string(metadata)?;
        let env = shell_environment(
            &self.config.database_env,
            data_file,
            &metadata_json,
            tracker.pipe_path(),
        );

        // Child stderr merges into stdout; both land in the log file
        // only when the config asked for it.
        let (stdout, stderr): (Stdio, Stdio) = if save_log {
            let log = std::fs::File::create(log_path)?;
            let log_for_stderr = log.try_clone()?;
            (log.into(), log_for_stderr.into())
        } else {
            (Stdio::null(), Stdio::null())
        };

        let mut child = Command::new("/bin/bash")
            .args(["-l", "-c", command])
            .env_clear()
            .envs(env)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .spawn()?;

        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
            self.relay_tracker(tracker, job_id).await;
        };
        // One last drain so nothing written just before exit is lost
        self.relay_tracker(tracker, job_id).await;

        Ok(status.success())
    }

    /// Invoke a registered in-process handler.
    async fn run_handler(
        &self,
        py: &InProcessConfig,
        data_file: &Path,
        metadata: &HashMap<String, String>,
        log_path: &Path,
        tracker: &mut PizzaTracker,
        job_id: &JobId,
    ) -> Result<bool, EngineError> {
        let Some(handler) = self.handlers.get(&py.module) else {
            // Registration validates handler names; a miss means the
            // registry changed out from under this config.
            tracing::error!(module = %py.module, "in-process handler is not registered");
            return Ok(false);
        };

        let ctx = HandlerContext {
            pizza_tracker: py
                .supports_pizza_tracker
                .then(|| tracker.pipe_path().to_path_buf()),
            file_metadata: py.supports_metadata.then(|| metadata.clone()),
        };

        let success = match handler.run(data_file, ctx) {
            Ok(()) => true,
            Err(err) => {
                let mut log = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(log_path)?;
                writeln!(log, "in-process handler {} failed: {err}", py.module)?;
                false
            }
        };
        self.relay_tracker(tracker, job_id).await;
        Ok(success)
    }

    /// Forward everything currently in the progress pipe.
    async fn relay_tracker(&self, tracker: &mut PizzaTracker, job_id: &JobId) {
        for event in tracker.poll() {
            let sent = match event {
                TrackerEvent::Task(task) => self.producer.job_evt_task(job_id, &task).await,
                TrackerEvent::Progress(p) => self.producer.job_evt_progress(job_id, p).await,
                TrackerEvent::Committed(n) => self.producer.job_evt_committed(job_id, n).await,
            };
            if let Err(err) = sent {
                tracing::warn!(job_id = %job_id, error = %err, "dropping progress update");
            }
        }
    }
}

#[cfg(test)]
#[path = "processor_tests.rs"]
mod tests;
