// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kafka message producer
//!
//! Emits every job event as JSON on a single topic, keyed by job id so
//! one job's updates stay in partition order. Sends are fire-and-forget:
//! the delivery future is dropped and enqueue failures surface to the
//! caller, which logs and moves on.

use super::{JobStatus, MessageError, MessageProducer};
use async_trait::async_trait;
use castiron_core::JobId;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::ClientConfig;
use serde_json::json;

pub struct KafkaMessageProducer {
    producer: FutureProducer,
    topic: String,
}

impl KafkaMessageProducer {
    pub fn connect(broker: &str, topic: &str) -> Result<Self, MessageError> {
        let producer = ClientConfig::new()
            .set("bootstrap.servers", broker)
            .set("message.timeout.ms", "5000")
            .create()?;
        Ok(Self {
            producer,
            topic: topic.to_string(),
        })
    }

    fn enqueue(&self, job_id: &JobId, payload: String) -> Result<(), MessageError> {
        let record = FutureRecord::to(&self.topic)
            .key(job_id.as_str())
            .payload(&payload);
        if let Err((err, _)) = self.producer.send_result(record) {
            tracing::warn!(job_id = %job_id, error = %err, "failed to enqueue job message");
            return Err(err.into());
        }
        Ok(())
    }
}

#[async_trait]
impl MessageProducer for KafkaMessageProducer {
    async fn job_created(
        &self,
        job_id: &JobId,
        filename: &str,
        handler: &str,
        uploader: &str,
    ) -> Result<(), MessageError> {
        self.enqueue(
            job_id,
            json!({
                "type": "job_created",
                "job_id": job_id,
                "filename": filename,
                "handler": handler,
                "uploader": uploader,
            })
            .to_string(),
        )
    }

    async fn job_evt_task(&self, job_id: &JobId, task: &str) -> Result<(), MessageError> {
        self.enqueue(
            job_id,
            json!({
                "type": "job_update",
                "job_id": job_id,
                "task": task,
            })
            .to_string(),
        )
    }

    async fn job_evt_progress(&self, job_id: &JobId, progress: f64) -> Result<(), MessageError> {
        self.enqueue(
            job_id,
            json!({
                "type": "job_update",
                "job_id": job_id,
                "progress": progress,
            })
            .to_string(),
        )
    }

    async fn job_evt_committed(&self, job_id: &JobId, committed: i64) -> Result<(), MessageError> {
        self.enqueue(
            job_id,
            json!({
                "type": "job_update",
                "job_id": job_id,
                "committed": committed,
            })
            .to_string(),
        )
    }

    async fn job_evt_status(&self, job_id: &JobId, status: JobStatus) -> Result<(), MessageError> {
        self.enqueue(
            job_id,
            json!({
                "type": "job_update",
                "job_id": job_id,
                "status": status,
            })
            .to_string(),
        )
    }
}
