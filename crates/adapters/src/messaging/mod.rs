// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job lifecycle message adapters

mod kafka;

pub use kafka::KafkaMessageProducer;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeMessageProducer, ProducedMessage};

use async_trait::async_trait;
use castiron_core::JobId;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Errors from message emission. Callers treat these as best-effort:
/// a failed send is logged and never retried.
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),
}

/// Terminal outcome of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Success,
    Failure,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Success => write!(f, "success"),
            JobStatus::Failure => write!(f, "failure"),
        }
    }
}

/// Adapter emitting job lifecycle and progress events.
///
/// Per job the emission order is `job_created`, any number of
/// task/progress/committed updates, then exactly one status. Delivery
/// is asynchronous; callers never wait for acknowledgement.
#[async_trait]
pub trait MessageProducer: Send + Sync {
    async fn job_created(
        &self,
        job_id: &JobId,
        filename: &str,
        handler: &str,
        uploader: &str,
    ) -> Result<(), MessageError>;

    async fn job_evt_task(&self, job_id: &JobId, task: &str) -> Result<(), MessageError>;

    async fn job_evt_progress(&self, job_id: &JobId, progress: f64) -> Result<(), MessageError>;

    async fn job_evt_committed(&self, job_id: &JobId, committed: i64) -> Result<(), MessageError>;

    async fn job_evt_status(&self, job_id: &JobId, status: JobStatus) -> Result<(), MessageError>;
}
