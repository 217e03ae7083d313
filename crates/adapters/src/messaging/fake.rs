// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake message producer for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{JobStatus, MessageError, MessageProducer};
use async_trait::async_trait;
use castiron_core::JobId;
use parking_lot::Mutex;
use std::sync::Arc;

/// Recorded message, one variant per producer operation.
#[derive(Debug, Clone, PartialEq)]
pub enum ProducedMessage {
    Created {
        job_id: JobId,
        filename: String,
        handler: String,
        uploader: String,
    },
    Task {
        job_id: JobId,
        task: String,
    },
    Progress {
        job_id: JobId,
        progress: f64,
    },
    Committed {
        job_id: JobId,
        committed: i64,
    },
    Status {
        job_id: JobId,
        status: JobStatus,
    },
}

impl ProducedMessage {
    pub fn job_id(&self) -> &JobId {
        match self {
            ProducedMessage::Created { job_id, .. }
            | ProducedMessage::Task { job_id, .. }
            | ProducedMessage::Progress { job_id, .. }
            | ProducedMessage::Committed { job_id, .. }
            | ProducedMessage::Status { job_id, .. } => job_id,
        }
    }
}

/// Fake producer that records every message in emission order.
#[derive(Clone, Default)]
pub struct FakeMessageProducer {
    inner: Arc<Mutex<Vec<ProducedMessage>>>,
}

impl FakeMessageProducer {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded messages in emission order.
    pub fn messages(&self) -> Vec<ProducedMessage> {
        self.inner.lock().clone()
    }

    fn record(&self, message: ProducedMessage) {
        self.inner.lock().push(message);
    }
}

#[async_trait]
impl MessageProducer for FakeMessageProducer {
    async fn job_created(
        &self,
        job_id: &JobId,
        filename: &str,
        handler: &str,
        uploader: &str,
    ) -> Result<(), MessageError> {
        self.record(ProducedMessage::Created {
            job_id: job_id.clone(),
            filename: filename.to_string(),
            handler: handler.to_string(),
            uploader: uploader.to_string(),
        });
        Ok(())
    }

    async fn job_evt_task(&self, job_id: &JobId, task: &str) -> Result<(), MessageError> {
        self.record(ProducedMessage::Task {
            job_id: job_id.clone(),
            task: task.to_string(),
        });
        Ok(())
    }

    async fn job_evt_progress(&self, job_id: &JobId, progress: f64) -> Result<(), MessageError> {
        self.record(ProducedMessage::Progress {
            job_id: job_id.clone(),
            progress,
        });
        Ok(())
    }

    async fn job_evt_committed(&self, job_id: &JobId, committed: i64) -> Result<(), MessageError> {
        self.record(ProducedMessage::Committed {
            job_id: job_id.clone(),
            committed,
        });
        Ok(())
    }

    async fn job_evt_status(&self, job_id: &JobId, status: JobStatus) -> Result<(), MessageError> {
        self.record(ProducedMessage::Status {
            job_id: job_id.clone(),
            status,
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
