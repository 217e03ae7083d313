// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification delivery adapters
//!
//! A task sink hands raw notification payloads to the worker one at a
//! time. The worker loop pulls the next payload only after fully
//! processing the previous one, so delivery is single-flight and the
//! sink's transport absorbs any back-pressure.

mod kafka;

pub use kafka::KafkaTaskSink;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeTaskSink;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors from the notification stream.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),
}

/// Source of raw notification payloads.
#[async_trait]
pub trait TaskSink: Send {
    /// Wait for and return the next payload.
    ///
    /// Returns `Ok(None)` when the stream is closed and no further
    /// payloads will arrive.
    async fn recv(&mut self) -> Result<Option<Value>, TaskError>;
}
