// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake task sink for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{TaskError, TaskSink};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

/// Channel-fed task sink. Dropping the sender ends the stream.
pub struct FakeTaskSink {
    rx: mpsc::UnboundedReceiver<Value>,
}

impl FakeTaskSink {
    pub fn new() -> (Self, mpsc::UnboundedSender<Value>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { rx }, tx)
    }
}

#[async_trait]
impl TaskSink for FakeTaskSink {
    async fn recv(&mut self) -> Result<Option<Value>, TaskError> {
        Ok(self.rx.recv().await)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
