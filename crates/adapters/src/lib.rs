// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for external I/O: the object store, the message bus, and
//! the notification stream the worker consumes.

pub mod messaging;
pub mod store;
pub mod tasking;

pub use messaging::{JobStatus, KafkaMessageProducer, MessageError, MessageProducer};
pub use store::{ObjectStore, S3Config, S3ObjectStore, StoreError, KEEP_FILENAME};
pub use tasking::{KafkaTaskSink, TaskError, TaskSink};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use messaging::{FakeMessageProducer, ProducedMessage};
#[cfg(any(test, feature = "test-support"))]
pub use store::FakeObjectStore;
#[cfg(any(test, feature = "test-support"))]
pub use tasking::FakeTaskSink;
