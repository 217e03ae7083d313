// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker dispatch loop
//!
//! One notification at a time: the next payload is pulled only after
//! the previous one has been fully processed, including any external
//! process it spawned. The sink's transport absorbs the back-pressure.

use castiron_adapters::{MessageProducer, ObjectStore, TaskError, TaskSink};
use castiron_engine::EventProcessor;

/// Pump notifications from the sink into the processor until the
/// stream ends.
pub async fn run<S, M, T>(
    mut processor: EventProcessor<S, M>,
    sink: &mut T,
) -> Result<(), TaskError>
where
    S: ObjectStore,
    M: MessageProducer,
    T: TaskSink,
{
    while let Some(payload) = sink.recv().await? {
        processor.process(&payload).await;
    }
    tracing::info!("notification stream ended, shutting down");
    Ok(())
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
