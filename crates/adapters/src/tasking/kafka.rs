// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kafka-backed task sink
//!
//! Consumes the bucket-notification topic. Payloads that are not valid
//! JSON are logged and skipped; the stream itself never ends, so
//! `recv` only returns `None` if the consumer is torn down.

use super::{TaskError, TaskSink};
use async_trait::async_trait;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::ClientConfig;
use rdkafka::Message;
use serde_json::Value;

pub struct KafkaTaskSink {
    consumer: StreamConsumer,
}

impl KafkaTaskSink {
    pub fn connect(broker: &str, group: &str, topic: &str) -> Result<Self, TaskError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("group.id", group)
            .set("bootstrap.servers", broker)
            .set("enable.partition.eof", "false")
            .set("session.timeout.ms", "6000")
            .set("auto.offset.reset", "latest")
            .create()?;
        consumer.subscribe(&[topic])?;
        Ok(Self { consumer })
    }
}

#[async_trait]
impl TaskSink for KafkaTaskSink {
    async fn recv(&mut self) -> Result<Option<Value>, TaskError> {
        loop {
            let message = self.consumer.recv().await?;
            let Some(payload) = message.payload() else {
                continue;
            };
            match serde_json::from_slice(payload) {
                Ok(value) => return Ok(Some(value)),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping non-JSON notification payload");
                }
            }
        }
    }
}
