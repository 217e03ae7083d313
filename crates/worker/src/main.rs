// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! castiron worker daemon (castirond)
//!
//! Watches the ETL bucket for uploads, matches them against processor
//! configs stored in the same bucket, and runs the configured handler
//! while relaying progress to Kafka.

use castiron_adapters::{KafkaMessageProducer, KafkaTaskSink, S3ObjectStore};
use castiron_engine::{EventProcessor, HandlerRegistry, StubHandler};
use castiron_worker::env::Settings;
use castiron_worker::run;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("castirond {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("castirond {}", env!("CARGO_PKG_VERSION"));
                println!("castiron ETL worker - watches a bucket and runs processor configs");
                println!();
                println!("USAGE:");
                println!("    castirond");
                println!();
                println!("All configuration is read from the environment. Defaults");
                println!("target a local MinIO + Kafka + Postgres stack.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: castirond [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::from_env()?;
    info!(worker = %settings.worker_name, "starting castiron worker");

    let store = S3ObjectStore::connect(&settings.s3_config())?;
    let producer = KafkaMessageProducer::connect(
        &settings.kafka_broker,
        &settings.kafka_pizza_tracker_topic,
    )?;
    let mut sink = KafkaTaskSink::connect(
        &settings.kafka_broker,
        &settings.worker_name,
        &settings.kafka_minio_topic,
    )?;

    let mut handlers = HandlerRegistry::new();
    handlers.register("castiron.stub", StubHandler);

    let processor = EventProcessor::start(
        store,
        producer,
        handlers,
        settings.engine_config(),
    )
    .await?;
    info!(configs = processor.config_count(), "watching for uploads");

    run::run(processor, &mut sink).await?;
    Ok(())
}
