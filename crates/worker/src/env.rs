// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker settings from environment variables
//!
//! Every variable has a default suitable for a local docker-compose
//! stack (MinIO and Kafka on localhost, throwaway credentials).

use castiron_adapters::S3Config;
use castiron_engine::{DatabaseEnv, EngineConfig};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Everything the worker reads from its environment, resolved once at
/// startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub worker_name: String,

    pub database_host: String,
    pub database_password: String,
    pub database_port: u16,
    pub database_user: String,
    pub database_table: String,

    pub kafka_broker: String,
    pub kafka_minio_topic: String,
    pub kafka_pizza_tracker_topic: String,

    pub minio_etl_bucket: String,
    pub minio_host: String,
    pub minio_access_key: String,
    pub minio_secret_key: String,
    pub minio_secure: bool,
    pub minio_notification_arn: String,
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Resolve settings through an arbitrary lookup, falling back to
    /// the local-development defaults.
    pub fn from_vars<F>(get: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let string = |name: &str, default: &str| get(name).unwrap_or_else(|| default.to_string());

        let raw_port = string("DATABASE_PORT", "5432");
        let database_port = raw_port
            .parse::<u16>()
            .map_err(|_| SettingsError::Invalid {
                name: "DATABASE_PORT",
                value: raw_port.clone(),
            })?;

        let raw_secure = string("MINIO_SECURE", "false");
        let minio_secure = parse_bool(&raw_secure).ok_or(SettingsError::Invalid {
            name: "MINIO_SECURE",
            value: raw_secure,
        })?;

        Ok(Self {
            worker_name: string("WORKER_NAME", "castiron-worker"),
            database_host: string("DATABASE_HOST", "localhost"),
            database_password: string("DATABASE_PASSWORD", "12345678"),
            database_port,
            database_user: string("DATABASE_USER", "castiron"),
            database_table: string("DATABASE_TABLE", "castiron"),
            kafka_broker: string("KAFKA_BROKER", "localhost:9092"),
            kafka_minio_topic: string("KAFKA_MINIO_TOPIC", "minio"),
            kafka_pizza_tracker_topic: string("KAFKA_PIZZA_TRACKER_TOPIC", "pizza-tracker"),
            minio_etl_bucket: string("MINIO_ETL_BUCKET", "etl"),
            minio_host: string("MINIO_HOST", "localhost:9000"),
            minio_access_key: string("MINIO_ACCESS_KEY", "castiron"),
            minio_secret_key: string("MINIO_SECRET_KEY", "castiron"),
            minio_secure,
            minio_notification_arn: string(
                "MINIO_NOTIFICATION_ARN",
                "arn:minio:sqs::docker:kafka",
            ),
        })
    }

    pub fn s3_config(&self) -> S3Config {
        S3Config {
            host: self.minio_host.clone(),
            bucket: self.minio_etl_bucket.clone(),
            access_key: self.minio_access_key.clone(),
            secret_key: self.minio_secret_key.clone(),
            secure: self.minio_secure,
            notification_arn: self.minio_notification_arn.clone(),
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            bucket: self.minio_etl_bucket.clone(),
            database_env: DatabaseEnv {
                host: self.database_host.clone(),
                password: self.database_password.clone(),
                port: self.database_port,
                table: self.database_table.clone(),
                user: self.database_user.clone(),
            },
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
