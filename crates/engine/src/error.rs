// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine

use castiron_adapters::StoreError;
use thiserror::Error;

/// Errors that abort one file pipeline or one config registration.
///
/// None of these are fatal to the worker: the dispatch loop logs them
/// and keeps consuming notifications.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
