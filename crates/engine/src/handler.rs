// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process file handlers
//!
//! A processor config may name an in-process handler instead of a shell
//! command. Handlers are registered once at program start under
//! dotted-path names; configs naming an unknown handler are rejected at
//! registration time.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by a handler. The diagnostic ends up in the job's
/// output log.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl From<&str> for HandlerError {
    fn from(msg: &str) -> Self {
        Self(msg.to_string())
    }
}

/// Optional context passed to a handler, populated according to the
/// config's capability flags.
#[derive(Debug, Clone, Default)]
pub struct HandlerContext {
    /// Path to the job's progress FIFO, if the handler declared
    /// `supports_pizza_tracker`.
    pub pizza_tracker: Option<PathBuf>,
    /// Object metadata of the file being processed, if the handler
    /// declared `supports_metadata`.
    pub file_metadata: Option<HashMap<String, String>>,
}

/// A handler invoked directly in the worker process.
pub trait FileHandler: Send + Sync {
    fn run(&self, data_file: &Path, ctx: HandlerContext) -> Result<(), HandlerError>;
}

/// Named handlers available to processor configs.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn FileHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, module: impl Into<String>, handler: impl FileHandler + 'static) {
        self.handlers.insert(module.into(), Arc::new(handler));
    }

    pub fn get(&self, module: &str) -> Option<Arc<dyn FileHandler>> {
        self.handlers.get(module).cloned()
    }

    pub fn contains(&self, module: &str) -> bool {
        self.handlers.contains_key(module)
    }
}

/// A do-nothing handler, useful as a config smoke test.
pub struct StubHandler;

impl FileHandler for StubHandler {
    fn run(&self, data_file: &Path, ctx: HandlerContext) -> Result<(), HandlerError> {
        tracing::info!(
            data_file = %data_file.display(),
            has_tracker = ctx.pizza_tracker.is_some(),
            has_metadata = ctx.file_metadata.is_some(),
            "stub handler invoked, doing nothing"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
