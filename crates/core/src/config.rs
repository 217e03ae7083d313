// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Processor config documents
//!
//! A processor config is a small TOML document stored in the ETL bucket
//! next to the directories it manages. It declares which files a
//! processor claims (a shell glob matched against the basename), where
//! the staging directories live, and what to run: a shell command or a
//! named in-process handler.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Key suffix that marks an object as a processor config.
pub const CONFIG_SUFFIX: &str = ".toml";

/// Errors raised while parsing or validating a processor config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("exactly one of `shell` or `python` must be set")]
    HandlerCount,

    #[error("invalid glob pattern {pattern:?}: {source}")]
    Glob {
        pattern: String,
        source: glob::PatternError,
    },
}

/// Descriptor for an in-process handler.
///
/// `module` names an entry in the worker's handler registry. The two
/// capability flags control which context the handler receives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InProcessConfig {
    pub module: String,
    #[serde(default = "default_callable")]
    pub callable: String,
    #[serde(default)]
    pub supports_pizza_tracker: bool,
    #[serde(default)]
    pub supports_metadata: bool,
}

/// A validated processor config.
///
/// Directory fields are relative names resolved under the config
/// object's parent directory. Exactly one of `shell` or `python` is set;
/// [`ProcessorConfig::parse`] enforces this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProcessorConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_inbox")]
    pub inbox_directory: String,
    #[serde(default = "default_processing")]
    pub processing_directory: String,
    #[serde(default = "default_archive")]
    pub archive_directory: String,
    #[serde(default = "default_error")]
    pub error_directory: String,
    pub glob: String,
    #[serde(default)]
    pub save_error_log: bool,
    #[serde(default)]
    pub shell: Option<String>,
    #[serde(default)]
    pub python: Option<InProcessConfig>,
}

impl ProcessorConfig {
    /// Parse and validate a config document.
    ///
    /// Schema violations, an invalid glob, and a handler count other
    /// than one are all reported as [`ConfigError`].
    pub fn parse(doc: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(doc)?;
        if cfg.shell.is_some() == cfg.python.is_some() {
            return Err(ConfigError::HandlerCount);
        }
        if let Err(source) = glob::Pattern::new(&cfg.glob) {
            return Err(ConfigError::Glob {
                pattern: cfg.glob,
                source,
            });
        }
        Ok(cfg)
    }
}

fn default_enabled() -> bool {
    true
}

fn default_callable() -> String {
    "run".to_string()
}

fn default_inbox() -> String {
    "inbox".to_string()
}

fn default_processing() -> String {
    "processing".to_string()
}

fn default_archive() -> String {
    "archive".to_string()
}

fn default_error() -> String {
    "error".to_string()
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
