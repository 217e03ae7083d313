// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Path helpers for the convention-driven bucket layout
//!
//! A processor config at `cfg/a.toml` with the default directory names
//! owns `cfg/inbox`, `cfg/processing`, `cfg/archive`, and `cfg/error`.
//! Everything here derives those locations from the config's own id.

use crate::config::ProcessorConfig;
use crate::object::ObjectId;

/// Longest prefix of the key before the final `/`.
///
/// A top-level key has the empty path as its parent.
pub fn parent(obj: &ObjectId) -> ObjectId {
    let path = match obj.path.rsplit_once('/') {
        Some((dir, _)) => dir.to_string(),
        None => String::new(),
    };
    ObjectId::new(&obj.namespace, path)
}

/// Trailing segment of the key.
pub fn filename(obj: &ObjectId) -> &str {
    match obj.path.rsplit_once('/') {
        Some((_, name)) => name,
        None => &obj.path,
    }
}

/// Replace the trailing segment of the key.
pub fn rename(obj: &ObjectId, new_basename: &str) -> ObjectId {
    let parent = parent(obj);
    ObjectId::new(&obj.namespace, join(&parent.path, new_basename))
}

/// True iff the data file's basename matches the config's glob and the
/// file sits in the config's inbox directory.
pub fn glob_matches(data: &ObjectId, config: &ObjectId, cfg: &ProcessorConfig) -> bool {
    let pattern = match glob::Pattern::new(&cfg.glob) {
        Ok(p) => p,
        // Unreachable for configs that went through parse validation.
        Err(_) => return false,
    };
    pattern.matches(filename(data)) && parent(data) == inbox_path(config, cfg, None)
}

/// The config's inbox directory, or the data file's location within it.
pub fn inbox_path(config: &ObjectId, cfg: &ProcessorConfig, data: Option<&ObjectId>) -> ObjectId {
    staging_path(config, &cfg.inbox_directory, data)
}

pub fn processing_path(
    config: &ObjectId,
    cfg: &ProcessorConfig,
    data: Option<&ObjectId>,
) -> ObjectId {
    staging_path(config, &cfg.processing_directory, data)
}

pub fn archive_path(config: &ObjectId, cfg: &ProcessorConfig, data: Option<&ObjectId>) -> ObjectId {
    staging_path(config, &cfg.archive_directory, data)
}

pub fn error_path(config: &ObjectId, cfg: &ProcessorConfig, data: Option<&ObjectId>) -> ObjectId {
    staging_path(config, &cfg.error_directory, data)
}

fn staging_path(config: &ObjectId, directory: &str, data: Option<&ObjectId>) -> ObjectId {
    let base = parent(config);
    let mut path = join(&base.path, directory);
    if let Some(data) = data {
        path = join(&path, filename(data));
    }
    ObjectId::new(&config.namespace, path)
}

fn join(base: &str, segment: &str) -> String {
    if base.is_empty() {
        segment.to_string()
    } else {
        format!("{base}/{segment}")
    }
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
