// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Progress pipe reader ("pizza tracker")
//!
//! A job's child process reports progress by writing newline-terminated
//! ASCII commands to a named FIFO whose path it receives via the
//! `PIZZA_TRACKER` environment variable:
//!
//! ```text
//! task load
//! progress 1/4
//! progress 0.5
//! committed 42
//! ```
//!
//! The read end is opened non-blocking and polled while the child runs.
//! Unknown commands and malformed lines are dropped without comment;
//! partial lines are buffered until their newline arrives.

use nix::sys::stat::Mode;
use nix::unistd::mkfifo;
use std::fs::{File, OpenOptions};
use std::io::Read;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

const PIPE_FILENAME: &str = "pizza_tracker";

/// A progress command read off the pipe.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    Task(String),
    Progress(f64),
    Committed(i64),
}

/// Non-blocking reader for one job's progress FIFO.
///
/// The FIFO lives inside the job's private working directory and is
/// unlinked when the reader is dropped, so it never outlives the
/// execute phase it was created for.
pub struct PizzaTracker {
    pipe_path: PathBuf,
    pipe: File,
    pending: String,
}

impl PizzaTracker {
    /// Create the FIFO inside `work_dir` and open its read end.
    pub fn create(work_dir: &Path) -> std::io::Result<Self> {
        let pipe_path = work_dir.join(PIPE_FILENAME);
        mkfifo(&pipe_path, Mode::S_IRUSR | Mode::S_IWUSR)?;
        let pipe = OpenOptions::new()
            .read(true)
            .custom_flags(nix::libc::O_NONBLOCK)
            .open(&pipe_path)?;
        Ok(Self {
            pipe_path,
            pipe,
            pending: String::new(),
        })
    }

    /// Path the child writes to.
    pub fn pipe_path(&self) -> &Path {
        &self.pipe_path
    }

    /// Read whatever is currently buffered in the pipe, without
    /// blocking, and return the commands completed by it.
    pub fn poll(&mut self) -> Vec<TrackerEvent> {
        let mut buf = [0u8; 4096];
        loop {
            match self.pipe.read(&mut buf) {
                // No writer connected right now
                Ok(0) => break,
                Ok(n) => self.pending.push_str(&String::from_utf8_lossy(&buf[..n])),
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(err) => {
                    tracing::debug!(error = %err, "progress pipe read failed");
                    break;
                }
            }
        }

        let mut events = Vec::new();
        while let Some(idx) = self.pending.find('\n') {
            let line: String = self.pending.drain(..=idx).collect();
            if let Some(event) = parse_line(line.trim()) {
                events.push(event);
            }
        }
        events
    }
}

impl Drop for PizzaTracker {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.pipe_path);
    }
}

fn parse_line(line: &str) -> Option<TrackerEvent> {
    let (cmd, args) = line.split_once(' ')?;
    match cmd.to_ascii_lowercase().as_str() {
        "task" => Some(TrackerEvent::Task(args.to_string())),
        "committed" => args.trim().parse().ok().map(TrackerEvent::Committed),
        "progress" => parse_progress(args).map(TrackerEvent::Progress),
        _ => None,
    }
}

/// Accepts a decimal or a `num/den` fraction; only values in [0, 1]
/// count as progress.
fn parse_progress(args: &str) -> Option<f64> {
    let value = match args.trim().parse::<f64>() {
        Ok(v) => v,
        Err(_) => {
            let (num, den) = args.split_once('/')?;
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            num / den
        }
    };
    (0.0..=1.0).contains(&value).then_some(value)
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;
