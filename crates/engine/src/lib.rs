// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! castiron execution engine
//!
//! Routes object-store notifications to processor configs and drives
//! matched files through the staged pipeline: inbox → processing →
//! archive or error.

pub mod env;
mod error;
pub mod handler;
mod processor;
mod tracker;

pub use env::DatabaseEnv;
pub use error::EngineError;
pub use handler::{FileHandler, HandlerContext, HandlerError, HandlerRegistry, StubHandler};
pub use processor::{EngineConfig, EventProcessor, UPLOADER};
pub use tracker::{PizzaTracker, TrackerEvent};
