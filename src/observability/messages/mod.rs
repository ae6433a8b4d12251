// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Every message is a small struct implementing `Display` for the human
//! readable line and [`StructuredLog`] for emitting it with its fields
//! attached at the right level.
//!
//! # Organization
//!
//! * `engine` - stream lifecycle, pool and reorder events
//! * `worker` - per-unit execution events inside the worker threads
//! * `config` - catalog and debug settings resolved at startup
//!
//! # Usage Pattern
//!
//! ```rust
//! use rdf_stream_updater::observability::messages::engine::RunStarted;
//! use rdf_stream_updater::observability::messages::StructuredLog;
//!
//! RunStarted {
//!     pool_size: 4,
//!     update_count: 2,
//!     lookahead: 1,
//!     lookback: 1,
//! }
//! .log();
//! ```

pub mod config;
pub mod engine;
pub mod worker;

use tracing::Span;

/// A message that knows its own level and structured fields.
pub trait StructuredLog {
    /// Emit the message as a tracing event.
    fn log(&self);

    /// A span carrying the same fields, for scoping follow-up events.
    fn span(&self, name: &str) -> Span;
}
