// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Diagnostic output goes through message structs rather than ad hoc format
//! strings, so each event has one place that decides its wording, its level
//! and its structured fields.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::engine` - stream lifecycle and pool events
//! * `messages::worker` - fixpoint execution inside worker threads
//! * `messages::config` - startup configuration events
//!
//! # Usage
//!
//! ```rust
//! use rdf_stream_updater::observability::messages::engine::UnitDropped;
//! use rdf_stream_updater::observability::messages::StructuredLog;
//!
//! UnitDropped { slot: 7, unit_id: "s7_0" }.log();
//! ```

pub mod messages;

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber writing to stderr.
///
/// `RUST_LOG` overrides `default_directive`. Calling this twice is harmless;
/// the second installation is ignored.
pub fn init_logging(default_directive: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
