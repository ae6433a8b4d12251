// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for stream lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Base graph loading before the stream starts
//! * Pool startup and shutdown
//! * Input and output failures, dropped units
//! * The per-update statistics summary

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A base graph file was parsed and registered.
///
/// # Log Level
/// `info!` - Important operational event
pub struct BaseGraphLoaded<'a> {
    pub locator: &'a str,
    pub graph: &'a str,
    pub triple_count: usize,
}

impl Display for BaseGraphLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Loaded base graph <{}> from '{}': {} triples",
            self.graph, self.locator, self.triple_count
        )
    }
}

impl StructuredLog for BaseGraphLoaded<'_> {
    fn log(&self) {
        tracing::info!(
            locator = self.locator,
            graph = self.graph,
            triple_count = self.triple_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "base_graph",
            span_name = name,
            locator = self.locator,
            graph = self.graph,
        )
    }
}

/// The updater started consuming its source.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use rdf_stream_updater::observability::messages::engine::RunStarted;
///
/// let msg = RunStarted {
///     pool_size: 4,
///     update_count: 3,
///     lookahead: 2,
///     lookback: 1,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct RunStarted {
    pub pool_size: usize,
    pub update_count: usize,
    pub lookahead: usize,
    pub lookback: usize,
}

impl Display for RunStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting stream update: {} updates, pool_size={}, lookahead={}, lookback={}",
            self.update_count, self.pool_size, self.lookahead, self.lookback
        )
    }
}

impl StructuredLog for RunStarted {
    fn log(&self) {
        tracing::info!(
            pool_size = self.pool_size,
            update_count = self.update_count,
            lookahead = self.lookahead,
            lookback = self.lookback,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "stream_update",
            span_name = name,
            pool_size = self.pool_size,
            update_count = self.update_count,
        )
    }
}

/// The stream finished and every worker has been joined.
///
/// # Log Level
/// `info!` - Important operational event
pub struct RunCompleted {
    pub units_read: u64,
    pub units_written: u64,
    pub units_dropped: u64,
    pub duration: Duration,
}

impl Display for RunCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stream update completed in {:?}: read={}, written={}, dropped={}",
            self.duration, self.units_read, self.units_written, self.units_dropped
        )
    }
}

impl StructuredLog for RunCompleted {
    fn log(&self) {
        tracing::info!(
            units_read = self.units_read,
            units_written = self.units_written,
            units_dropped = self.units_dropped,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "stream_update_completed",
            span_name = name,
            units_read = self.units_read,
            units_written = self.units_written,
        )
    }
}

/// A worker thread was started on demand.
///
/// # Log Level
/// `debug!` - Pool growth detail
pub struct WorkerSpawned {
    pub worker_id: usize,
    pub pool_size: usize,
}

impl Display for WorkerSpawned {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Spawned worker {} of at most {}",
            self.worker_id, self.pool_size
        )
    }
}

impl StructuredLog for WorkerSpawned {
    fn log(&self) {
        tracing::debug!(worker_id = self.worker_id, pool_size = self.pool_size, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("worker", span_name = name, worker_id = self.worker_id)
    }
}

/// The source failed and the run is being aborted.
///
/// # Log Level
/// `error!` - The stream ends without terminating the sink
pub struct InputReadFailed<'a> {
    pub units_read: u64,
    pub error: &'a dyn std::error::Error,
}

impl Display for InputReadFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Aborting stream after {} units: reading input failed: {}",
            self.units_read, self.error
        )
    }
}

impl StructuredLog for InputReadFailed<'_> {
    fn log(&self) {
        tracing::error!(units_read = self.units_read, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("input_read_failed", span_name = name, units_read = self.units_read)
    }
}

/// A processed unit could not be written to the sink.
///
/// # Log Level
/// `error!` - The unit is missing from the output stream
pub struct OutputWriteFailed<'a> {
    pub slot: u64,
    pub error: &'a dyn std::error::Error,
}

impl Display for OutputWriteFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Writing output unit (slot {}) failed: {}", self.slot, self.error)
    }
}

impl StructuredLog for OutputWriteFailed<'_> {
    fn log(&self) {
        tracing::error!(slot = self.slot, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("output_write_failed", span_name = name, slot = self.slot)
    }
}

/// A slot completed without a result and was removed from the output.
///
/// # Log Level
/// `error!` - The unit is missing from the output stream
pub struct UnitDropped<'a> {
    pub slot: u64,
    pub unit_id: &'a str,
}

impl Display for UnitDropped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Dropping unit '{}' (slot {}): processing produced no result",
            self.unit_id, self.slot
        )
    }
}

impl StructuredLog for UnitDropped<'_> {
    fn log(&self) {
        tracing::error!(slot = self.slot, unit_id = self.unit_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("unit_dropped", span_name = name, slot = self.slot)
    }
}

/// Accumulated cost of one update across the whole stream.
///
/// # Log Level
/// `info!` - Emitted once per update at the end of a run
pub struct UpdateSummary<'a> {
    pub update: &'a str,
    pub iterations: u64,
    pub elapsed: Duration,
}

impl Display for UpdateSummary<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Update '{}': {} iterations, {} ms",
            self.update,
            self.iterations,
            self.elapsed.as_millis()
        )
    }
}

impl StructuredLog for UpdateSummary<'_> {
    fn log(&self) {
        tracing::info!(
            update = self.update,
            iterations = self.iterations,
            elapsed_ms = self.elapsed.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("update_summary", span_name = name, update = self.update)
    }
}
