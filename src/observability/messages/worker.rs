// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for events inside the worker threads.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// An update hit its iteration limit while still changing the graph.
///
/// # Log Level
/// `warn!` - The result may not be a fixpoint
pub struct IterationCapReached<'a> {
    pub update: &'a str,
    pub unit_id: &'a str,
    pub limit: u32,
}

impl Display for IterationCapReached<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Update '{}' on unit '{}' reached its limit of {} iterations without stabilizing",
            self.update, self.unit_id, self.limit
        )
    }
}

impl StructuredLog for IterationCapReached<'_> {
    fn log(&self) {
        tracing::warn!(
            update = self.update,
            unit_id = self.unit_id,
            limit = self.limit,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "iteration_cap",
            span_name = name,
            update = self.update,
            unit_id = self.unit_id,
        )
    }
}

/// One execution of an update failed; the loop carries on.
///
/// # Log Level
/// `error!` - Operation failure
pub struct UpdateExecutionFailed<'a> {
    pub update: &'a str,
    pub unit_id: &'a str,
    pub iteration: u32,
    pub error: &'a dyn std::error::Error,
}

impl Display for UpdateExecutionFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Update '{}' failed on unit '{}' at iteration {}: {}",
            self.update, self.unit_id, self.iteration, self.error
        )
    }
}

impl StructuredLog for UpdateExecutionFailed<'_> {
    fn log(&self) {
        tracing::error!(
            update = self.update,
            unit_id = self.unit_id,
            iteration = self.iteration,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "update_failed",
            span_name = name,
            update = self.update,
            unit_id = self.unit_id,
        )
    }
}

/// A worker caught a panic while processing a unit.
///
/// # Log Level
/// `error!` - The unit will be dropped
pub struct UnitProcessingPanicked<'a> {
    pub worker_id: usize,
    pub unit_id: &'a str,
    pub message: &'a str,
}

impl Display for UnitProcessingPanicked<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Worker {} panicked while processing unit '{}': {}",
            self.worker_id, self.unit_id, self.message
        )
    }
}

impl StructuredLog for UnitProcessingPanicked<'_> {
    fn log(&self) {
        tracing::error!(
            worker_id = self.worker_id,
            unit_id = self.unit_id,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("worker_panic", span_name = name, worker_id = self.worker_id)
    }
}

/// A unit could not be processed and is dropped from the output.
///
/// # Log Level
/// `error!` - The unit will be dropped
pub struct UnitProcessingFailed<'a> {
    pub worker_id: usize,
    pub slot: u64,
    pub unit_id: &'a str,
    pub triple_count: usize,
    pub error: &'a dyn std::error::Error,
}

impl Display for UnitProcessingFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Worker {} failed on unit '{}' (slot {}, {} triples): {}",
            self.worker_id, self.unit_id, self.slot, self.triple_count, self.error
        )
    }
}

impl StructuredLog for UnitProcessingFailed<'_> {
    fn log(&self) {
        tracing::error!(
            worker_id = self.worker_id,
            slot = self.slot,
            unit_id = self.unit_id,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "unit_failed",
            span_name = name,
            worker_id = self.worker_id,
            slot = self.slot,
        )
    }
}

/// A worker thread ended in a panic outside of unit processing.
///
/// # Log Level
/// `error!` - Detected while joining at shutdown
pub struct WorkerJoinFailed {
    pub worker_id: usize,
}

impl Display for WorkerJoinFailed {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Worker {} thread panicked and could not be joined cleanly", self.worker_id)
    }
}

impl StructuredLog for WorkerJoinFailed {
    fn log(&self) {
        tracing::error!(worker_id = self.worker_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("worker_join", span_name = name, worker_id = self.worker_id)
    }
}

/// A unit finished all updates.
///
/// # Log Level
/// `debug!` - Per-unit detail
pub struct UnitProcessed<'a> {
    pub worker_id: usize,
    pub slot: u64,
    pub unit_id: &'a str,
    pub triple_count: usize,
    pub duration: Duration,
}

impl Display for UnitProcessed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Worker {} processed unit '{}' (slot {}) in {:?}: {} triples",
            self.worker_id, self.unit_id, self.slot, self.duration, self.triple_count
        )
    }
}

impl StructuredLog for UnitProcessed<'_> {
    fn log(&self) {
        tracing::debug!(
            worker_id = self.worker_id,
            slot = self.slot,
            unit_id = self.unit_id,
            triple_count = self.triple_count,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "unit",
            span_name = name,
            worker_id = self.worker_id,
            slot = self.slot,
            unit_id = self.unit_id,
        )
    }
}

/// A debug snapshot could not be written.
///
/// # Log Level
/// `warn!` - Debug output only; processing continues
pub struct DebugSnapshotFailed<'a> {
    pub path: &'a str,
    pub error: &'a std::io::Error,
}

impl Display for DebugSnapshotFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Could not write debug snapshot '{}': {}", self.path, self.error)
    }
}

impl StructuredLog for DebugSnapshotFailed<'_> {
    fn log(&self) {
        tracing::warn!(path = self.path, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("debug_snapshot", span_name = name, path = self.path)
    }
}
