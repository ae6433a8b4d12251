// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Streaming main loop.
//!
//! [`StreamUpdater::run`] pulls units from a [`UnitSource`], routes them
//! through the context window and the worker pool, and writes results to a
//! [`UnitSink`] in input order:
//!
//! 1. read a unit and admit it to the window, dispatching whatever the window
//!    releases
//! 2. flush the completed prefix of the reorder buffer
//! 3. at end of input, drain the window, shut the pool down, flush once more
//!    and terminate the sink

use std::sync::Arc;
use std::time::Instant;

use crate::config::UpdateCatalog;
use crate::engine::debug_export::DebugExporter;
use crate::engine::fixpoint::SharedContext;
use crate::engine::pool::WorkerPool;
use crate::engine::reorder::ReorderBuffer;
use crate::engine::stats::UpdateTotals;
use crate::engine::window::ContextWindow;
use crate::errors::StreamError;
use crate::graph::BaseGraphStore;
use crate::observability::messages::engine::{
    InputReadFailed, OutputWriteFailed, RunCompleted, RunStarted, UnitDropped, UpdateSummary,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{UnitSink, UnitSource};

/// Number of worker threads used when none is configured.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Counters for one finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub units_read: u64,
    pub units_written: u64,
    pub units_dropped: u64,
}

/// Applies an update catalog to a stream of units.
#[derive(Debug)]
pub struct StreamUpdater {
    context: SharedContext,
    pool_size: usize,
    lookahead: usize,
    lookback: usize,
}

impl StreamUpdater {
    pub fn new(catalog: UpdateCatalog) -> Self {
        Self {
            context: SharedContext::new(catalog, BaseGraphStore::new()),
            pool_size: default_concurrency(),
            lookahead: 0,
            lookback: 0,
        }
    }

    /// Worker thread count; 0 means available parallelism.
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = if pool_size == 0 {
            default_concurrency()
        } else {
            pool_size
        };
        self
    }

    pub fn with_lookahead(mut self, lookahead: usize) -> Self {
        self.lookahead = lookahead;
        self
    }

    pub fn with_lookback(mut self, lookback: usize) -> Self {
        self.lookback = lookback;
        self
    }

    pub fn with_base_graphs(mut self, base: BaseGraphStore) -> Self {
        self.context.base = Arc::new(base);
        self
    }

    pub fn with_debug_exporter(mut self, exporter: DebugExporter) -> Self {
        self.context.debug = exporter.is_enabled().then(|| Arc::new(exporter));
        self
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn lookahead(&self) -> usize {
        self.lookahead
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }

    /// The exporter in effect, `None` when no debug output is configured.
    pub fn debug_exporter(&self) -> Option<&DebugExporter> {
        self.context.debug.as_deref()
    }

    pub fn catalog(&self) -> &UpdateCatalog {
        &self.context.catalog
    }

    /// Per-update totals accumulated over every run of this updater.
    pub fn statistics(&self) -> Vec<UpdateTotals> {
        self.context.stats.snapshot()
    }

    /// Process the whole stream. The sink is terminated exactly once on success.
    ///
    /// Any source failure, an unparsable segment included, aborts the run:
    /// units already dispatched are finished and written, the sink is left
    /// unterminated and the error is returned.
    pub async fn run<S, K>(&self, source: &mut S, sink: &mut K) -> Result<RunReport, StreamError>
    where
        S: UnitSource + ?Sized,
        K: UnitSink + ?Sized,
    {
        let started = Instant::now();
        RunStarted {
            pool_size: self.pool_size,
            update_count: self.context.catalog.len(),
            lookahead: self.lookahead,
            lookback: self.lookback,
        }
        .log();

        let reorder = Arc::new(ReorderBuffer::new());
        let mut pool = WorkerPool::new(self.context.clone(), Arc::clone(&reorder), self.pool_size);
        let mut window = ContextWindow::new(self.lookahead, self.lookback);
        let mut report = RunReport::default();

        while source.can_read() {
            match source.read().await {
                Ok(Some(unit)) => {
                    report.units_read += 1;
                    if let Some(debug) = &self.context.debug {
                        debug.observe(&unit.id());
                    }
                    if let Some(assignment) = window.admit(unit) {
                        pool.dispatch(assignment).await?;
                    }
                }
                Ok(None) => {}
                Err(error) => {
                    InputReadFailed {
                        units_read: report.units_read,
                        error: &error,
                    }
                    .log();
                    pool.shutdown().await?;
                    flush(&reorder, sink, &mut report).await;
                    return Err(error.into());
                }
            }
            flush(&reorder, sink, &mut report).await;
        }

        while let Some(assignment) = window.drain() {
            pool.dispatch(assignment).await?;
            flush(&reorder, sink, &mut report).await;
        }
        pool.shutdown().await?;
        flush(&reorder, sink, &mut report).await;

        for (spec, totals) in self.context.catalog.iter().zip(self.statistics()) {
            UpdateSummary {
                update: spec.name(),
                iterations: totals.iterations,
                elapsed: totals.elapsed,
            }
            .log();
        }

        sink.terminate().await?;
        RunCompleted {
            units_read: report.units_read,
            units_written: report.units_written,
            units_dropped: report.units_dropped,
            duration: started.elapsed(),
        }
        .log();
        Ok(report)
    }
}

/// Write every completed unit at the front of the reorder buffer.
async fn flush<K>(reorder: &ReorderBuffer, sink: &mut K, report: &mut RunReport)
where
    K: UnitSink + ?Sized,
{
    for completed in reorder.drain_ready() {
        match completed.result {
            Some(unit) => match sink.write(unit).await {
                Ok(()) => report.units_written += 1,
                Err(error) => OutputWriteFailed {
                    slot: completed.seq,
                    error: &error,
                }
                .log(),
            },
            None => {
                report.units_dropped += 1;
                UnitDropped {
                    slot: completed.seq,
                    unit_id: &completed.unit_id,
                }
                .log();
            }
        }
    }
    tracing::trace!(pending = reorder.len(), "flushed output");
}
