// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::errors::{SinkError, SourceError, UpdateError};

/// Failure while a worker loads, updates or unloads one unit.
///
/// These are recovered inside the worker: the unit is dropped and the worker
/// moves on to its next assignment.
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Worker {slot} panicked while processing unit '{unit_id}': {message}")]
    Panicked {
        slot: usize,
        unit_id: String,
        message: String,
    },

    #[error("Worker {slot} could not load unit '{unit_id}': {source}")]
    Load {
        slot: usize,
        unit_id: String,
        #[source]
        source: UpdateError,
    },
}

/// Structural failures that end a streaming run.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("Failed to spawn worker {slot}: {source}")]
    WorkerSpawn {
        slot: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Worker {slot} is no longer accepting assignments")]
    WorkerGone { slot: usize },

    #[error("Worker pool idle queue closed unexpectedly")]
    PoolClosed,
}
