// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod debug_export;
pub mod fixpoint;
pub mod pool;
pub mod reorder;
pub mod stats;
pub mod updater;
pub mod window;

pub use debug_export::{DebugExporter, DebugSelection, SnapshotLabel};
pub use fixpoint::{FixpointExecutor, SharedContext, UpdateRun};
pub use pool::{WorkerPool, WorkerState};
pub use reorder::{Completed, ReorderBuffer};
pub use stats::{UpdateStatistics, UpdateTotals};
pub use updater::{default_concurrency, RunReport, StreamUpdater};
pub use window::{Assignment, ContextWindow};
