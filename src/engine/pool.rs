// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Worker pool and dispatcher.
//!
//! Every worker is a dedicated OS thread owning one [`FixpointExecutor`].
//! Workers are started lazily, up to the pool size, and then reused. The
//! dispatcher talks to a worker through a command channel; a worker reports
//! back on a shared idle queue once its result is in the reorder buffer.
//!
//! ```text
//!  dispatch ──Process──▶ worker N ──mark_done──▶ ReorderBuffer
//!     ▲                     │
//!     └──── idle queue ◀────┘
//! ```
//!
//! A dispatch prefers an idle worker, then a new one, and otherwise waits on
//! the idle queue. Shutdown waits for every busy worker, sends `Stop` to each
//! one and joins the threads.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tokio::sync::mpsc;

use crate::engine::fixpoint::{FixpointExecutor, SharedContext};
use crate::engine::reorder::ReorderBuffer;
use crate::engine::window::Assignment;
use crate::errors::{StreamError, WorkerError};
use crate::graph::Unit;
use crate::observability::messages::engine::WorkerSpawned;
use crate::observability::messages::worker::{
    UnitProcessed, UnitProcessingFailed, UnitProcessingPanicked, WorkerJoinFailed,
};
use crate::observability::messages::StructuredLog;

/// Lifecycle of a worker. Only the worker thread writes its state; the
/// dispatcher reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Waiting for an assignment.
    Idle,
    /// An assignment was received and is being set up.
    Assigned,
    Running,
    /// Result handed to the reorder buffer.
    Done,
}

enum WorkerCommand {
    Process(Assignment),
    Stop,
}

struct WorkerHandle {
    id: usize,
    commands: std_mpsc::Sender<WorkerCommand>,
    state: Arc<Mutex<WorkerState>>,
    thread: Option<JoinHandle<()>>,
}

fn set_state(state: &Mutex<WorkerState>, next: WorkerState) {
    *state.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = next;
}

fn read_state(state: &Mutex<WorkerState>) -> WorkerState {
    *state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct WorkerPool {
    context: SharedContext,
    reorder: Arc<ReorderBuffer>,
    size: usize,
    workers: Vec<WorkerHandle>,
    idle_tx: mpsc::UnboundedSender<usize>,
    idle_rx: mpsc::UnboundedReceiver<usize>,
    /// Workers holding an assignment whose idle report was not consumed yet.
    busy: usize,
}

impl WorkerPool {
    pub fn new(context: SharedContext, reorder: Arc<ReorderBuffer>, size: usize) -> Self {
        let (idle_tx, idle_rx) = mpsc::unbounded_channel();
        Self {
            context,
            reorder,
            size: size.max(1),
            workers: Vec::new(),
            idle_tx,
            idle_rx,
            busy: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of worker threads started so far.
    pub fn spawned(&self) -> usize {
        self.workers.len()
    }

    pub fn states(&self) -> Vec<WorkerState> {
        self.workers.iter().map(|w| read_state(&w.state)).collect()
    }

    /// Hand an assignment to a worker, waiting for one to become idle if the
    /// pool is saturated.
    pub async fn dispatch(&mut self, assignment: Assignment) -> Result<usize, StreamError> {
        let worker_id = match self.idle_rx.try_recv() {
            Ok(id) => {
                self.busy -= 1;
                id
            }
            Err(_) if self.workers.len() < self.size => self.spawn_worker()?,
            Err(_) => {
                let id = self.idle_rx.recv().await.ok_or(StreamError::PoolClosed)?;
                self.busy -= 1;
                id
            }
        };

        let worker = self
            .workers
            .get(worker_id)
            .ok_or(StreamError::WorkerGone { slot: worker_id })?;
        self.reorder
            .register(worker.id, assignment.seq, assignment.unit.id());
        tracing::trace!(worker_id, seq = assignment.seq, "dispatching unit");
        worker
            .commands
            .send(WorkerCommand::Process(assignment))
            .map_err(|_| StreamError::WorkerGone { slot: worker_id })?;
        self.busy += 1;
        Ok(worker_id)
    }

    fn spawn_worker(&mut self) -> Result<usize, StreamError> {
        let id = self.workers.len();
        let (commands, receiver) = std_mpsc::channel();
        let state = Arc::new(Mutex::new(WorkerState::Idle));
        let context = self.context.clone();
        let reorder = Arc::clone(&self.reorder);
        let idle = self.idle_tx.clone();
        let thread_state = Arc::clone(&state);
        let thread = thread::Builder::new()
            .name(format!("updater-worker-{id}"))
            .spawn(move || run_worker(id, context, reorder, receiver, thread_state, idle))
            .map_err(|source| StreamError::WorkerSpawn { slot: id, source })?;
        self.workers.push(WorkerHandle {
            id,
            commands,
            state,
            thread: Some(thread),
        });
        WorkerSpawned {
            worker_id: id,
            pool_size: self.size,
        }
        .log();
        Ok(id)
    }

    /// Wait for every busy worker, then stop and join all of them.
    pub async fn shutdown(mut self) -> Result<(), StreamError> {
        while self.busy > 0 {
            self.idle_rx.recv().await.ok_or(StreamError::PoolClosed)?;
            self.busy -= 1;
        }
        for worker in &self.workers {
            let _ = worker.commands.send(WorkerCommand::Stop);
        }
        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take() {
                if thread.join().is_err() {
                    WorkerJoinFailed { worker_id: worker.id }.log();
                }
            }
        }
        Ok(())
    }
}

fn run_worker(
    id: usize,
    context: SharedContext,
    reorder: Arc<ReorderBuffer>,
    commands: std_mpsc::Receiver<WorkerCommand>,
    state: Arc<Mutex<WorkerState>>,
    idle: mpsc::UnboundedSender<usize>,
) {
    let mut executor = FixpointExecutor::new(id, context);
    while let Ok(command) = commands.recv() {
        match command {
            WorkerCommand::Stop => break,
            WorkerCommand::Process(assignment) => {
                set_state(&state, WorkerState::Assigned);
                set_state(&state, WorkerState::Running);
                let result = process_assignment(id, &mut executor, &assignment);
                set_state(&state, WorkerState::Done);
                reorder.mark_done(id, result);
                set_state(&state, WorkerState::Idle);
                if idle.send(id).is_err() {
                    break;
                }
            }
        }
    }
    tracing::debug!(worker_id = id, "worker stopped");
}

/// Run one assignment, turning any failure into a dropped result.
fn process_assignment(
    id: usize,
    executor: &mut FixpointExecutor,
    assignment: &Assignment,
) -> Option<Unit> {
    let started = Instant::now();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| executor.process(assignment)));
    let unit_id = assignment.unit.id();
    let error = match outcome {
        Ok(Ok(unit)) => {
            UnitProcessed {
                worker_id: id,
                slot: assignment.seq,
                unit_id: &unit_id,
                triple_count: unit.len(),
                duration: started.elapsed(),
            }
            .log();
            return Some(unit);
        }
        Ok(Err(error)) => error,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            UnitProcessingPanicked {
                worker_id: id,
                unit_id: &unit_id,
                message: &message,
            }
            .log();
            WorkerError::Panicked {
                slot: id,
                unit_id: unit_id.clone(),
                message,
            }
        }
    };
    UnitProcessingFailed {
        worker_id: id,
        slot: assignment.seq,
        unit_id: &unit_id,
        triple_count: assignment.unit.len(),
        error: &error,
    }
    .log();
    executor.reset();
    None
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
