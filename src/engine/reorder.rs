// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Output reorder buffer.
//!
//! One entry is appended per dispatched unit, in dispatch order. The owning
//! worker completes its entry; the main loop then releases the longest run of
//! completed entries from the front. Release order is therefore dispatch
//! order, whatever order the workers finish in.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use crate::graph::Unit;

#[derive(Debug)]
enum SlotState {
    Pending { worker: usize },
    Done(Option<Unit>),
}

#[derive(Debug)]
struct OutputSlot {
    seq: u64,
    unit_id: String,
    state: SlotState,
}

/// A completed entry released by [`ReorderBuffer::drain_ready`].
///
/// `result` is `None` when processing failed and the unit is to be dropped.
#[derive(Debug)]
pub struct Completed {
    pub seq: u64,
    pub unit_id: String,
    pub result: Option<Unit>,
}

#[derive(Debug, Default)]
pub struct ReorderBuffer {
    slots: Mutex<VecDeque<OutputSlot>>,
}

impl ReorderBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<OutputSlot>> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append a pending entry owned by `worker`.
    pub fn register(&self, worker: usize, seq: u64, unit_id: impl Into<String>) {
        self.lock().push_back(OutputSlot {
            seq,
            unit_id: unit_id.into(),
            state: SlotState::Pending { worker },
        });
    }

    /// Complete the oldest entry still owned by `worker`.
    ///
    /// Returns `false` if the worker owns no pending entry.
    pub fn mark_done(&self, worker: usize, result: Option<Unit>) -> bool {
        let mut slots = self.lock();
        let owned = slots
            .iter_mut()
            .find(|slot| matches!(slot.state, SlotState::Pending { worker: w } if w == worker));
        match owned {
            Some(slot) => {
                slot.state = SlotState::Done(result);
                true
            }
            None => false,
        }
    }

    /// Pop every completed entry at the front, stopping at the first pending one.
    pub fn drain_ready(&self) -> Vec<Completed> {
        let mut slots = self.lock();
        let mut ready = Vec::new();
        while matches!(slots.front(), Some(OutputSlot { state: SlotState::Done(_), .. })) {
            if let Some(OutputSlot {
                seq,
                unit_id,
                state: SlotState::Done(result),
            }) = slots.pop_front()
            {
                ready.push(Completed {
                    seq,
                    unit_id,
                    result,
                });
            }
        }
        ready
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Graph, Term, Triple};

    fn unit(label: &str) -> Unit {
        let mut graph = Graph::new();
        graph.insert(Triple::new(
            Term::iri(format!("http://ex.org/{}", label)),
            Term::iri("http://ex.org/p"),
            Term::literal(label),
        ));
        Unit::new(graph)
    }

    #[test]
    fn test_releases_only_completed_prefix() {
        let buffer = ReorderBuffer::new();
        buffer.register(0, 0, "a");
        buffer.register(1, 1, "b");
        buffer.register(2, 2, "c");

        assert!(buffer.mark_done(2, Some(unit("c"))));
        assert!(buffer.drain_ready().is_empty());

        assert!(buffer.mark_done(0, Some(unit("a"))));
        let ready: Vec<u64> = buffer.drain_ready().iter().map(|c| c.seq).collect();
        assert_eq!(ready, vec![0]);

        assert!(buffer.mark_done(1, None));
        let ready = buffer.drain_ready();
        assert_eq!(ready.len(), 2);
        assert!(ready[0].result.is_none());
        assert_eq!(ready[0].unit_id, "b");
        assert_eq!(ready[1].seq, 2);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_mark_done_targets_oldest_entry_of_worker() {
        let buffer = ReorderBuffer::new();
        buffer.register(0, 0, "a");
        buffer.mark_done(0, Some(unit("a")));
        buffer.register(0, 1, "b");

        assert!(buffer.mark_done(0, Some(unit("b"))));
        assert!(!buffer.mark_done(0, None));
        assert_eq!(buffer.drain_ready().len(), 2);
    }
}
