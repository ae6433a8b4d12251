// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Context window manager.
//!
//! Units are buffered until enough of their successors have arrived to fill
//! the lookahead window. The buffer then holds, in arrival order, up to
//! `lookback` already dispatched units followed by the pending ones:
//!
//! ```text
//!   [ past ... past | next  pending ... pending ]
//!     <= lookback      ^       <= lookahead
//!                  dispatched next
//! ```
//!
//! Past and pending units are disjoint by construction, so the lookback handed
//! to a unit never repeats anything from its own lookahead.

use std::collections::VecDeque;

use crate::graph::Unit;

/// A unit ready for a worker, with its context.
#[derive(Debug, Clone)]
pub struct Assignment {
    /// Arrival position of the unit, starting at 0.
    pub seq: u64,
    pub unit: Unit,
    /// Preceding units, oldest first.
    pub lookback: Vec<Unit>,
    /// Following units, oldest first.
    pub lookahead: Vec<Unit>,
}

#[derive(Debug)]
pub struct ContextWindow {
    lookahead: usize,
    lookback: usize,
    buffer: VecDeque<Unit>,
    /// Number of already dispatched units at the front of `buffer`.
    past: usize,
    /// Sequence number of `buffer[0]`.
    first_seq: u64,
}

impl ContextWindow {
    pub fn new(lookahead: usize, lookback: usize) -> Self {
        Self {
            lookahead,
            lookback,
            buffer: VecDeque::with_capacity(lookahead + lookback + 1),
            past: 0,
            first_seq: 0,
        }
    }

    /// Buffer a newly read unit and release the oldest pending one once its
    /// lookahead window is full.
    pub fn admit(&mut self, unit: Unit) -> Option<Assignment> {
        self.buffer.push_back(unit);
        if self.pending() > self.lookahead {
            self.dispatch_next()
        } else {
            None
        }
    }

    /// Release the next pending unit after the input has ended.
    ///
    /// Call repeatedly until it returns `None`.
    pub fn drain(&mut self) -> Option<Assignment> {
        if self.pending() == 0 {
            None
        } else {
            self.dispatch_next()
        }
    }

    /// Units read but not dispatched yet.
    pub fn pending(&self) -> usize {
        self.buffer.len() - self.past
    }

    /// Units held in memory, past and pending.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn dispatch_next(&mut self) -> Option<Assignment> {
        let index = self.past;
        let unit = self.buffer.get(index)?.clone();

        let lookback = self
            .buffer
            .range(index.saturating_sub(self.lookback)..index)
            .cloned()
            .collect();
        let lookahead_end = self.buffer.len().min(index + 1 + self.lookahead);
        let lookahead = self.buffer.range(index + 1..lookahead_end).cloned().collect();

        let seq = self.first_seq + index as u64;
        self.past += 1;
        while self.past > self.lookback {
            self.buffer.pop_front();
            self.past -= 1;
            self.first_seq += 1;
        }

        Some(Assignment {
            seq,
            unit,
            lookback,
            lookahead,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Graph, Term, Triple};

    fn unit(n: usize) -> Unit {
        let mut graph = Graph::new();
        graph.insert(Triple::new(
            Term::iri(format!("http://ex.org/s{}", n)),
            Term::iri("http://ex.org/n"),
            Term::literal(n.to_string()),
        ));
        Unit::new(graph)
    }

    fn numbers(units: &[Unit]) -> Vec<String> {
        units
            .iter()
            .map(|u| u.graph().iter().next().unwrap().subject.local_name().unwrap().to_string())
            .collect()
    }

    fn run_window(count: usize, lookahead: usize, lookback: usize) -> Vec<Assignment> {
        let mut window = ContextWindow::new(lookahead, lookback);
        let mut out = Vec::new();
        for n in 0..count {
            out.extend(window.admit(unit(n)));
            assert!(window.buffered() <= lookahead + lookback + 1);
        }
        while let Some(assignment) = window.drain() {
            out.push(assignment);
        }
        out
    }

    #[test]
    fn test_every_unit_dispatched_once_in_order() {
        let out = run_window(6, 2, 1);
        let seqs: Vec<u64> = out.iter().map(|a| a.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_context_matches_neighbours() {
        let (count, lookahead, lookback) = (7, 2, 3);
        for assignment in run_window(count, lookahead, lookback) {
            let k = assignment.seq as usize;
            let expected_back: Vec<String> =
                (k.saturating_sub(lookback)..k).map(|n| format!("s{}", n)).collect();
            let expected_ahead: Vec<String> = (k + 1..=(k + lookahead).min(count - 1))
                .map(|n| format!("s{}", n))
                .collect();
            assert_eq!(numbers(&assignment.lookback), expected_back, "lookback of {}", k);
            assert_eq!(numbers(&assignment.lookahead), expected_ahead, "lookahead of {}", k);
        }
    }

    #[test]
    fn test_no_context_dispatches_immediately() {
        let mut window = ContextWindow::new(0, 0);
        let assignment = window.admit(unit(0)).unwrap();
        assert!(assignment.lookback.is_empty());
        assert!(assignment.lookahead.is_empty());
        assert_eq!(window.buffered(), 0);
        assert!(window.drain().is_none());
    }

    #[test]
    fn test_lookahead_holds_units_until_stream_end() {
        let mut window = ContextWindow::new(3, 0);
        assert!(window.admit(unit(0)).is_none());
        assert!(window.admit(unit(1)).is_none());
        assert_eq!(window.pending(), 2);
        let first = window.drain().unwrap();
        assert_eq!(numbers(&first.lookahead), vec!["s1"]);
        let second = window.drain().unwrap();
        assert!(second.lookahead.is_empty());
        assert!(window.drain().is_none());
    }
}
