// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! In-memory graphs and the per-worker dataset.

use std::collections::{BTreeMap, BTreeSet};

use crate::errors::UpdateError;
use crate::graph::{BaseGraphStore, Term, Triple};

/// Named graph holding the units that precede the one being processed.
pub const LOOKBACK_GRAPH: &str = "https://github.com/acoli-repo/conll-rdf/lookback";
/// Named graph holding the units that follow the one being processed.
pub const LOOKAHEAD_GRAPH: &str = "https://github.com/acoli-repo/conll-rdf/lookahead";

/// An ordered set of triples with a mutation counter.
///
/// `revision` increases on every insert or removal that actually changed the
/// set. Comparing revisions is the live change-tracking signal the fixpoint
/// executor polls after each iteration.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    triples: BTreeSet<Triple>,
    revision: u64,
}

impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        self.triples == other.triples
    }
}

impl Eq for Graph {}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, triple: Triple) -> bool {
        let inserted = self.triples.insert(triple);
        if inserted {
            self.revision += 1;
        }
        inserted
    }

    pub fn remove(&mut self, triple: &Triple) -> bool {
        let removed = self.triples.remove(triple);
        if removed {
            self.revision += 1;
        }
        removed
    }

    pub fn extend_from(&mut self, other: &Graph) {
        for triple in other.iter() {
            self.insert(triple.clone());
        }
    }

    pub fn clear(&mut self) {
        if !self.triples.is_empty() {
            self.triples.clear();
            self.revision += 1;
        }
    }

    pub fn contains(&self, triple: &Triple) -> bool {
        self.triples.contains(triple)
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Triples matching the given positions; `None` matches anything.
    pub fn matching<'a>(
        &'a self,
        subject: Option<&'a Term>,
        predicate: Option<&'a Term>,
        object: Option<&'a Term>,
    ) -> impl Iterator<Item = &'a Triple> + 'a {
        self.triples.iter().filter(move |t| {
            subject.map_or(true, |s| &t.subject == s)
                && predicate.map_or(true, |p| &t.predicate == p)
                && object.map_or(true, |o| &t.object == o)
        })
    }

    /// Full textual form: one N-Triples statement per line in sorted order.
    pub fn snapshot(&self) -> String {
        let mut text = String::new();
        for triple in &self.triples {
            text.push_str(&triple.to_string());
            text.push('\n');
        }
        text
    }
}

impl FromIterator<Triple> for Graph {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        let mut graph = Graph::new();
        for triple in iter {
            graph.insert(triple);
        }
        graph
    }
}

/// Graph selector used by update operations.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GraphName {
    Default,
    Named(String),
}

impl GraphName {
    pub fn named(name: impl Into<String>) -> Self {
        GraphName::Named(name.into())
    }
}

/// A worker's private store: the default graph, the context graphs and a copy
/// of every base graph.
///
/// Base graph copies are registered read-only; any attempt to write to one
/// fails with [`UpdateError::ReadOnlyGraph`] so that no unit can leak state
/// into the next one through them.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    default: Graph,
    named: BTreeMap<String, Graph>,
    read_only: BTreeSet<String>,
}

impl Dataset {
    pub fn new() -> Self {
        let mut dataset = Self::default();
        dataset.named.insert(LOOKBACK_GRAPH.to_string(), Graph::new());
        dataset.named.insert(LOOKAHEAD_GRAPH.to_string(), Graph::new());
        dataset
    }

    /// Copy every base graph into a fresh dataset.
    pub fn seeded_from(base: &BaseGraphStore) -> Self {
        let mut dataset = Self::new();
        for (name, graph) in base.iter() {
            dataset.named.insert(name.to_string(), graph.clone());
            dataset.read_only.insert(name.to_string());
        }
        dataset
    }

    pub fn default_graph(&self) -> &Graph {
        &self.default
    }

    pub fn default_graph_mut(&mut self) -> &mut Graph {
        &mut self.default
    }

    pub fn graph(&self, name: &GraphName) -> Option<&Graph> {
        match name {
            GraphName::Default => Some(&self.default),
            GraphName::Named(iri) => self.named.get(iri),
        }
    }

    /// Writable access to a graph, creating a named graph on first write.
    pub fn graph_mut(&mut self, name: &GraphName) -> Result<&mut Graph, UpdateError> {
        match name {
            GraphName::Default => Ok(&mut self.default),
            GraphName::Named(iri) => {
                if self.read_only.contains(iri) {
                    return Err(UpdateError::ReadOnlyGraph { graph: iri.clone() });
                }
                Ok(self.named.entry(iri.clone()).or_default())
            }
        }
    }

    pub fn named_graphs(&self) -> impl Iterator<Item = (&str, &Graph)> {
        self.named.iter().map(|(name, graph)| (name.as_str(), graph))
    }

    pub fn is_read_only(&self, name: &str) -> bool {
        self.read_only.contains(name)
    }

    /// Empty the default graph and every writable named graph.
    pub fn clear_working_graphs(&mut self) {
        self.default.clear();
        for (name, graph) in self.named.iter_mut() {
            if !self.read_only.contains(name) {
                graph.clear();
            }
        }
    }
}
