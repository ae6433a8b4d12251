// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use crate::graph::{Graph, Term, RDF_TYPE};

pub const NIF_SENTENCE: &str =
    "http://persistence.uni-leipzig.org/nlp2rdf/ontologies/nif-core#Sentence";

/// Display id of a unit without any sentence resource.
pub const NO_UNIT_ID: &str = "none";

/// One streamed chunk of graph data ("sentence graph").
///
/// Units are immutable once built and cheap to clone, so the same unit can sit
/// in the lookahead queue, the lookback queue and a worker assignment at once.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    graph: Arc<Graph>,
}

impl Unit {
    pub fn new(graph: Graph) -> Self {
        Self {
            graph: Arc::new(graph),
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    /// Local name of the first `nif:Sentence` subject, or `"none"`.
    pub fn id(&self) -> String {
        let rdf_type = Term::iri(RDF_TYPE);
        let sentence = Term::iri(NIF_SENTENCE);
        let id = self
            .graph
            .matching(None, Some(&rdf_type), Some(&sentence))
            .find_map(|t| t.subject.local_name())
            .map(str::to_string)
            .unwrap_or_else(|| NO_UNIT_ID.to_string());
        id
    }
}

impl From<Graph> for Unit {
    fn from(graph: Graph) -> Self {
        Unit::new(graph)
    }
}

impl Display for Unit {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.graph.snapshot())
    }
}
