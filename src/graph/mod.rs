// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod base;
mod store;
mod term;
mod unit;

pub use base::BaseGraphStore;
pub use store::{Dataset, Graph, GraphName, LOOKAHEAD_GRAPH, LOOKBACK_GRAPH};
pub use term::{
    Literal, Term, Triple, RDF_LANG_STRING, RDF_TYPE, XSD_BOOLEAN, XSD_DECIMAL, XSD_INTEGER,
    XSD_NAMESPACE, XSD_STRING,
};
pub use unit::{Unit, NIF_SENTENCE, NO_UNIT_ID};
