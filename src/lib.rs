// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod config;     // config loading + update catalog
pub mod engine;     // window, pool, fixpoint executor, reorder buffer
pub mod errors;     // error handling
pub mod graph;      // RDF terms, graphs, datasets, units
pub mod io;         // concrete sources and sinks
pub mod observability;
pub mod traits;     // source/sink contracts
pub mod update;     // update scripts and their evaluation
