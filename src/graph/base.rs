// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::errors::ConfigError;
use crate::graph::Graph;
use crate::io::turtle;
use crate::observability::messages::{engine::BaseGraphLoaded, StructuredLog};

/// Read-only background graphs, loaded once before streaming starts.
///
/// Workers never see this store directly; each copies it into its private
/// [`Dataset`](super::Dataset) when it is created.
#[derive(Debug, Clone, Default)]
pub struct BaseGraphStore {
    graphs: BTreeMap<String, Graph>,
}

impl BaseGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, graph: Graph) {
        self.graphs.insert(name.into(), graph);
    }

    /// Parse the file at `locator` into the named graph `name`, which defaults
    /// to the locator itself.
    pub fn load(&mut self, locator: &str, name: Option<&str>) -> Result<(), ConfigError> {
        let name = name.unwrap_or(locator);
        tracing::info!(source = locator, graph = name, "loading base graph");
        let content = fs::read_to_string(Path::new(locator)).map_err(|source| ConfigError::Io {
            path: locator.to_string(),
            source,
        })?;
        let graph = turtle::parse_document(&content).map_err(|source| ConfigError::BaseGraph {
            locator: locator.to_string(),
            source,
        })?;
        BaseGraphLoaded {
            locator,
            graph: name,
            triple_count: graph.len(),
        }
        .log();
        self.insert(name, graph);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Graph> {
        self.graphs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.graphs.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Graph)> {
        self.graphs.iter().map(|(name, graph)| (name.as_str(), graph))
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_defaults_graph_name_to_locator() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "<http://ex.org/a> <http://ex.org/p> \"v\" .").unwrap();
        let locator = file.path().to_str().unwrap().to_string();

        let mut store = BaseGraphStore::new();
        store.load(&locator, None).unwrap();
        store.load(&locator, Some("http://ex.org/lexicon")).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&locator).unwrap().len(), 1);
        assert!(store.contains("http://ex.org/lexicon"));
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let mut store = BaseGraphStore::new();
        let err = store.load("/definitely/not/here.ttl", None).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
