// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use tokio::io::{AsyncBufRead, AsyncWrite};

use crate::config::{Config, DebugOutputConfig, UpdateCatalog};
use crate::engine::{DebugExporter, StreamUpdater};
use crate::errors::ConfigError;
use crate::graph::{BaseGraphStore, LOOKAHEAD_GRAPH, LOOKBACK_GRAPH};
use crate::io::{SegmentedSource, TurtleSink};
use crate::observability::messages::config::DebugOutputEnabled;
use crate::observability::messages::StructuredLog;

/// Stream runtime builder - turns a loaded [`Config`] into a ready updater and
/// its I/O collaborators.
///
/// Everything that can fail before streaming starts fails here: update
/// scripts are resolved and parsed, base graphs are read, debug directories
/// are created.
///
/// # Examples
///
/// ```no_run
/// use rdf_stream_updater::config::{load_config, RuntimeBuilder};
///
/// # async fn demo() -> anyhow::Result<()> {
/// let config = load_config("configs/pipeline.yaml")?;
/// let updater = RuntimeBuilder::from_config(&config)?;
///
/// let stdin = tokio::io::BufReader::new(tokio::io::stdin());
/// let mut source = RuntimeBuilder::source(&config, stdin);
/// let mut sink = RuntimeBuilder::sink(&config, tokio::io::stdout());
/// updater.run(&mut source, &mut sink).await?;
/// # Ok(())
/// # }
/// ```
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    /// Build the updater: catalog, base graphs, debug exporter and window sizes.
    pub fn from_config(cfg: &Config) -> Result<StreamUpdater, ConfigError> {
        let catalog = UpdateCatalog::from_config(&cfg.updates)?;
        let base = Self::base_graphs(cfg)?;
        let exporter = Self::debug_exporter(cfg)?;

        Ok(StreamUpdater::new(catalog)
            .with_pool_size(cfg.pool_size())
            .with_lookahead(cfg.lookahead)
            .with_lookback(cfg.lookback)
            .with_base_graphs(base)
            .with_debug_exporter(exporter))
    }

    /// Load every configured base graph. The context graph names are reserved.
    pub fn base_graphs(cfg: &Config) -> Result<BaseGraphStore, ConfigError> {
        let mut store = BaseGraphStore::new();
        for entry in &cfg.base_graphs {
            let name = entry.graph_name();
            if name == LOOKBACK_GRAPH || name == LOOKAHEAD_GRAPH {
                return Err(ConfigError::ReservedGraphName {
                    name: name.to_string(),
                });
            }
            store.load(&entry.source, Some(name))?;
        }
        Ok(store)
    }

    pub fn debug_exporter(cfg: &Config) -> Result<DebugExporter, ConfigError> {
        let mut exporter = DebugExporter::new();
        if let Some(graph) = &cfg.graph_debug {
            exporter = exporter.with_graph_output(&graph.dir, &graph.unit_ids)?;
            announce("graph", graph);
        }
        if let Some(triples) = &cfg.triple_debug {
            exporter = exporter.with_triple_output(&triples.dir, &triples.unit_ids)?;
            announce("triples", triples);
        }
        Ok(exporter)
    }

    /// Input reader splitting on the configured delimiter.
    pub fn source<R>(cfg: &Config, reader: R) -> SegmentedSource<R>
    where
        R: AsyncBufRead + Unpin + Send,
    {
        SegmentedSource::with_delimiter(reader, cfg.segment_delimiter.clone())
    }

    /// Output writer with the configured prefixes and delimiter.
    pub fn sink<W>(cfg: &Config, writer: W) -> TurtleSink<W>
    where
        W: AsyncWrite + Unpin + Send,
    {
        TurtleSink::new(writer)
            .with_prefixes(cfg.prefixes.clone(), cfg.prefix_deduplication)
            .with_delimiter(cfg.segment_delimiter.clone())
    }
}

fn announce(kind: &str, output: &DebugOutputConfig) {
    DebugOutputEnabled {
        kind,
        directory: &output.dir,
        unit_ids: &output.unit_ids,
    }
    .log();
}
