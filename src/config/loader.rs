// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::DEFAULT_ITERATIONS;
use crate::engine::default_concurrency;
use crate::errors::ConfigError;
use crate::io::turtle::PrefixMap;
use crate::io::DEFAULT_SEGMENT_DELIMITER;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Main configuration structure for the stream updater.
///
/// Describes the worker pool, the context window, the graphs every unit can
/// see, the ordered update catalog and the optional debug outputs. It is
/// usually loaded from a YAML file; `.json` and `.toml` files are accepted
/// as well.
///
/// # Fields
/// * `thread_count` - Worker threads (absent or 0 means available parallelism)
/// * `lookahead` - Units following the current one handed in as context
/// * `lookback` - Units preceding the current one handed in as context
/// * `base_graphs` - Graphs loaded once and shared read-only by every unit
/// * `updates` - Ordered update entries applied to every unit
/// * `graph_debug` / `triple_debug` - Optional snapshot output
/// * `prefix_deduplication` - Write each `@prefix` line only once per stream
/// * `prefixes` - Namespaces used to compact output
/// * `segment_delimiter` - Line separating units in the input and output
///
/// # Example
/// ```yaml
/// thread_count: 4
/// lookahead: 1
/// lookback: 1
/// base_graphs:
///   - source: lexicon.ttl
///     graph: http://example.org/lexicon
/// updates:
///   - script: rules/attach-heads.sparql
///     iterations: "*"
///   - name: mark
///     script: "INSERT { ?s a <http://example.org/Marked> } WHERE { ?s ?p ?o }"
/// triple_debug:
///   dir: debug/nt
///   unit_ids: [s12]
/// ```
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub thread_count: Option<usize>,
    #[serde(default)]
    pub lookahead: usize,
    #[serde(default)]
    pub lookback: usize,
    #[serde(default)]
    pub base_graphs: Vec<BaseGraphConfig>,
    #[serde(default)]
    pub updates: Vec<UpdateConfig>,
    #[serde(default)]
    pub graph_debug: Option<DebugOutputConfig>,
    #[serde(default)]
    pub triple_debug: Option<DebugOutputConfig>,
    #[serde(default)]
    pub prefix_deduplication: bool,
    #[serde(default)]
    pub prefixes: PrefixMap,
    #[serde(default = "default_segment_delimiter")]
    pub segment_delimiter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            thread_count: None,
            lookahead: 0,
            lookback: 0,
            base_graphs: Vec::new(),
            updates: Vec::new(),
            graph_debug: None,
            triple_debug: None,
            prefix_deduplication: false,
            prefixes: PrefixMap::new(),
            segment_delimiter: default_segment_delimiter(),
        }
    }
}

impl Config {
    /// Effective worker count, never below one.
    pub fn pool_size(&self) -> usize {
        match self.thread_count {
            Some(n) if n > 0 => n,
            _ => default_concurrency(),
        }
    }

    /// Parse configuration text in the given format.
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self, String> {
        match format {
            ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            ConfigFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        }
    }
}

fn default_segment_delimiter() -> String {
    DEFAULT_SEGMENT_DELIMITER.to_string()
}

/// A graph loaded before streaming starts.
///
/// # Example
/// ```yaml
/// source: data/lexicon.ttl
/// graph: http://example.org/lexicon   # defaults to the source
/// ```
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BaseGraphConfig {
    pub source: String,
    #[serde(default)]
    pub graph: Option<String>,
}

impl BaseGraphConfig {
    /// Name the graph is visible under.
    pub fn graph_name(&self) -> &str {
        self.graph.as_deref().unwrap_or(&self.source)
    }
}

/// One entry of the update catalog.
///
/// `script` is either a path to a script file or the script text itself.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct UpdateConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub script: String,
    #[serde(default)]
    pub iterations: IterationSetting,
}

/// Raw iteration limit: a number or a string (`"*"` or digits).
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum IterationSetting {
    Count(u64),
    Text(String),
}

impl Default for IterationSetting {
    fn default() -> Self {
        IterationSetting::Count(u64::from(DEFAULT_ITERATIONS))
    }
}

/// Snapshot output for selected units.
///
/// An empty `unit_ids` list selects the first unit of the stream.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DebugOutputConfig {
    pub dir: String,
    #[serde(default)]
    pub unit_ids: Vec<String>,
}

/// Configuration file syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    /// Pick the syntax from the file extension; anything unknown is YAML.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => ConfigFormat::Json,
            Some("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Yaml,
        }
    }
}

/// Load a config file, choosing the syntax by extension.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let location = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: location.clone(),
        source,
    })?;
    let cfg = Config::parse(&content, ConfigFormat::from_path(path)).map_err(|message| {
        ConfigError::Parse {
            path: location.clone(),
            message,
        }
    })?;
    tracing::debug!(
        path = %location,
        updates = cfg.updates.len(),
        base_graphs = cfg.base_graphs.len(),
        "configuration loaded"
    );
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic_config() {
        let yaml = r#"
thread_count: 3
lookahead: 2
updates:
  - script: "INSERT DATA { <a> <b> <c> }"
  - name: star
    script: rules/x.sparql
    iterations: "*"
  - script: rules/y.sparql
    iterations: 7
"#;

        let cfg = Config::parse(yaml, ConfigFormat::Yaml).unwrap();
        assert_eq!(cfg.pool_size(), 3);
        assert_eq!(cfg.lookahead, 2);
        assert_eq!(cfg.lookback, 0);
        assert_eq!(cfg.updates.len(), 3);
        assert_eq!(cfg.updates[0].iterations, IterationSetting::Count(1));
        assert_eq!(cfg.updates[1].iterations, IterationSetting::Text("*".to_string()));
        assert_eq!(cfg.updates[1].name.as_deref(), Some("star"));
        assert_eq!(cfg.updates[2].iterations, IterationSetting::Count(7));
        assert_eq!(cfg.segment_delimiter, "###");
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::parse("{}", ConfigFormat::Yaml).unwrap();
        assert!(cfg.thread_count.is_none());
        assert!(cfg.pool_size() >= 1);
        assert!(cfg.updates.is_empty());
        assert!(cfg.graph_debug.is_none());
        assert!(!cfg.prefix_deduplication);
        assert_eq!(cfg.segment_delimiter, Config::default().segment_delimiter);
    }

    #[test]
    fn test_zero_threads_means_available_parallelism() {
        let cfg = Config::parse("thread_count: 0", ConfigFormat::Yaml).unwrap();
        assert_eq!(cfg.pool_size(), default_concurrency());
    }

    #[test]
    fn test_base_graph_name_defaults_to_source() {
        let yaml = r#"
base_graphs:
  - source: lexicon.ttl
  - source: other.ttl
    graph: http://ex.org/other
"#;
        let cfg = Config::parse(yaml, ConfigFormat::Yaml).unwrap();
        assert_eq!(cfg.base_graphs[0].graph_name(), "lexicon.ttl");
        assert_eq!(cfg.base_graphs[1].graph_name(), "http://ex.org/other");
    }

    #[test]
    fn test_debug_sections() {
        let yaml = r#"
graph_debug:
  dir: out/dot
triple_debug:
  dir: out/nt
  unit_ids: [s1, s4]
"#;
        let cfg = Config::parse(yaml, ConfigFormat::Yaml).unwrap();
        let graph = cfg.graph_debug.unwrap();
        assert_eq!(graph.dir, "out/dot");
        assert!(graph.unit_ids.is_empty());
        assert_eq!(cfg.triple_debug.unwrap().unit_ids, vec!["s1", "s4"]);
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_path(Path::new("a.json")), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("a.TOML")), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path(Path::new("a.yml")), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("config")), ConfigFormat::Yaml);
    }

    #[test]
    fn test_rejects_wrong_types() {
        assert!(Config::parse("lookahead: many", ConfigFormat::Yaml).is_err());
        assert!(Config::parse("updates: [{ iterations: 2 }]", ConfigFormat::Yaml).is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config("does/not/exist.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
