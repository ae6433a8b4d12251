// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Debug snapshots of selected units while their updates run.
//!
//! Files are named
//! `<unit>__U<update:3>_I<iteration:4>_S<step:3>__<update name>.<ext>`, with
//! `.dot` for graph output and `.nt` (sorted N-Triples) for triple output. The
//! freshly loaded unit is written as `U000_I0000_S000__INIT`.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::errors::ConfigError;
use crate::graph::{Graph, Term};
use crate::observability::messages::worker::DebugSnapshotFailed;
use crate::observability::messages::StructuredLog;

/// Update name used for the snapshot of the unit before any update ran.
pub const INIT_SNAPSHOT: &str = "INIT";

#[derive(Debug)]
struct DebugTarget {
    directory: PathBuf,
    unit_ids: BTreeSet<String>,
}

impl DebugTarget {
    fn new(directory: impl Into<PathBuf>, unit_ids: &[String]) -> Result<Self, ConfigError> {
        let directory = directory.into();
        ensure_directory(&directory)?;
        Ok(Self {
            directory,
            unit_ids: unit_ids.iter().cloned().collect(),
        })
    }

    fn wants(&self, unit_id: &str, first: Option<&String>) -> bool {
        if self.unit_ids.is_empty() {
            first.map_or(false, |first| first == unit_id)
        } else {
            self.unit_ids.contains(unit_id)
        }
    }
}

fn ensure_directory(path: &Path) -> Result<(), ConfigError> {
    if path.exists() && !path.is_dir() {
        return Err(ConfigError::DebugDirectory {
            path: path.display().to_string(),
            reason: "exists and is not a directory".to_string(),
        });
    }
    fs::create_dir_all(path).map_err(|err| ConfigError::DebugDirectory {
        path: path.display().to_string(),
        reason: err.to_string(),
    })
}

/// Which outputs are active for one unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugSelection {
    pub graph: bool,
    pub triples: bool,
}

impl DebugSelection {
    pub fn any(&self) -> bool {
        self.graph || self.triples
    }
}

/// Position of a snapshot within a unit's run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotLabel {
    /// 1-based update position, 0 for the initial snapshot.
    pub update: usize,
    /// 1-based iteration.
    pub iteration: u32,
    /// 1-based operation within the update script.
    pub step: usize,
}

impl SnapshotLabel {
    pub const INIT: SnapshotLabel = SnapshotLabel {
        update: 0,
        iteration: 0,
        step: 0,
    };
}

#[derive(Debug, Default)]
pub struct DebugExporter {
    graph: Option<DebugTarget>,
    triples: Option<DebugTarget>,
    first_unit: OnceLock<String>,
}

impl DebugExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable DOT output into `directory`, creating it if needed.
    pub fn with_graph_output(
        mut self,
        directory: impl Into<PathBuf>,
        unit_ids: &[String],
    ) -> Result<Self, ConfigError> {
        self.graph = Some(DebugTarget::new(directory, unit_ids)?);
        Ok(self)
    }

    /// Enable sorted N-Triples output into `directory`, creating it if needed.
    pub fn with_triple_output(
        mut self,
        directory: impl Into<PathBuf>,
        unit_ids: &[String],
    ) -> Result<Self, ConfigError> {
        self.triples = Some(DebugTarget::new(directory, unit_ids)?);
        Ok(self)
    }

    pub fn is_enabled(&self) -> bool {
        self.graph.is_some() || self.triples.is_some()
    }

    /// Record a unit id as read from the input. The first one becomes the
    /// selection of any output configured without explicit ids.
    pub fn observe(&self, unit_id: &str) {
        if self.is_enabled() {
            let _ = self.first_unit.set(unit_id.to_string());
        }
    }

    pub fn selection(&self, unit_id: &str) -> DebugSelection {
        let first = self.first_unit.get();
        DebugSelection {
            graph: self.graph.as_ref().map_or(false, |t| t.wants(unit_id, first)),
            triples: self.triples.as_ref().map_or(false, |t| t.wants(unit_id, first)),
        }
    }

    /// Write the selected snapshots of `graph`. Failures are logged, never raised.
    pub fn export(
        &self,
        selection: DebugSelection,
        graph: &Graph,
        unit_id: &str,
        label: SnapshotLabel,
        update_name: &str,
        operation: Option<&str>,
    ) {
        if let (true, Some(target)) = (selection.graph, &self.graph) {
            let path = target
                .directory
                .join(snapshot_file_name(unit_id, label, update_name, "dot"));
            write_snapshot(&path, &render_dot(graph, operation));
        }
        if let (true, Some(target)) = (selection.triples, &self.triples) {
            let path = target
                .directory
                .join(snapshot_file_name(unit_id, label, update_name, "nt"));
            write_snapshot(&path, &graph.snapshot());
        }
    }
}

fn write_snapshot(path: &Path, content: &str) {
    if let Err(error) = fs::write(path, content) {
        DebugSnapshotFailed {
            path: &path.display().to_string(),
            error: &error,
        }
        .log();
    }
}

/// File name for one snapshot.
pub fn snapshot_file_name(
    unit_id: &str,
    label: SnapshotLabel,
    update_name: &str,
    extension: &str,
) -> String {
    let base = Path::new(update_name)
        .file_name()
        .map(|n| n.to_string_lossy().replace(".sparql", ""))
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "update".to_string());
    format!(
        "{}__U{:03}_I{:04}_S{:03}__{}.{}",
        unit_id, label.update, label.iteration, label.step, base, extension
    )
}

fn dot_label(term: &Term) -> String {
    let text = match term {
        Term::Iri(iri) => term.local_name().filter(|n| !n.is_empty()).unwrap_or(iri).to_string(),
        other => other.to_string(),
    };
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

fn dot_id(term: &Term) -> String {
    term.to_string().replace('\\', "\\\\").replace('"', "\\\"")
}

/// Render a graph in Graphviz DOT: one node per resource, one labelled edge
/// per triple.
fn render_dot(graph: &Graph, operation: Option<&str>) -> String {
    let mut nodes = BTreeSet::new();
    let mut edges = String::new();
    for triple in graph.iter() {
        nodes.insert(&triple.subject);
        nodes.insert(&triple.object);
        edges.push_str(&format!(
            "  \"{}\" -> \"{}\" [label=\"{}\"];\n",
            dot_id(&triple.subject),
            dot_id(&triple.object),
            dot_label(&triple.predicate)
        ));
    }

    let mut dot = String::from("digraph G {\n  rankdir=LR;\n");
    if let Some(operation) = operation {
        let caption = operation.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\l");
        dot.push_str(&format!("  label=\"{}\\l\";\n  labeljust=l;\n", caption));
    }
    for node in nodes {
        let shape = if node.is_literal() { "box" } else { "ellipse" };
        dot.push_str(&format!(
            "  \"{}\" [label=\"{}\", shape={}];\n",
            dot_id(node),
            dot_label(node),
            shape
        ));
    }
    dot.push_str(&edges);
    dot.push_str("}\n");
    dot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Triple;

    fn sample_graph() -> Graph {
        let mut graph = Graph::new();
        graph.insert(Triple::new(
            Term::iri("http://ex.org/s1_1"),
            Term::iri("http://ex.org/word"),
            Term::literal("Hello \"world\""),
        ));
        graph
    }

    #[test]
    fn test_file_name_format() {
        let label = SnapshotLabel {
            update: 2,
            iteration: 15,
            step: 3,
        };
        assert_eq!(
            snapshot_file_name("s1", label, "rules/merge.sparql", "nt"),
            "s1__U002_I0015_S003__merge.nt"
        );
        assert_eq!(
            snapshot_file_name("s1", SnapshotLabel::INIT, INIT_SNAPSHOT, "dot"),
            "s1__U000_I0000_S000__INIT.dot"
        );
    }

    #[test]
    fn test_first_observed_unit_is_default_selection() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = DebugExporter::new()
            .with_triple_output(dir.path().join("nt"), &[])
            .unwrap();
        assert!(!exporter.selection("s1").any());

        exporter.observe("s1");
        exporter.observe("s2");
        assert!(exporter.selection("s1").triples);
        assert!(!exporter.selection("s1").graph);
        assert!(!exporter.selection("s2").any());
    }

    #[test]
    fn test_explicit_ids_and_written_files() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = DebugExporter::new()
            .with_graph_output(dir.path().join("dot"), &["s7".to_string()])
            .unwrap()
            .with_triple_output(dir.path().join("nt"), &["s7".to_string()])
            .unwrap();
        exporter.observe("s1");
        let selection = exporter.selection("s7");
        assert!(selection.graph && selection.triples);

        exporter.export(
            selection,
            &sample_graph(),
            "s7",
            SnapshotLabel::INIT,
            INIT_SNAPSHOT,
            None,
        );
        let nt = fs::read_to_string(dir.path().join("nt/s7__U000_I0000_S000__INIT.nt")).unwrap();
        assert_eq!(nt, sample_graph().snapshot());
        let dot = fs::read_to_string(dir.path().join("dot/s7__U000_I0000_S000__INIT.dot")).unwrap();
        assert!(dot.starts_with("digraph G {"));
        assert!(dot.contains("[label=\"word\"]"));
    }

    #[test]
    fn test_rejects_file_as_directory() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = DebugExporter::new()
            .with_graph_output(file.path(), &[])
            .unwrap_err();
        assert!(matches!(err, ConfigError::DebugDirectory { .. }));
    }
}
