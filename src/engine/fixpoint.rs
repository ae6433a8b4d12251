// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Fixpoint update executor.
//!
//! Each worker owns one executor and with it a private [`Dataset`] seeded
//! from the base graphs. For every assignment the executor loads the unit and
//! its context, applies the catalog in order, repeating each update until the
//! default graph stops changing or the update's iteration limit is reached,
//! and unloads the default graph as the result unit.
//!
//! # Change detection
//!
//! The primary signal is the default graph's revision counter. After the
//! iterations with index 3, 10, 25, 50, 100, 200 and 500 (0-based), a textual
//! snapshot is taken and the next check compares against it instead. On such
//! a check the revision seen is not advanced, so mutations from that
//! iteration still count towards the check after it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::consts::{CHECKPOINTS, HARD_ITERATION_CAP};
use crate::config::{UpdateCatalog, UpdateSpec};
use crate::engine::debug_export::{DebugExporter, DebugSelection, SnapshotLabel, INIT_SNAPSHOT};
use crate::engine::stats::UpdateStatistics;
use crate::engine::window::Assignment;
use crate::errors::{UpdateError, WorkerError};
use crate::graph::{BaseGraphStore, Dataset, GraphName, Unit, LOOKAHEAD_GRAPH, LOOKBACK_GRAPH};
use crate::observability::messages::worker::{IterationCapReached, UpdateExecutionFailed};
use crate::observability::messages::StructuredLog;

/// State shared read-only by every worker.
#[derive(Debug, Clone)]
pub struct SharedContext {
    pub catalog: Arc<UpdateCatalog>,
    pub base: Arc<BaseGraphStore>,
    pub stats: Arc<UpdateStatistics>,
    pub debug: Option<Arc<DebugExporter>>,
}

impl SharedContext {
    pub fn new(catalog: UpdateCatalog, base: BaseGraphStore) -> Self {
        let stats = UpdateStatistics::new(catalog.len());
        Self {
            catalog: Arc::new(catalog),
            base: Arc::new(base),
            stats: Arc::new(stats),
            debug: None,
        }
    }
}

/// Outcome of running one update to its fixpoint or limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateRun {
    pub iterations: u32,
    pub elapsed: Duration,
    /// Whether the last check still saw a change.
    pub changed: bool,
}

pub struct FixpointExecutor {
    worker_id: usize,
    context: SharedContext,
    dataset: Dataset,
}

impl FixpointExecutor {
    pub fn new(worker_id: usize, context: SharedContext) -> Self {
        let dataset = Dataset::seeded_from(&context.base);
        Self {
            worker_id,
            context,
            dataset,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Run the whole catalog on one assignment.
    pub fn process(&mut self, assignment: &Assignment) -> Result<Unit, WorkerError> {
        let unit_id = assignment.unit.id();
        self.load(assignment).map_err(|source| WorkerError::Load {
            slot: self.worker_id,
            unit_id: unit_id.clone(),
            source,
        })?;

        let selection = self
            .context
            .debug
            .as_ref()
            .map(|debug| debug.selection(&unit_id))
            .unwrap_or_default();
        if let (true, Some(debug)) = (selection.any(), &self.context.debug) {
            debug.export(
                selection,
                self.dataset.default_graph(),
                &unit_id,
                SnapshotLabel::INIT,
                INIT_SNAPSHOT,
                None,
            );
        }

        let catalog = Arc::clone(&self.context.catalog);
        for (index, spec) in catalog.iter().enumerate() {
            let run = self.run_update(index, spec, &unit_id, selection);
            self.context.stats.record(index, run.iterations, run.elapsed);
        }
        Ok(self.unload())
    }

    /// Empty every working graph, keeping the base graphs.
    pub fn reset(&mut self) {
        self.dataset.clear_working_graphs();
    }

    fn load(&mut self, assignment: &Assignment) -> Result<(), UpdateError> {
        self.reset();
        let lookback = self.dataset.graph_mut(&GraphName::named(LOOKBACK_GRAPH))?;
        for unit in &assignment.lookback {
            lookback.extend_from(unit.graph());
        }
        let lookahead = self.dataset.graph_mut(&GraphName::named(LOOKAHEAD_GRAPH))?;
        for unit in &assignment.lookahead {
            lookahead.extend_from(unit.graph());
        }
        self.dataset
            .default_graph_mut()
            .extend_from(assignment.unit.graph());
        Ok(())
    }

    fn unload(&mut self) -> Unit {
        let result = self.dataset.default_graph().clone();
        self.reset();
        Unit::new(result)
    }

    /// Apply one update repeatedly until nothing changes or its limit is hit.
    ///
    /// `index` is the 0-based catalog position. A failing execution is logged
    /// and counts as an iteration.
    pub fn run_update(
        &mut self,
        index: usize,
        spec: &UpdateSpec,
        unit_id: &str,
        selection: DebugSelection,
    ) -> UpdateRun {
        let limit = spec.limit().resolve();
        let started = Instant::now();
        let mut iterations = 0u32;
        let mut changed = true;
        let mut seen = self.dataset.default_graph().revision();
        let mut checkpoint: Option<String> = None;

        while changed && iterations < limit {
            let iteration = iterations + 1;
            let outcome = if selection.any() {
                self.execute_stepwise(index, spec, unit_id, iteration, selection)
            } else {
                spec.update().execute(&mut self.dataset)
            };
            if let Err(error) = outcome {
                UpdateExecutionFailed {
                    update: spec.name(),
                    unit_id,
                    iteration,
                    error: &error,
                }
                .log();
            }

            let graph = self.dataset.default_graph();
            changed = match checkpoint.take() {
                Some(snapshot) => graph.snapshot() != snapshot,
                None => {
                    let moved = graph.revision() != seen;
                    seen = graph.revision();
                    moved
                }
            };
            if CHECKPOINTS.contains(&iterations) {
                checkpoint = Some(graph.snapshot());
            }
            iterations = iteration;
        }

        if changed && iterations >= HARD_ITERATION_CAP {
            IterationCapReached {
                update: spec.name(),
                unit_id,
                limit: iterations,
            }
            .log();
        }
        UpdateRun {
            iterations,
            elapsed: started.elapsed(),
            changed,
        }
    }

    /// One iteration, operation by operation, writing a snapshot after every
    /// operation that changed the default graph relative to the iteration start.
    fn execute_stepwise(
        &mut self,
        index: usize,
        spec: &UpdateSpec,
        unit_id: &str,
        iteration: u32,
        selection: DebugSelection,
    ) -> Result<(), UpdateError> {
        let before = self.dataset.default_graph().snapshot();
        let mut seen = self.dataset.default_graph().revision();
        let update = spec.update();
        for step in 0..update.step_count() {
            update.execute_step(step, &mut self.dataset)?;
            let graph = self.dataset.default_graph();
            if graph.revision() == seen {
                continue;
            }
            seen = graph.revision();
            if graph.snapshot() == before {
                continue;
            }
            if let Some(debug) = &self.context.debug {
                let operation = update.describe_step(step);
                debug.export(
                    selection,
                    graph,
                    unit_id,
                    SnapshotLabel {
                        update: index + 1,
                        iteration,
                        step: step + 1,
                    },
                    spec.name(),
                    Some(&operation),
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IterationLimit, UpdateSpec};
    use crate::graph::{Graph, Term, Triple};
    use std::sync::Mutex;

    fn iri(value: &str) -> Term {
        Term::iri(value)
    }

    fn executor_for(specs: Vec<UpdateSpec>) -> FixpointExecutor {
        let mut catalog = UpdateCatalog::new();
        for spec in specs {
            catalog.push(spec);
        }
        FixpointExecutor::new(0, SharedContext::new(catalog, BaseGraphStore::new()))
    }

    fn assignment(graph: Graph) -> Assignment {
        Assignment {
            seq: 0,
            unit: Unit::new(graph),
            lookback: Vec::new(),
            lookahead: Vec::new(),
        }
    }

    fn spec(script: &str, limit: IterationLimit) -> UpdateSpec {
        UpdateSpec::parse("test", script, limit).unwrap()
    }

    #[test]
    fn test_stabilizing_update_stops_after_last_change() {
        let counter = spec(
            "DELETE { <c> <n> ?a } INSERT { <c> <n> ?b } WHERE { <c> <n> ?a . ?a <next> ?b }",
            IterationLimit::Unbounded,
        );
        let mut executor = executor_for(vec![]);
        for (s, p, o) in [("c", "n", "s0"), ("s0", "next", "s1"), ("s1", "next", "s2"), ("s2", "next", "s3")] {
            executor
                .dataset
                .default_graph_mut()
                .insert(Triple::new(iri(s), iri(p), iri(o)));
        }

        let run = executor.run_update(0, &counter, "none", DebugSelection::default());
        assert_eq!(run.iterations, 4);
        assert!(!run.changed);
        assert!(executor
            .dataset()
            .default_graph()
            .contains(&Triple::new(iri("c"), iri("n"), iri("s3"))));
    }

    #[test]
    fn test_unbounded_update_stops_at_hard_cap() {
        let grow = spec("INSERT { _:b <p> <o> } WHERE { }", IterationLimit::Unbounded);
        let mut executor = executor_for(vec![]);
        let run = executor.run_update(0, &grow, "none", DebugSelection::default());
        assert_eq!(run.iterations, HARD_ITERATION_CAP);
        assert!(run.changed);
        assert_eq!(
            executor.dataset().default_graph().len(),
            HARD_ITERATION_CAP as usize
        );
    }

    /// Collects formatted log output for assertions.
    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl CapturedLog {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLog {
        type Writer = CapturedLog;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn run_logged(spec: &UpdateSpec) -> (UpdateRun, String) {
        let log = CapturedLog::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(log.clone())
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .finish();
        let mut executor = executor_for(vec![]);
        let run = tracing::subscriber::with_default(subscriber, || {
            executor.run_update(0, spec, "s7", DebugSelection::default())
        });
        (run, log.contents())
    }

    #[test]
    fn test_cap_warning_only_when_still_changing_at_cap() {
        let grow = spec("INSERT { _:b <p> <o> } WHERE { }", IterationLimit::Unbounded);
        let (run, output) = run_logged(&grow);
        assert_eq!(run.iterations, HARD_ITERATION_CAP);
        assert!(output.contains("WARN"));
        assert!(output.contains("on unit 's7' reached its limit of 999 iterations"));

        let short = spec("INSERT { _:b <p> <o> } WHERE { }", IterationLimit::Count(5));
        let (run, output) = run_logged(&short);
        assert_eq!(run.iterations, 5);
        assert!(run.changed);
        assert!(!output.contains("reached its limit"));

        let stable = spec("INSERT { <a> <p> <o> } WHERE { }", IterationLimit::Unbounded);
        let (run, output) = run_logged(&stable);
        assert!(!run.changed);
        assert!(output.is_empty());
    }

    #[test]
    fn test_explicit_limit_above_cap_is_clamped() {
        let grow = spec("INSERT { _:b <p> <o> } WHERE { }", IterationLimit::Count(5000));
        let mut executor = executor_for(vec![]);
        let run = executor.run_update(0, &grow, "none", DebugSelection::default());
        assert_eq!(run.iterations, HARD_ITERATION_CAP);
    }

    #[test]
    fn test_checkpoint_snapshot_overrides_revision() {
        // Every iteration removes and re-adds the same triple: the revision
        // moves but the content never does.
        let churn = spec(
            "DELETE { <a> <p> <b> } INSERT { <a> <p> <b> } WHERE { <a> <p> <b> }",
            IterationLimit::Unbounded,
        );
        let mut executor = executor_for(vec![]);
        executor
            .dataset
            .default_graph_mut()
            .insert(Triple::new(iri("a"), iri("p"), iri("b")));

        let run = executor.run_update(0, &churn, "none", DebugSelection::default());
        assert_eq!(run.iterations, 5);
        assert!(!run.changed);
    }

    #[test]
    fn test_failing_operation_is_logged_and_unit_survives() {
        let mut base = BaseGraphStore::new();
        base.insert("http://base", Graph::new());
        let mut catalog = UpdateCatalog::new();
        catalog.push(spec(
            "INSERT DATA { GRAPH <http://base> { <x> <p> <y> } }",
            IterationLimit::Count(3),
        ));
        catalog.push(spec("INSERT DATA { <x> <p> <z> }", IterationLimit::Count(3)));
        let context = SharedContext::new(catalog, base);
        let stats = Arc::clone(&context.stats);
        let mut executor = FixpointExecutor::new(0, context);

        let mut graph = Graph::new();
        graph.insert(Triple::new(iri("s"), iri("p"), iri("o")));
        let unit = executor.process(&assignment(graph)).unwrap();

        assert_eq!(unit.len(), 2);
        let totals = stats.snapshot();
        assert_eq!(totals[0].iterations, 1);
        assert_eq!(totals[1].iterations, 2);
    }

    #[test]
    fn test_process_loads_context_and_clears_afterwards() {
        let copy_context = spec(
            "INSERT { ?s <from> \"back\" } WHERE { GRAPH <https://github.com/acoli-repo/conll-rdf/lookback> { ?s ?p ?o } } ;\
             INSERT { ?s <from> \"ahead\" } WHERE { GRAPH <https://github.com/acoli-repo/conll-rdf/lookahead> { ?s ?p ?o } }",
            IterationLimit::Count(1),
        );
        let mut executor = executor_for(vec![copy_context]);
        let single = |s: &str| {
            let mut graph = Graph::new();
            graph.insert(Triple::new(iri(s), iri("p"), iri("o")));
            Unit::new(graph)
        };
        let result = executor
            .process(&Assignment {
                seq: 1,
                unit: single("current"),
                lookback: vec![single("before")],
                lookahead: vec![single("after")],
            })
            .unwrap();

        assert!(result
            .graph()
            .contains(&Triple::new(iri("before"), iri("from"), Term::literal("back"))));
        assert!(result
            .graph()
            .contains(&Triple::new(iri("after"), iri("from"), Term::literal("ahead"))));
        assert!(executor.dataset().default_graph().is_empty());
        assert!(executor
            .dataset()
            .graph(&GraphName::named(LOOKBACK_GRAPH))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_stepwise_debug_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = DebugExporter::new()
            .with_triple_output(dir.path(), &["s1".to_string()])
            .unwrap();
        let mut catalog = UpdateCatalog::new();
        catalog.push(spec(
            "INSERT DATA { <x> <p> <y> } ; INSERT DATA { <x> <p> <y> } ; INSERT DATA { <x> <p> <z> }",
            IterationLimit::Count(1),
        ));
        let mut context = SharedContext::new(catalog, BaseGraphStore::new());
        context.debug = Some(Arc::new(exporter));
        let mut executor = FixpointExecutor::new(0, context);

        let mut graph = Graph::new();
        graph.insert(Triple::new(
            iri("http://ex.org/s1"),
            iri(crate::graph::RDF_TYPE),
            iri(crate::graph::NIF_SENTENCE),
        ));
        executor.process(&assignment(graph)).unwrap();

        let mut files: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        files.sort();
        assert_eq!(
            files,
            vec![
                "s1__U000_I0000_S000__INIT.nt",
                "s1__U001_I0001_S001__test.nt",
                "s1__U001_I0001_S003__test.nt",
            ]
        );
    }
}
