// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::ast::{
    ClearTarget, Group, GroupElement, PathPattern, PatternTerm, PropertyPath, QuadPattern,
    TriplePattern, UpdateOperation, VarOrGraph,
};
use super::expression::{self, Scope};
use crate::errors::UpdateError;
use crate::graph::{Dataset, Graph, GraphName, Term, Triple};

pub(super) type Solution = BTreeMap<String, Term>;

/// Upper bound on intermediate solutions for a single pattern.
const MAX_SOLUTIONS: usize = 1_000_000;

pub(super) fn apply(operation: &UpdateOperation, dataset: &mut Dataset) -> Result<(), UpdateError> {
    match operation {
        UpdateOperation::InsertData(quads) => {
            let inserts = instantiate(quads, &[Solution::new()]);
            insert_all(dataset, inserts)
        }
        UpdateOperation::DeleteData(quads) => {
            let deletes = instantiate(quads, &[Solution::new()]);
            delete_all(dataset, deletes)
        }
        UpdateOperation::DeleteWhere(quads) => {
            let pattern = quads_as_group(quads);
            let solutions = evaluate(&pattern, dataset, &GraphName::Default, vec![Solution::new()])?;
            let deletes = instantiate(quads, &solutions);
            delete_all(dataset, deletes)
        }
        UpdateOperation::Modify {
            delete,
            insert,
            pattern,
        } => {
            let solutions = evaluate(pattern, dataset, &GraphName::Default, vec![Solution::new()])?;
            let deletes = instantiate(delete, &solutions);
            let inserts = instantiate(insert, &solutions);
            delete_all(dataset, deletes)?;
            insert_all(dataset, inserts)
        }
        UpdateOperation::Clear { target, silent } => clear(dataset, target, *silent),
    }
}

fn quads_as_group(quads: &[QuadPattern]) -> Group {
    let elements = quads
        .iter()
        .map(|quad| match &quad.graph {
            VarOrGraph::Default => GroupElement::Triple(quad.triple.clone()),
            graph => GroupElement::Graph {
                graph: graph.clone(),
                group: Group {
                    elements: vec![GroupElement::Triple(quad.triple.clone())],
                },
            },
        })
        .collect();
    Group { elements }
}

pub(super) fn evaluate(
    group: &Group,
    dataset: &Dataset,
    active: &GraphName,
    input: Vec<Solution>,
) -> Result<Vec<Solution>, UpdateError> {
    let mut solutions = input;
    let mut filters = Vec::new();
    for element in &group.elements {
        solutions = match element {
            GroupElement::Triple(pattern) => match_triple(pattern, dataset.graph(active), solutions),
            GroupElement::Path(pattern) => match_path(pattern, dataset.graph(active), solutions),
            GroupElement::Graph { graph, group } => {
                evaluate_graph(graph, group, dataset, active, solutions)?
            }
            GroupElement::Group(inner) => evaluate(inner, dataset, active, solutions)?,
            GroupElement::Optional(inner) => {
                let mut results = Vec::with_capacity(solutions.len());
                for solution in solutions {
                    let extended = evaluate(inner, dataset, active, vec![solution.clone()])?;
                    if extended.is_empty() {
                        results.push(solution);
                    } else {
                        results.extend(extended);
                    }
                }
                results
            }
            GroupElement::Union(alternatives) => {
                let mut results = Vec::new();
                for alternative in alternatives {
                    results.extend(evaluate(alternative, dataset, active, solutions.clone())?);
                }
                results
            }
            GroupElement::Minus(inner) => {
                let removed = evaluate(inner, dataset, active, vec![Solution::new()])?;
                solutions
                    .into_iter()
                    .filter(|solution| !removed.iter().any(|r| compatible_and_sharing(solution, r)))
                    .collect()
            }
            GroupElement::Bind {
                expression,
                variable,
            } => {
                let mut results = Vec::with_capacity(solutions.len());
                for mut solution in solutions {
                    let bound = expression::value(
                        expression,
                        &Scope {
                            dataset,
                            active,
                            solution: &solution,
                        },
                    )?;
                    if let Some(term) = bound {
                        solution.entry(variable.clone()).or_insert(term);
                    }
                    results.push(solution);
                }
                results
            }
            GroupElement::Filter(expression) => {
                filters.push(expression);
                continue;
            }
        };
        if solutions.len() > MAX_SOLUTIONS {
            return Err(UpdateError::Failed(format!(
                "pattern produced more than {} solutions",
                MAX_SOLUTIONS
            )));
        }
        if solutions.is_empty() {
            return Ok(solutions);
        }
    }

    for filter in filters {
        let mut kept = Vec::with_capacity(solutions.len());
        for solution in solutions {
            let scope = Scope {
                dataset,
                active,
                solution: &solution,
            };
            if expression::truth(filter, &scope)? == Some(true) {
                kept.push(solution);
            }
        }
        solutions = kept;
    }
    Ok(solutions)
}

/// `MINUS` removes a solution only when it agrees with a removed one on at
/// least one shared variable.
fn compatible_and_sharing(solution: &Solution, removed: &Solution) -> bool {
    let mut shared = false;
    for (name, term) in removed {
        if let Some(existing) = solution.get(name) {
            if existing != term {
                return false;
            }
            shared = true;
        }
    }
    shared
}

fn evaluate_graph(
    graph: &VarOrGraph,
    group: &Group,
    dataset: &Dataset,
    active: &GraphName,
    solutions: Vec<Solution>,
) -> Result<Vec<Solution>, UpdateError> {
    match graph {
        VarOrGraph::Default => evaluate(group, dataset, active, solutions),
        VarOrGraph::Named(iri) => evaluate(group, dataset, &GraphName::named(iri.clone()), solutions),
        VarOrGraph::Variable(variable) => {
            let mut results = Vec::new();
            for solution in solutions {
                match solution.get(variable) {
                    Some(Term::Iri(iri)) => {
                        let name = GraphName::named(iri.clone());
                        results.extend(evaluate(group, dataset, &name, vec![solution])?);
                    }
                    Some(_) => {}
                    None => {
                        for (name, _) in dataset.named_graphs() {
                            let mut bound = solution.clone();
                            bound.insert(variable.clone(), Term::iri(name));
                            results.extend(evaluate(
                                group,
                                dataset,
                                &GraphName::named(name),
                                vec![bound],
                            )?);
                        }
                    }
                }
            }
            Ok(results)
        }
    }
}

fn resolve<'a>(term: &'a PatternTerm, solution: &'a Solution) -> Option<&'a Term> {
    match term {
        PatternTerm::Term(term) => Some(term),
        PatternTerm::Variable(name) => solution.get(name),
        PatternTerm::Blank(_) => None,
    }
}

/// Bind `term` to a pattern position, failing on a conflicting earlier binding.
fn bind(solution: &mut Solution, position: &PatternTerm, term: &Term) -> bool {
    match position {
        PatternTerm::Variable(name) => match solution.get(name) {
            Some(existing) => existing == term,
            None => {
                solution.insert(name.clone(), term.clone());
                true
            }
        },
        _ => true,
    }
}

fn match_triple(
    pattern: &TriplePattern,
    graph: Option<&Graph>,
    solutions: Vec<Solution>,
) -> Vec<Solution> {
    let Some(graph) = graph else {
        return Vec::new();
    };
    let mut results = Vec::new();
    for solution in &solutions {
        let subject = resolve(&pattern.subject, solution);
        let predicate = resolve(&pattern.predicate, solution);
        let object = resolve(&pattern.object, solution);
        for triple in graph.matching(subject, predicate, object) {
            let mut extended = solution.clone();
            if bind(&mut extended, &pattern.subject, &triple.subject)
                && bind(&mut extended, &pattern.predicate, &triple.predicate)
                && bind(&mut extended, &pattern.object, &triple.object)
            {
                results.push(extended);
            }
        }
    }
    results
}

fn match_path(
    pattern: &PathPattern,
    graph: Option<&Graph>,
    solutions: Vec<Solution>,
) -> Vec<Solution> {
    let Some(graph) = graph else {
        return Vec::new();
    };
    let mut results = Vec::new();
    for solution in &solutions {
        let subject = resolve(&pattern.subject, solution);
        let object = resolve(&pattern.object, solution);
        for (start, end) in path_pairs(&pattern.path, graph, subject, object) {
            let mut extended = solution.clone();
            if bind(&mut extended, &pattern.subject, &start)
                && bind(&mut extended, &pattern.object, &end)
            {
                results.push(extended);
            }
        }
    }
    results
}

type Pairs = BTreeSet<(Term, Term)>;

/// Every `(start, end)` connected by `path`, restricted to the bound ends.
fn path_pairs(path: &PropertyPath, graph: &Graph, start: Option<&Term>, end: Option<&Term>) -> Pairs {
    match path {
        PropertyPath::Iri(predicate) => graph
            .matching(start, Some(predicate), end)
            .map(|t| (t.subject.clone(), t.object.clone()))
            .collect(),
        PropertyPath::Inverse(inner) => path_pairs(inner, graph, end, start)
            .into_iter()
            .map(|(a, b)| (b, a))
            .collect(),
        PropertyPath::Sequence(first, second) => {
            let mut pairs = Pairs::new();
            if start.is_none() && end.is_some() {
                for (middle, last) in path_pairs(second, graph, None, end) {
                    for (head, _) in path_pairs(first, graph, None, Some(&middle)) {
                        pairs.insert((head, last.clone()));
                    }
                }
            } else {
                for (head, middle) in path_pairs(first, graph, start, None) {
                    for (_, last) in path_pairs(second, graph, Some(&middle), end) {
                        pairs.insert((head.clone(), last));
                    }
                }
            }
            pairs
        }
        PropertyPath::Alternative(left, right) => {
            let mut pairs = path_pairs(left, graph, start, end);
            pairs.extend(path_pairs(right, graph, start, end));
            pairs
        }
        PropertyPath::ZeroOrOne(inner) => {
            let mut pairs = path_pairs(inner, graph, start, end);
            pairs.extend(zero_length(graph, start, end));
            pairs
        }
        PropertyPath::OneOrMore(inner) => closure(inner, graph, start, end, false),
        PropertyPath::ZeroOrMore(inner) => closure(inner, graph, start, end, true),
    }
}

fn zero_length(graph: &Graph, start: Option<&Term>, end: Option<&Term>) -> Pairs {
    match (start, end) {
        (Some(s), Some(e)) if s != e => Pairs::new(),
        (Some(node), _) | (None, Some(node)) => Pairs::from([(node.clone(), node.clone())]),
        (None, None) => nodes(graph).into_iter().map(|n| (n.clone(), n)).collect(),
    }
}

fn nodes(graph: &Graph) -> BTreeSet<Term> {
    graph
        .iter()
        .flat_map(|t| [t.subject.clone(), t.object.clone()])
        .collect()
}

fn closure(
    inner: &PropertyPath,
    graph: &Graph,
    start: Option<&Term>,
    end: Option<&Term>,
    reflexive: bool,
) -> Pairs {
    match (start, end) {
        (Some(from), _) => reach(inner, graph, from, reflexive, true)
            .into_iter()
            .filter(|reached| end.map_or(true, |e| e == reached))
            .map(|reached| (from.clone(), reached))
            .collect(),
        (None, Some(to)) => reach(inner, graph, to, reflexive, false)
            .into_iter()
            .map(|reached| (reached, to.clone()))
            .collect(),
        (None, None) => {
            let mut pairs = Pairs::new();
            for from in nodes(graph) {
                for reached in reach(inner, graph, &from, reflexive, true) {
                    pairs.insert((from.clone(), reached));
                }
            }
            pairs
        }
    }
}

/// Nodes reachable from `origin` in one or more steps (zero too if `reflexive`).
fn reach(inner: &PropertyPath, graph: &Graph, origin: &Term, reflexive: bool, forward: bool) -> BTreeSet<Term> {
    let mut reached = BTreeSet::new();
    if reflexive {
        reached.insert(origin.clone());
    }
    let mut expanded = BTreeSet::from([origin.clone()]);
    let mut frontier = vec![origin.clone()];
    while let Some(node) = frontier.pop() {
        let steps = if forward {
            path_pairs(inner, graph, Some(&node), None)
        } else {
            path_pairs(inner, graph, None, Some(&node))
        };
        for (a, b) in steps {
            let next = if forward { b } else { a };
            reached.insert(next.clone());
            if expanded.insert(next.clone()) {
                frontier.push(next);
            }
        }
    }
    reached
}

/// Ground every template quad under every solution.
///
/// Quads with an unbound variable or an invalid term position are skipped.
fn instantiate(quads: &[QuadPattern], solutions: &[Solution]) -> Vec<(GraphName, Triple)> {
    let mut ground = Vec::new();
    for solution in solutions {
        let mut blanks: HashMap<&str, Term> = HashMap::new();
        for quad in quads {
            let graph = match &quad.graph {
                VarOrGraph::Default => GraphName::Default,
                VarOrGraph::Named(iri) => GraphName::named(iri.clone()),
                VarOrGraph::Variable(variable) => match solution.get(variable) {
                    Some(Term::Iri(iri)) => GraphName::named(iri.clone()),
                    _ => continue,
                },
            };
            let mut terms = Vec::with_capacity(3);
            for position in [&quad.triple.subject, &quad.triple.predicate, &quad.triple.object] {
                let term = match position {
                    PatternTerm::Term(term) => Some(term.clone()),
                    PatternTerm::Variable(name) => solution.get(name).cloned(),
                    PatternTerm::Blank(label) => Some(
                        blanks
                            .entry(label.as_str())
                            .or_insert_with(Term::fresh_blank)
                            .clone(),
                    ),
                };
                match term {
                    Some(term) => terms.push(term),
                    None => break,
                }
            }
            if terms.len() != 3 {
                continue;
            }
            let object = terms.pop();
            let predicate = terms.pop();
            let subject = terms.pop();
            if let (Some(subject), Some(predicate), Some(object)) = (subject, predicate, object) {
                if subject.is_literal() || predicate.as_iri().is_none() {
                    continue;
                }
                ground.push((graph, Triple::new(subject, predicate, object)));
            }
        }
    }
    ground
}

fn insert_all(dataset: &mut Dataset, quads: Vec<(GraphName, Triple)>) -> Result<(), UpdateError> {
    for (graph, triple) in quads {
        dataset.graph_mut(&graph)?.insert(triple);
    }
    Ok(())
}

fn delete_all(dataset: &mut Dataset, quads: Vec<(GraphName, Triple)>) -> Result<(), UpdateError> {
    for (graph, triple) in quads {
        if dataset.graph(&graph).is_none() {
            continue;
        }
        dataset.graph_mut(&graph)?.remove(&triple);
    }
    Ok(())
}

fn clear(dataset: &mut Dataset, target: &ClearTarget, silent: bool) -> Result<(), UpdateError> {
    match target {
        ClearTarget::Default => {
            dataset.default_graph_mut().clear();
            Ok(())
        }
        ClearTarget::Named(iri) => {
            let name = GraphName::named(iri.clone());
            if dataset.graph(&name).is_none() {
                return if silent {
                    Ok(())
                } else {
                    Err(UpdateError::Failed(format!("graph <{}> does not exist", iri)))
                };
            }
            match dataset.graph_mut(&name) {
                Ok(graph) => {
                    graph.clear();
                    Ok(())
                }
                Err(_) if silent => Ok(()),
                Err(err) => Err(err),
            }
        }
        ClearTarget::AllNamed | ClearTarget::All => {
            if *target == ClearTarget::All {
                dataset.default_graph_mut().clear();
            }
            let writable: Vec<String> = dataset
                .named_graphs()
                .filter(|(name, _)| !dataset.is_read_only(name))
                .map(|(name, _)| name.to_string())
                .collect();
            for name in writable {
                dataset.graph_mut(&GraphName::Named(name))?.clear();
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{BaseGraphStore, LOOKBACK_GRAPH};
    use crate::update::{parse_update, GraphUpdate};

    fn iri(value: &str) -> Term {
        Term::iri(value)
    }

    fn run(script: &str, dataset: &mut Dataset) -> Result<(), UpdateError> {
        parse_update(script).unwrap().execute(dataset)
    }

    #[test]
    fn test_modify_moves_a_counter_one_step() {
        let mut dataset = Dataset::new();
        run(
            "INSERT DATA { <c> <n> <s0> . <s0> <next> <s1> . <s1> <next> <s2> }",
            &mut dataset,
        )
        .unwrap();
        let step = "DELETE { <c> <n> ?a } INSERT { <c> <n> ?b } WHERE { <c> <n> ?a . ?a <next> ?b }";

        run(step, &mut dataset).unwrap();
        let graph = dataset.default_graph();
        assert!(graph.contains(&Triple::new(iri("c"), iri("n"), iri("s1"))));
        assert!(!graph.contains(&Triple::new(iri("c"), iri("n"), iri("s0"))));

        run(step, &mut dataset).unwrap();
        let revision = dataset.default_graph().revision();
        run(step, &mut dataset).unwrap();
        assert_eq!(dataset.default_graph().revision(), revision);
    }

    #[test]
    fn test_graph_variable_ranges_over_named_graphs() {
        let mut dataset = Dataset::new();
        dataset
            .graph_mut(&GraphName::named(LOOKBACK_GRAPH))
            .unwrap()
            .insert(Triple::new(iri("s"), iri("p"), iri("o")));
        run(
            "INSERT { ?s <seen-in> ?g } WHERE { GRAPH ?g { ?s <p> ?o } }",
            &mut dataset,
        )
        .unwrap();
        assert!(dataset
            .default_graph()
            .contains(&Triple::new(iri("s"), iri("seen-in"), iri(LOOKBACK_GRAPH))));
    }

    #[test]
    fn test_filter_not_exists() {
        let mut dataset = Dataset::new();
        run(
            "INSERT DATA { <a> a <T> . <b> a <T> . <b> <done> true }",
            &mut dataset,
        )
        .unwrap();
        run(
            "INSERT { ?x <done> true } WHERE { ?x a <T> FILTER NOT EXISTS { ?x <done> ?any } }",
            &mut dataset,
        )
        .unwrap();
        let done_predicate = iri("done");
        let done: Vec<_> = dataset
            .default_graph()
            .matching(None, Some(&done_predicate), None)
            .collect();
        assert_eq!(done.len(), 2);
    }

    #[test]
    fn test_template_blank_nodes_are_fresh_per_solution() {
        let mut dataset = Dataset::new();
        run("INSERT DATA { <a> <p> 1 . <b> <p> 2 }", &mut dataset).unwrap();
        run("INSERT { _:n <for> ?s } WHERE { ?s <p> ?v }", &mut dataset).unwrap();
        let subjects: std::collections::BTreeSet<_> = dataset
            .default_graph()
            .matching(None, Some(&iri("for")), None)
            .map(|t| t.subject.clone())
            .collect();
        assert_eq!(subjects.len(), 2);
    }

    #[test]
    fn test_minted_blank_nodes_never_merge_with_parsed_ones() {
        let mut dataset = Dataset::new();
        let parsed = crate::io::turtle::parse_document("_:genid0 <p> <o> .\n_:genid-0 <p> <o> .").unwrap();
        dataset.default_graph_mut().extend_from(&parsed);
        run("INSERT { _:n <p> <o> } WHERE { }", &mut dataset).unwrap();
        run("INSERT { _:n <p> <o> } WHERE { }", &mut dataset).unwrap();

        let marker = iri("p");
        let subjects: std::collections::BTreeSet<_> = dataset
            .default_graph()
            .matching(None, Some(&marker), None)
            .map(|t| t.subject.clone())
            .collect();
        assert_eq!(subjects.len(), 4);
    }

    fn objects_of(dataset: &Dataset, predicate: &str) -> Vec<String> {
        let predicate = iri(predicate);
        let objects = dataset
            .default_graph()
            .matching(None, Some(&predicate), None)
            .map(|t| format!("{} {}", t.subject, t.object))
            .collect();
        objects
    }

    #[test]
    fn test_optional_keeps_unmatched_solutions() {
        let mut dataset = Dataset::new();
        run(
            "INSERT DATA { <w1> a <Word> . <w2> a <Word> . <w1> <lemma> \"cat\" }",
            &mut dataset,
        )
        .unwrap();
        run(
            "INSERT { ?w <label> ?out } WHERE { ?w a <Word> OPTIONAL { ?w <lemma> ?l } BIND(COALESCE(?l, \"?\") AS ?out) }",
            &mut dataset,
        )
        .unwrap();
        assert_eq!(
            objects_of(&dataset, "label"),
            vec!["<w1> \"cat\"", "<w2> \"?\""]
        );
    }

    #[test]
    fn test_union_and_minus() {
        let mut dataset = Dataset::new();
        run(
            "INSERT DATA { <a> a <Noun> . <b> a <Verb> . <c> a <Adj> . <b> <aux> true }",
            &mut dataset,
        )
        .unwrap();
        run(
            "INSERT { ?x <content> true } WHERE { { ?x a <Noun> } UNION { ?x a <Verb> } MINUS { ?x <aux> true } }",
            &mut dataset,
        )
        .unwrap();
        assert_eq!(
            objects_of(&dataset, "content"),
            vec!["<a> \"true\"^^<http://www.w3.org/2001/XMLSchema#boolean>"]
        );
    }

    #[test]
    fn test_filter_expressions_select_solutions() {
        let mut dataset = Dataset::new();
        run(
            "INSERT DATA { <t1> <pos> 1 . <t2> <pos> 2 . <t3> <pos> 3 . <t2> <form> \"The\"@en }",
            &mut dataset,
        )
        .unwrap();
        run(
            "INSERT { ?t <middle> true } WHERE { ?t <pos> ?n FILTER(?n > 1 && ?n * 2 < 6) }",
            &mut dataset,
        )
        .unwrap();
        run(
            "INSERT { ?t <lower> ?l } WHERE { ?t <form> ?f FILTER(LANG(?f) = \"en\") BIND(LCASE(STR(?f)) AS ?l) }",
            &mut dataset,
        )
        .unwrap();
        run(
            "INSERT { ?t <next> ?m } WHERE { ?t <pos> ?n BIND(?n+1 AS ?m) FILTER(?m <= 3) }",
            &mut dataset,
        )
        .unwrap();

        assert_eq!(
            objects_of(&dataset, "middle"),
            vec!["<t2> \"true\"^^<http://www.w3.org/2001/XMLSchema#boolean>"]
        );
        assert_eq!(objects_of(&dataset, "lower"), vec!["<t2> \"the\""]);
        assert_eq!(objects_of(&dataset, "next").len(), 2);
    }

    #[test]
    fn test_property_paths_follow_chains() {
        let mut dataset = Dataset::new();
        run(
            "INSERT DATA { <w1> <next> <w2> . <w2> <next> <w3> . <w3> <next> <w4> . <w3> <head> <w1> }",
            &mut dataset,
        )
        .unwrap();
        run("INSERT { ?a <before> ?b } WHERE { ?a <next>+ ?b }", &mut dataset).unwrap();
        assert_eq!(objects_of(&dataset, "before").len(), 6);

        run("INSERT { <w1> <reach> ?b } WHERE { <w1> <next>* ?b }", &mut dataset).unwrap();
        assert_eq!(objects_of(&dataset, "reach").len(), 4);

        // ^head: from w1 back to its dependent w3, then one step on.
        run(
            "INSERT { ?h <dep-next> ?x } WHERE { ?h ^<head>/<next> ?x }",
            &mut dataset,
        )
        .unwrap();
        assert_eq!(objects_of(&dataset, "dep-next"), vec!["<w1> <w4>"]);
    }

    #[test]
    fn test_writes_to_base_graphs_fail() {
        let mut base = BaseGraphStore::new();
        base.insert(
            "http://base",
            vec![Triple::new(iri("a"), iri("p"), iri("b"))].into_iter().collect(),
        );
        let mut dataset = Dataset::seeded_from(&base);

        let err = run(
            "INSERT DATA { GRAPH <http://base> { <x> <p> <y> } }",
            &mut dataset,
        )
        .unwrap_err();
        assert!(matches!(err, UpdateError::ReadOnlyGraph { .. }));

        run(
            "INSERT { ?s <copied> ?o } WHERE { GRAPH <http://base> { ?s <p> ?o } }",
            &mut dataset,
        )
        .unwrap();
        assert_eq!(dataset.default_graph().len(), 1);

        run("CLEAR ALL", &mut dataset).unwrap();
        assert!(dataset.default_graph().is_empty());
        assert_eq!(
            dataset.graph(&GraphName::named("http://base")).unwrap().len(),
            1
        );
        assert!(run("CLEAR GRAPH <http://base>", &mut dataset).is_err());
        assert!(run("CLEAR SILENT GRAPH <http://base>", &mut dataset).is_ok());
    }

    #[test]
    fn test_delete_where() {
        let mut dataset = Dataset::new();
        run("INSERT DATA { <a> <p> <b> . <a> <q> <c> }", &mut dataset).unwrap();
        run("DELETE WHERE { <a> <p> ?o }", &mut dataset).unwrap();
        assert_eq!(dataset.default_graph().len(), 1);
    }
}
