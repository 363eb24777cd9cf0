//! Evaluation of the incoming query over the working graph.
//!
//! The working graph of a query is small, so the evaluator is a straightforward in-memory
//! evaluator of the SPARQL algebra. It supports basic graph patterns, joins, optionals, unions,
//! filters, projections, DISTINCT and slices. Everything else is rejected with
//! [MediationError::Evaluation](mediator_common::MediationError::Evaluation).

mod eval;
mod expression;

use crate::results::{QueryResults, QuerySolution, QuerySolutions};
use crate::working_graph::WorkingGraph;
use eval::{Bindings, GraphEvaluator};
use mediator_common::{MediationError, MediationResult};
use mediator_model::{
    BlankNode, NamedNode, Subject, Term, TermPattern, Triple, TriplePattern, Variable,
};
use rustc_hash::{FxHashMap, FxHashSet};
use spargebra::algebra::GraphPattern;
use spargebra::Query;
use std::sync::Arc;

/// Evaluates `query` over `graph`.
///
/// The dataset of the query (`FROM` clauses) is ignored. The working graph is always the
/// default graph.
pub fn evaluate_query(query: &Query, graph: &WorkingGraph) -> MediationResult<QueryResults> {
    let evaluator = GraphEvaluator::new(graph);
    match query {
        Query::Select { pattern, .. } => {
            let variables = in_scope_variables(pattern);
            let solutions = evaluator
                .evaluate(pattern)?
                .into_iter()
                .map(|bindings| to_query_solution(&variables, bindings))
                .collect();
            Ok(QueryResults::Solutions(QuerySolutions::new(
                variables, solutions,
            )))
        }
        Query::Ask { pattern, .. } => {
            Ok(QueryResults::Boolean(!evaluator.evaluate(pattern)?.is_empty()))
        }
        Query::Construct {
            template, pattern, ..
        } => {
            let solutions = evaluator.evaluate(pattern)?;
            Ok(QueryResults::Graph(construct(template, &solutions)))
        }
        Query::Describe { .. } => Err(MediationError::Evaluation(String::from(
            "DESCRIBE queries are not supported",
        ))),
    }
}

/// Returns the visible variables of `pattern` in order of their first appearance.
fn in_scope_variables(pattern: &GraphPattern) -> Arc<[Variable]> {
    let mut seen = FxHashSet::default();
    let mut variables = Vec::new();
    pattern.on_in_scope_variable(|variable| {
        if seen.insert(variable.clone()) {
            variables.push(variable.clone());
        }
    });
    variables.into()
}

fn to_query_solution(variables: &Arc<[Variable]>, mut bindings: Bindings) -> QuerySolution {
    let values = variables
        .iter()
        .map(|variable| bindings.remove(variable))
        .collect::<Vec<_>>();
    QuerySolution::from((Arc::clone(variables), values))
}

/// Instantiates the CONSTRUCT template for every solution.
///
/// Blank nodes of the template are fresh for every solution. Instantiations that are not valid
/// triples (e.g. unbound variables, literals as subjects) are skipped.
fn construct(template: &[TriplePattern], solutions: &[Bindings]) -> Vec<Triple> {
    let mut emitted = FxHashSet::default();
    let mut triples = Vec::new();
    for solution in solutions {
        let mut bnodes = FxHashMap::default();
        for pattern in template {
            let subject: Option<Subject> = instantiate(&pattern.subject, solution, &mut bnodes)
                .and_then(|term| term.try_into().ok());
            let predicate: Option<NamedNode> =
                instantiate(&pattern.predicate.clone().into(), solution, &mut bnodes)
                    .and_then(|term| term.try_into().ok());
            let object = instantiate(&pattern.object, solution, &mut bnodes);
            if let (Some(subject), Some(predicate), Some(object)) = (subject, predicate, object) {
                let triple = Triple::new(subject, predicate, object);
                if emitted.insert(triple.clone()) {
                    triples.push(triple);
                }
            }
        }
    }
    triples
}

fn instantiate(
    pattern: &TermPattern,
    solution: &Bindings,
    bnodes: &mut FxHashMap<BlankNode, BlankNode>,
) -> Option<Term> {
    match pattern {
        TermPattern::NamedNode(node) => Some(node.clone().into()),
        TermPattern::Literal(literal) => Some(literal.clone().into()),
        TermPattern::BlankNode(bnode) => Some(
            bnodes
                .entry(bnode.clone())
                .or_insert_with(BlankNode::default)
                .clone()
                .into(),
        ),
        TermPattern::Variable(variable) => solution.get(variable).cloned(),
        #[allow(unreachable_patterns, reason = "Only reachable with the rdf-star feature")]
        _ => None,
    }
}
