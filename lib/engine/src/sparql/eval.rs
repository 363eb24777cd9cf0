use crate::sparql::expression::effective_boolean_value;
use crate::working_graph::WorkingGraph;
use mediator_common::{MediationError, MediationResult};
use mediator_model::{
    BlankNode, NamedNodePattern, Subject, Term, TermPattern, TermRef, TripleRef, TriplePattern,
    Variable,
};
use rustc_hash::{FxHashMap, FxHashSet};
use spargebra::algebra::{Expression, GraphPattern};

/// A solution mapping. Blank nodes of the query are bound like variables under a name that
/// cannot clash with a SPARQL variable.
pub(super) type Bindings = FxHashMap<Variable, Term>;

/// Evaluates graph patterns over a [WorkingGraph].
pub(super) struct GraphEvaluator<'a> {
    graph: &'a WorkingGraph,
}

impl<'a> GraphEvaluator<'a> {
    pub(super) fn new(graph: &'a WorkingGraph) -> Self {
        Self { graph }
    }

    pub(super) fn evaluate(&self, pattern: &GraphPattern) -> MediationResult<Vec<Bindings>> {
        match pattern {
            GraphPattern::Bgp { patterns } => Ok(self.evaluate_bgp(patterns)),
            GraphPattern::Join { left, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                Ok(join(&left, &right))
            }
            GraphPattern::LeftJoin {
                left,
                right,
                expression,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                left_join(left, &right, expression.as_ref())
            }
            GraphPattern::Union { left, right } => {
                let mut solutions = self.evaluate(left)?;
                solutions.extend(self.evaluate(right)?);
                Ok(solutions)
            }
            GraphPattern::Filter { expr, inner } => {
                let mut solutions = Vec::new();
                for solution in self.evaluate(inner)? {
                    if effective_boolean_value(expr, &solution)? {
                        solutions.push(solution);
                    }
                }
                Ok(solutions)
            }
            GraphPattern::Project { inner, variables } => {
                let mut solutions = self.evaluate(inner)?;
                for solution in &mut solutions {
                    solution.retain(|variable, _| variables.contains(variable));
                }
                Ok(solutions)
            }
            GraphPattern::Distinct { inner } | GraphPattern::Reduced { inner } => {
                Ok(distinct(self.evaluate(inner)?))
            }
            GraphPattern::Slice {
                inner,
                start,
                length,
            } => {
                let solutions = self.evaluate(inner)?.into_iter().skip(*start);
                Ok(match length {
                    Some(length) => solutions.take(*length).collect(),
                    None => solutions.collect(),
                })
            }
            // The working graph has no named graphs.
            GraphPattern::Graph { .. } => Ok(Vec::new()),
            GraphPattern::Path { .. } => unsupported("property paths"),
            GraphPattern::Minus { .. } => unsupported("MINUS"),
            GraphPattern::Values { .. } => unsupported("VALUES"),
            GraphPattern::OrderBy { .. } => unsupported("ORDER BY"),
            GraphPattern::Extend { .. } => unsupported("BIND"),
            GraphPattern::Group { .. } => unsupported("GROUP BY"),
            GraphPattern::Service { .. } => unsupported("SERVICE"),
            #[allow(unreachable_patterns, reason = "Only reachable with the sep-0006 feature")]
            _ => unsupported("LATERAL"),
        }
    }

    fn evaluate_bgp(&self, patterns: &[TriplePattern]) -> Vec<Bindings> {
        let mut solutions = vec![Bindings::default()];
        for pattern in patterns {
            let mut extended = Vec::new();
            for solution in &solutions {
                extended.extend(
                    self.candidates(pattern, solution)
                        .into_iter()
                        .filter_map(|triple| match_triple(pattern, triple, solution)),
                );
            }
            solutions = extended;
            if solutions.is_empty() {
                break;
            }
        }
        solutions
    }

    /// Returns the triples that may match `pattern` under `solution`, using the indexes of the
    /// graph when the subject or the predicate is known.
    fn candidates(&self, pattern: &TriplePattern, solution: &Bindings) -> Vec<TripleRef<'a>> {
        let graph = self.graph.graph();
        let subject = match &pattern.subject {
            TermPattern::NamedNode(node) => Some(Subject::from(node.clone())),
            TermPattern::Variable(variable) => match solution.get(variable) {
                Some(Term::NamedNode(node)) => Some(node.clone().into()),
                Some(Term::BlankNode(bnode)) => Some(bnode.clone().into()),
                Some(_) => return Vec::new(),
                None => None,
            },
            _ => None,
        };
        if let Some(subject) = subject {
            return graph
                .triples_for_subject(&subject)
                .collect::<Vec<_>>();
        }
        if let NamedNodePattern::NamedNode(predicate) = &pattern.predicate {
            return graph.triples_for_predicate(predicate).collect();
        }
        self.graph.iter().collect()
    }
}

fn unsupported<T>(feature: &str) -> MediationResult<T> {
    Err(MediationError::Evaluation(format!(
        "{feature} is not supported"
    )))
}

fn match_triple(
    pattern: &TriplePattern,
    triple: TripleRef<'_>,
    solution: &Bindings,
) -> Option<Bindings> {
    let mut bindings = solution.clone();
    let matches = bind_term(&pattern.subject, triple.subject.into(), &mut bindings)
        && bind_predicate(&pattern.predicate, triple.predicate.into(), &mut bindings)
        && bind_term(&pattern.object, triple.object, &mut bindings);
    matches.then_some(bindings)
}

fn bind_term(pattern: &TermPattern, value: TermRef<'_>, bindings: &mut Bindings) -> bool {
    match pattern {
        TermPattern::NamedNode(node) => TermRef::from(node.as_ref()) == value,
        TermPattern::Literal(literal) => TermRef::from(literal.as_ref()) == value,
        TermPattern::Variable(variable) => bind_variable(variable, value, bindings),
        TermPattern::BlankNode(bnode) => {
            bind_variable(&blank_node_variable(bnode), value, bindings)
        }
        #[allow(unreachable_patterns, reason = "Only reachable with the rdf-star feature")]
        _ => false,
    }
}

fn bind_predicate(pattern: &NamedNodePattern, value: TermRef<'_>, bindings: &mut Bindings) -> bool {
    match pattern {
        NamedNodePattern::NamedNode(node) => TermRef::from(node.as_ref()) == value,
        NamedNodePattern::Variable(variable) => bind_variable(variable, value, bindings),
    }
}

fn bind_variable(variable: &Variable, value: TermRef<'_>, bindings: &mut Bindings) -> bool {
    match bindings.get(variable) {
        Some(bound) => bound.as_ref() == value,
        None => {
            bindings.insert(variable.clone(), value.into_owned());
            true
        }
    }
}

fn blank_node_variable(bnode: &BlankNode) -> Variable {
    Variable::new_unchecked(format!("_:{}", bnode.as_str()))
}

/// Returns `true` if the variables shared by both solutions are bound to the same terms.
fn compatible(left: &Bindings, right: &Bindings) -> bool {
    right
        .iter()
        .all(|(variable, term)| left.get(variable).map_or(true, |bound| bound == term))
}

fn merge(left: &Bindings, right: &Bindings) -> Bindings {
    let mut merged = left.clone();
    merged.extend(right.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

fn join(left: &[Bindings], right: &[Bindings]) -> Vec<Bindings> {
    let mut solutions = Vec::new();
    for l in left {
        for r in right {
            if compatible(l, r) {
                solutions.push(merge(l, r));
            }
        }
    }
    solutions
}

fn left_join(
    left: Vec<Bindings>,
    right: &[Bindings],
    expression: Option<&Expression>,
) -> MediationResult<Vec<Bindings>> {
    let mut solutions = Vec::new();
    for l in left {
        let mut matched = false;
        for r in right.iter().filter(|r| compatible(&l, r)) {
            let merged = merge(&l, r);
            if let Some(expression) = expression {
                if !effective_boolean_value(expression, &merged)? {
                    continue;
                }
            }
            matched = true;
            solutions.push(merged);
        }
        if !matched {
            solutions.push(l);
        }
    }
    Ok(solutions)
}

fn distinct(solutions: Vec<Bindings>) -> Vec<Bindings> {
    let mut seen = FxHashSet::default();
    solutions
        .into_iter()
        .filter(|solution| {
            let mut key = solution
                .iter()
                .map(|(variable, term)| (variable.as_str().to_owned(), term.to_string()))
                .collect::<Vec<_>>();
            key.sort();
            seen.insert(key)
        })
        .collect()
}
