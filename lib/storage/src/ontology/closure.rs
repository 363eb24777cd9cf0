use mediator_model::vocab::{owl, rdfs};
use mediator_model::{Graph, NamedNode, NamedNodeRef, SubjectRef, TermRef, Triple};
use rustc_hash::{FxHashMap, FxHashSet};

/// Adds the inferred triples of the supported entailment rules to `graph`.
///
/// - `rdfs:subClassOf` and `rdfs:subPropertyOf` are transitive (but not reflexive).
/// - `owl:equivalentProperty` is symmetric.
pub(super) fn materialize(graph: &mut Graph) {
    let mut inferred = Vec::new();
    for predicate in [rdfs::SUB_CLASS_OF, rdfs::SUB_PROPERTY_OF] {
        inferred.extend(transitive_closure(graph, predicate));
    }
    inferred.extend(
        named_edges(graph, owl::EQUIVALENT_PROPERTY)
            .into_iter()
            .map(|(from, to)| Triple::new(to, owl::EQUIVALENT_PROPERTY, from)),
    );

    for triple in &inferred {
        graph.insert(triple);
    }
}

fn named_edges(graph: &Graph, predicate: NamedNodeRef<'_>) -> Vec<(NamedNode, NamedNode)> {
    graph
        .triples_for_predicate(predicate)
        .filter_map(|triple| match (triple.subject, triple.object) {
            (SubjectRef::NamedNode(from), TermRef::NamedNode(to)) => {
                Some((from.into_owned(), to.into_owned()))
            }
            _ => None,
        })
        .collect()
}

fn transitive_closure(graph: &Graph, predicate: NamedNodeRef<'_>) -> Vec<Triple> {
    let mut successors: FxHashMap<NamedNode, Vec<NamedNode>> = FxHashMap::default();
    for (from, to) in named_edges(graph, predicate) {
        successors.entry(from).or_default().push(to);
    }

    let mut result = Vec::new();
    for start in successors.keys() {
        let mut visited = FxHashSet::default();
        let mut stack: Vec<&NamedNode> = successors[start].iter().collect();
        while let Some(node) = stack.pop() {
            if node == start || !visited.insert(node) {
                continue;
            }
            if let Some(next) = successors.get(node) {
                stack.extend(next);
            }
        }
        result.extend(
            visited
                .into_iter()
                .map(|node| Triple::new(start.clone(), predicate, node.clone())),
        );
    }
    result
}
