use mediator_model::{Graph, NamedNodeRef, TermRef, Triple, TripleRef};
use tracing::trace;

/// The per-query set of triples the incoming query is evaluated against.
///
/// A working graph is created for a single query execution and discarded afterward.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WorkingGraph {
    graph: Graph,
}

impl WorkingGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a triple. Returns `true` if the triple was not already contained.
    pub fn assert<'a>(&mut self, triple: impl Into<TripleRef<'a>>) -> bool {
        let triple = triple.into();
        let inserted = self.graph.insert(triple);
        if inserted {
            trace!(%triple, "Asserted triple");
        }
        inserted
    }

    pub fn contains<'a>(&self, triple: impl Into<TripleRef<'a>>) -> bool {
        self.graph.contains(triple)
    }

    /// Returns all triples with the given predicate and object.
    pub fn triples_with_predicate_object<'a>(
        &'a self,
        predicate: impl Into<NamedNodeRef<'a>>,
        object: impl Into<TermRef<'a>>,
    ) -> impl Iterator<Item = TripleRef<'a>> + 'a {
        let predicate = predicate.into();
        let object = object.into();
        self.graph
            .subjects_for_predicate_object(predicate, object)
            .map(move |subject| TripleRef::new(subject, predicate, object))
    }

    pub fn iter(&self) -> impl Iterator<Item = TripleRef<'_>> {
        self.graph.iter()
    }

    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    /// Returns the underlying graph.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Returns an owned copy of all triples.
    pub fn to_triples(&self) -> Vec<Triple> {
        self.graph.iter().map(TripleRef::into_owned).collect()
    }
}

impl Extend<Triple> for WorkingGraph {
    fn extend<I: IntoIterator<Item = Triple>>(&mut self, iter: I) {
        for triple in iter {
            self.assert(&triple);
        }
    }
}

impl FromIterator<Triple> for WorkingGraph {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        let mut graph = Self::new();
        graph.extend(iter);
        graph
    }
}
