use mediator_common::{MediationError, MediationResult};
use mediator_model::{
    LiteralRef, NamedNode, NamedNodePattern, NamedNodeRef, Term, TermPattern, Triple,
    TriplePattern, Variable,
};

/// A position of a triple pattern, as seen by the resolver.
///
/// Blank nodes of the query are treated as variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum PatternTerm<'a> {
    Variable,
    Iri(NamedNodeRef<'a>),
    Literal(LiteralRef<'a>),
}

impl<'a> PatternTerm<'a> {
    pub(super) fn from_term(term: &'a TermPattern) -> MediationResult<Self> {
        match term {
            TermPattern::NamedNode(node) => Ok(Self::Iri(node.as_ref())),
            TermPattern::Literal(literal) => Ok(Self::Literal(literal.as_ref())),
            TermPattern::Variable(_) | TermPattern::BlankNode(_) => Ok(Self::Variable),
            #[allow(unreachable_patterns, reason = "Only reachable with the rdf-star feature")]
            _ => MediationError::not_supported(format!("the quoted triple {term}")),
        }
    }

    pub(super) fn from_predicate(predicate: &'a NamedNodePattern) -> Self {
        match predicate {
            NamedNodePattern::NamedNode(node) => Self::Iri(node.as_ref()),
            NamedNodePattern::Variable(_) => Self::Variable,
        }
    }

    pub(super) fn iri(self) -> Option<NamedNodeRef<'a>> {
        match self {
            Self::Iri(node) => Some(node),
            _ => None,
        }
    }
}

/// The synthetic pattern `?subj <property> object` that resolves a federated triple pattern
/// against one equivalent source property.
#[derive(Debug, Clone)]
pub(super) struct SubQuery {
    pattern: TriplePattern,
}

impl SubQuery {
    pub(super) fn new(property: NamedNode, object: TermPattern) -> Self {
        Self {
            pattern: TriplePattern {
                subject: Variable::new_unchecked("subj").into(),
                predicate: property.into(),
                object,
            },
        }
    }

    pub(super) fn pattern(&self) -> &TriplePattern {
        &self.pattern
    }

    /// Returns the rows of the sub-query, i.e., the triples of `derived` that match the pattern.
    ///
    /// Literals are compared by their lexical value, as sources type their literals.
    pub(super) fn rows<'a>(&'a self, derived: &'a [Triple]) -> impl Iterator<Item = &'a Triple> + 'a {
        derived.iter().filter(|triple| {
            let predicate_matches = match &self.pattern.predicate {
                NamedNodePattern::NamedNode(predicate) => *predicate == triple.predicate,
                NamedNodePattern::Variable(_) => true,
            };
            let object_matches = match (&self.pattern.object, &triple.object) {
                (TermPattern::Variable(_), _) => true,
                (TermPattern::NamedNode(expected), Term::NamedNode(actual)) => expected == actual,
                (TermPattern::Literal(expected), Term::Literal(actual)) => {
                    expected.value() == actual.value()
                }
                _ => false,
            };
            predicate_matches && object_matches
        })
    }
}
