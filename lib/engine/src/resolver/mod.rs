//! Resolution of graph patterns against the registered sources.
//!
//! The resolver walks the algebra of a query and resolves every triple pattern of every basic
//! graph pattern. Each position of a triple pattern that is an IRI is classified by the
//! [SourceRegistry]:
//!
//! - If nothing classifies, the pattern addresses the federated schema and is rewritten into
//!   patterns over equivalent source properties with the help of the [OntologyOracle].
//! - If the subject classifies, the row of the subject is fetched.
//! - If the predicate classifies, the column (or the object property) is fetched.
//! - If only the object classifies, the object properties ranging over the object are joined.
//!
//! The result is the flat list of triples derived from the sources. It is not deduplicated.

mod algebra;
mod federated;
mod pattern;
mod source;

pub use algebra::AlgebraNode;

use crate::resolver::pattern::PatternTerm;
use futures::future::{try_join, try_join_all, BoxFuture};
use mediator_common::{
    MediationError, MediationResult, OntologyOracle, RawTriple, SourceDescriptor, SourceRegistry,
};
use mediator_model::Triple;
use spargebra::algebra::GraphPattern;
use spargebra::term::TriplePattern;
use std::sync::Arc;
use tracing::{debug, trace};

/// Resolves graph patterns into the triples derived from the sources.
#[derive(Debug, Clone)]
pub struct Resolver {
    registry: Arc<SourceRegistry>,
    oracle: Arc<dyn OntologyOracle>,
}

impl Resolver {
    pub fn new(registry: Arc<SourceRegistry>, oracle: Arc<dyn OntologyOracle>) -> Self {
        Self { registry, oracle }
    }

    /// Resolves all basic graph patterns in `pattern`.
    ///
    /// Any error aborts the resolution. No partial results are returned.
    pub async fn resolve(&self, pattern: &GraphPattern) -> MediationResult<Vec<Triple>> {
        let derived = self.resolve_graph_pattern(pattern).await?;
        debug!(derived = derived.len(), "Resolved graph pattern");
        Ok(derived)
    }

    /// Resolves a single triple pattern.
    pub async fn resolve_pattern(&self, pattern: &TriplePattern) -> MediationResult<Vec<Triple>> {
        self.resolve_triple_pattern(pattern).await
    }

    fn resolve_graph_pattern<'a>(
        &'a self,
        pattern: &'a GraphPattern,
    ) -> BoxFuture<'a, MediationResult<Vec<Triple>>> {
        Box::pin(async move {
            match AlgebraNode::classify(pattern) {
                AlgebraNode::Bgp(patterns) => {
                    let results =
                        try_join_all(patterns.iter().map(|p| self.resolve_triple_pattern(p)))
                            .await?;
                    Ok(results.into_iter().flatten().collect())
                }
                AlgebraNode::Unary(inner) => self.resolve_graph_pattern(inner).await,
                AlgebraNode::BinaryJoinLike(left, right) => {
                    let (mut left, right) = try_join(
                        self.resolve_graph_pattern(left),
                        self.resolve_graph_pattern(right),
                    )
                    .await?;
                    left.extend(right);
                    Ok(left)
                }
                AlgebraNode::Leaf => Ok(Vec::new()),
            }
        })
    }

    fn resolve_triple_pattern<'a>(
        &'a self,
        pattern: &'a TriplePattern,
    ) -> BoxFuture<'a, MediationResult<Vec<Triple>>> {
        Box::pin(async move {
            let subject = PatternTerm::from_term(&pattern.subject)?;
            let predicate = PatternTerm::from_predicate(&pattern.predicate);
            let object = PatternTerm::from_term(&pattern.object)?;

            let subject_source = self.classify(subject);
            let predicate_source = self.classify(predicate);
            let object_source = self.classify(object);
            trace!(
                %pattern,
                subject_source = subject_source.map(SourceDescriptor::database),
                predicate_source = predicate_source.map(SourceDescriptor::database),
                object_source = object_source.map(SourceDescriptor::database),
                "Classified triple pattern"
            );

            let mut branches: Vec<BoxFuture<'_, MediationResult<Vec<Triple>>>> = Vec::new();
            if let (Some(source), PatternTerm::Iri(subject)) = (subject_source, subject) {
                branches.push(Box::pin(
                    self.resolve_subject(source, subject, predicate, object),
                ));
            }
            if let (Some(source), PatternTerm::Iri(predicate)) = (predicate_source, predicate) {
                branches.push(Box::pin(self.resolve_predicate(source, predicate, object)));
            } else if let (Some(_), PatternTerm::Iri(object)) = (object_source, object) {
                branches.push(Box::pin(self.resolve_object(predicate, object)));
            }

            if branches.is_empty() {
                return self.resolve_federated(subject, predicate, object).await;
            }
            let results = try_join_all(branches).await?;
            Ok(results.into_iter().flatten().collect())
        })
    }

    fn classify(&self, term: PatternTerm<'_>) -> Option<&SourceDescriptor> {
        term.iri()
            .and_then(|iri| self.registry.classify(iri.as_str()))
    }
}

/// Canonicalizes the triples of a loader.
fn into_triples(raw: Vec<RawTriple>) -> MediationResult<Vec<Triple>> {
    raw.into_iter()
        .map(|triple| triple.into_triple().map_err(MediationError::from))
        .collect()
}
