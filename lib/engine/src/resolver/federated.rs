use super::pattern::SubQuery;
use super::{PatternTerm, Resolver};
use futures::future::try_join_all;
use mediator_common::{MediationError, MediationResult};
use mediator_model::{
    FederatedIndividualUri, IndividualUri, NamedNode, NamedNodeRef, Subject, Term, TermPattern,
    Triple, TriplePattern, UriError, UriKind, Variable,
};
use tracing::debug;

/// Returns the federated class of a federated property, i.e., the IRI before the `#`.
fn federated_stem(property: &str) -> &str {
    property
        .split_once('#')
        .map_or(property, |(stem, _)| stem)
}

impl Resolver {
    /// Resolves a triple pattern whose terms all belong to the federated schema.
    pub(super) async fn resolve_federated(
        &self,
        subject: PatternTerm<'_>,
        predicate: PatternTerm<'_>,
        object: PatternTerm<'_>,
    ) -> MediationResult<Vec<Triple>> {
        match subject {
            PatternTerm::Iri(subject) => {
                return Err(MediationError::FederatedSubjectMustBePattern(
                    subject.to_string(),
                ))
            }
            PatternTerm::Literal(subject) => {
                return MediationError::not_supported(format!("the literal subject {subject}"))
            }
            PatternTerm::Variable => {}
        }

        match (predicate, object) {
            (PatternTerm::Iri(predicate), _) => {
                self.resolve_federated_property(predicate, object).await
            }
            (_, PatternTerm::Iri(object)) => self.resolve_federated_range(object).await,
            (_, PatternTerm::Literal(object)) => MediationError::not_supported(format!(
                "a variable predicate with the literal object {object} in the federated schema"
            )),
            (_, PatternTerm::Variable) => Ok(Vec::new()),
        }
    }

    /// Rewrites `?s <property> object` into sub-queries over the equivalent source properties.
    async fn resolve_federated_property(
        &self,
        property: NamedNodeRef<'_>,
        object: PatternTerm<'_>,
    ) -> MediationResult<Vec<Triple>> {
        let stem = federated_stem(property.as_str());
        let candidates = self
            .oracle
            .equivalent_properties(property.as_str())
            .into_iter()
            .filter(|candidate| self.registry.classify(candidate.as_str()).is_some())
            .collect::<Vec<_>>();
        debug!(
            %property,
            candidates = candidates.len(),
            "Resolving federated property"
        );

        let results = try_join_all(
            candidates
                .iter()
                .map(|candidate| self.resolve_candidate(property, stem, candidate, object)),
        )
        .await?;
        Ok(results.into_iter().flatten().collect())
    }

    /// Resolves the sub-query for a single equivalent source property `candidate`.
    ///
    /// Returns the triples derived by the sub-query, followed by their translation into the
    /// federated schema.
    async fn resolve_candidate(
        &self,
        property: NamedNodeRef<'_>,
        stem: &str,
        candidate: &NamedNode,
        object: PatternTerm<'_>,
    ) -> MediationResult<Vec<Triple>> {
        let sub_object: TermPattern = match object {
            PatternTerm::Literal(object) => object.into_owned().into(),
            PatternTerm::Variable => Variable::new_unchecked("obj").into(),
            PatternTerm::Iri(object) => match self.convert_federated_individual(object, candidate)
            {
                Ok(object) => object.into(),
                Err(error) if error.is_candidate_failure() => {
                    debug!(%error, "Skipping candidate property");
                    return Ok(Vec::new());
                }
                Err(error) => return Err(error),
            },
        };

        let sub_query = SubQuery::new(candidate.clone(), sub_object);
        let mut derived = self.resolve_triple_pattern(sub_query.pattern()).await?;
        let translated = sub_query
            .rows(&derived)
            .map(|row| self.translate_row(row, property, stem, object))
            .collect::<MediationResult<Vec<_>>>()?;
        derived.extend(translated);
        Ok(derived)
    }

    /// Translates a row of a sub-query into a triple of the federated schema.
    fn translate_row(
        &self,
        row: &Triple,
        property: NamedNodeRef<'_>,
        stem: &str,
        object: PatternTerm<'_>,
    ) -> MediationResult<Triple> {
        let Subject::NamedNode(subject) = &row.subject else {
            return Err(UriError::malformed(UriKind::Individual, row.subject.to_string()).into());
        };
        let individual = IndividualUri::parse(subject.as_str())?;
        let subject =
            NamedNode::new(FederatedIndividualUri::for_individual(stem, &individual).to_string())?;

        let object: Term = match object {
            PatternTerm::Literal(object) => object.into_owned().into(),
            PatternTerm::Iri(object) => object.into_owned().into(),
            PatternTerm::Variable => match &row.object {
                Term::NamedNode(node) => self.federated_individual(node, stem)?.into(),
                other => other.clone(),
            },
        };
        Ok(Triple::new(subject, property.into_owned(), object))
    }

    /// Maps a source individual to the federated schema. The federated class is the first
    /// supreme super class of the individual's table, falling back to `default_stem`.
    fn federated_individual(
        &self,
        individual: &NamedNode,
        default_stem: &str,
    ) -> MediationResult<NamedNode> {
        let individual = IndividualUri::parse(individual.as_str())?;
        let supreme = self.oracle.supreme_superclasses(&individual.class_iri());
        let stem = supreme.first().map_or(default_stem, NamedNode::as_str);
        Ok(NamedNode::new(
            FederatedIndividualUri::for_individual(stem, &individual).to_string(),
        )?)
    }

    /// Maps a federated individual to the individual of the range of the source property
    /// `property`.
    fn convert_federated_individual(
        &self,
        individual: NamedNodeRef<'_>,
        property: &NamedNode,
    ) -> MediationResult<NamedNode> {
        let failed = || MediationError::FederatedConversionFailed {
            individual: individual.as_str().to_owned(),
            property: property.as_str().to_owned(),
        };

        let federated = FederatedIndividualUri::parse(individual.as_str()).map_err(|_| failed())?;
        let source = self
            .registry
            .classify(property.as_str())
            .ok_or_else(failed)?;
        let identity = federated
            .identity_for(source.database())
            .ok_or_else(failed)?;
        let table = self
            .oracle
            .ranges(property.as_str())
            .into_iter()
            .find(|range| range.as_str().starts_with(source.namespace()))
            .ok_or_else(failed)?;

        Ok(NamedNode::new(format!(
            "{}/{}.{}",
            table.as_str(),
            identity.pk_name(),
            identity.pk_value()
        ))?)
    }

    /// Resolves `?s ?p object` by querying all properties that range over the class of `object`.
    async fn resolve_federated_range(
        &self,
        object: NamedNodeRef<'_>,
    ) -> MediationResult<Vec<Triple>> {
        let individual = IndividualUri::parse(object.as_str())?;
        let sub_queries = self
            .oracle
            .properties_with_range(&individual.class_iri())
            .into_iter()
            .map(|property| TriplePattern {
                subject: Variable::new_unchecked("subj").into(),
                predicate: property.into(),
                object: object.into_owned().into(),
            })
            .collect::<Vec<_>>();
        debug!(%object, sub_queries = sub_queries.len(), "Resolving federated range");

        let results = try_join_all(
            sub_queries
                .iter()
                .map(|pattern| self.resolve_triple_pattern(pattern)),
        )
        .await?;
        Ok(results.into_iter().flatten().collect())
    }
}
