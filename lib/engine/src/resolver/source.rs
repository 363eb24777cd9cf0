use super::{into_triples, PatternTerm, Resolver};
use futures::future::try_join_all;
use mediator_common::{
    MediationError, MediationResult, ObjectProperty, ObjectPropertyJoin, SourceDescriptor,
    SubjectFetch,
};
use mediator_model::{IndividualUri, NamedNode, NamedNodeRef, PropertyUri, Triple};

/// Returns the table a range class refers to, i.e., its last path segment.
fn range_table(range: &NamedNode) -> Option<&str> {
    range
        .as_str()
        .rsplit_once('/')
        .map(|(_, table)| table)
        .filter(|table| !table.is_empty())
}

impl Resolver {
    /// Fetches the row of `subject`, optionally restricted to a column and a value.
    pub(super) async fn resolve_subject(
        &self,
        source: &SourceDescriptor,
        subject: NamedNodeRef<'_>,
        predicate: PatternTerm<'_>,
        object: PatternTerm<'_>,
    ) -> MediationResult<Vec<Triple>> {
        let individual = IndividualUri::parse(subject.as_str())?;
        let predicate_column = match predicate {
            PatternTerm::Iri(predicate) => {
                if self
                    .oracle
                    .resolve_object_property(predicate.as_str())
                    .is_some()
                {
                    // Object properties are not columns of the row. The predicate branch joins them.
                    return Ok(Vec::new());
                }
                let property = PropertyUri::parse(predicate.as_str())?;
                if property.db_name() != individual.db_name()
                    || property.table_name() != individual.table_name()
                {
                    // The property belongs to another table, so the row cannot have it.
                    return Ok(Vec::new());
                }
                Some(property.column_name().to_owned())
            }
            _ => None,
        };
        let object = match object {
            PatternTerm::Iri(object) => Some(object.as_str().to_owned()),
            PatternTerm::Literal(object) => Some(object.value().to_owned()),
            PatternTerm::Variable => None,
        };

        let fetch = SubjectFetch {
            table: individual.table_name().to_owned(),
            pk_column: individual.pk_name().to_owned(),
            pk_value: individual.pk_value().to_owned(),
            predicate_column,
            object,
        };
        let raw = source
            .loader()
            .fetch_for_subject(source.prefix(), &fetch)
            .await?;
        into_triples(raw)
    }

    /// Fetches the values of the column (or object property) `predicate`.
    pub(super) async fn resolve_predicate(
        &self,
        source: &SourceDescriptor,
        predicate: NamedNodeRef<'_>,
        object: PatternTerm<'_>,
    ) -> MediationResult<Vec<Triple>> {
        let property = PropertyUri::parse(predicate.as_str())?;
        let loader = source.loader();
        match object {
            PatternTerm::Literal(object) => {
                let raw = loader
                    .fetch_for_predicate_object(
                        source.prefix(),
                        property.table_name(),
                        property.column_name(),
                        Some(object.value()),
                    )
                    .await?;
                into_triples(raw)
            }
            PatternTerm::Iri(object) => {
                let object_property = self
                    .oracle
                    .resolve_object_property(predicate.as_str())
                    .ok_or_else(|| MediationError::ObjectPropertyExpected(predicate.to_string()))?;
                self.join_object_property(source, &property, &object_property, Some(object))
                    .await
            }
            PatternTerm::Variable => {
                if let Some(object_property) =
                    self.oracle.resolve_object_property(predicate.as_str())
                {
                    let tables = loader.list_tables().await?;
                    let joinable = object_property
                        .range
                        .as_ref()
                        .and_then(range_table)
                        .is_some_and(|rhs| tables.iter().any(|t| t == rhs));
                    if joinable {
                        return self
                            .join_object_property(source, &property, &object_property, None)
                            .await;
                    }
                }
                let raw = loader
                    .fetch_for_predicate_object(
                        source.prefix(),
                        property.table_name(),
                        property.column_name(),
                        None,
                    )
                    .await?;
                into_triples(raw)
            }
        }
    }

    /// Joins all object properties of the registered sources that range over `object`.
    pub(super) async fn resolve_object(
        &self,
        predicate: PatternTerm<'_>,
        object: NamedNodeRef<'_>,
    ) -> MediationResult<Vec<Triple>> {
        if let PatternTerm::Iri(predicate) = predicate {
            return Err(MediationError::ObjectPropertyExpected(predicate.to_string()));
        }

        let individual = IndividualUri::parse(object.as_str())?;
        let candidates = self
            .oracle
            .properties_with_range(&individual.class_iri())
            .into_iter()
            .filter_map(|property| {
                let source = self.registry.classify(property.as_str())?;
                let object_property = self.oracle.resolve_object_property(property.as_str())?;
                Some((source, object_property))
            })
            .collect::<Vec<_>>();
        if candidates.is_empty() {
            return Err(MediationError::ObjectPropertyExpected(format!(
                "of the pattern with object {object}"
            )));
        }

        let joins = candidates.iter().map(|(source, object_property)| async move {
            let property = PropertyUri::parse(object_property.property.as_str())?;
            self.join_object_property(source, &property, object_property, Some(object))
                .await
        });
        let results = try_join_all(joins).await?;
        Ok(results.into_iter().flatten().collect())
    }

    /// Resolves `property` by joining its table with the table of its range.
    ///
    /// The column name of an object property names the table that stores the association.
    async fn join_object_property(
        &self,
        source: &SourceDescriptor,
        property: &PropertyUri,
        object_property: &ObjectProperty,
        object: Option<NamedNodeRef<'_>>,
    ) -> MediationResult<Vec<Triple>> {
        let rhs_table = object_property
            .range
            .as_ref()
            .and_then(range_table)
            .ok_or_else(|| MediationError::ObjectPropertyExpected(property.to_string()))?;

        let object_pk = match object {
            Some(object) => {
                let individual = IndividualUri::parse(object.as_str())?;
                if individual.db_name() != source.database() || individual.table_name() != rhs_table
                {
                    // The object is not in the range of the property.
                    return Ok(Vec::new());
                }
                Some(individual.pk_value().to_owned())
            }
            None => None,
        };

        let join = ObjectPropertyJoin {
            lhs_table: property.table_name().to_owned(),
            assoc_table: property.column_name().to_owned(),
            rhs_table: rhs_table.to_owned(),
            object_pk,
        };
        let raw = source
            .loader()
            .fetch_for_object_property_join(source.prefix(), &join)
            .await?;
        into_triples(raw)
    }
}
