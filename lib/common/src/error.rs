use mediator_model::{IriParseError, UriError};
use spargebra::SparqlSyntaxError;
use std::error::Error;

/// An error raised while mediating a query.
///
/// All errors abort the resolution of the entire query, except
/// [MediationError::FederatedConversionFailed], which only causes the resolver to skip a single
/// candidate source property.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum MediationError {
    /// A URI does not have the shape of the expected addressing scheme.
    #[error(transparent)]
    MalformedUri(#[from] UriError),
    /// A triple pattern that addresses the federated schema has a bound subject.
    #[error("A triple pattern referring to the federated schema must have a variable subject, found {0}")]
    FederatedSubjectMustBePattern(String),
    /// The shape of the triple pattern is deliberately not supported.
    #[error("The triple pattern is not supported: {0}")]
    NotSupported(String),
    /// The predicate is used in an object-property position but is not an object property.
    #[error("The predicate {0} must refer to an object property")]
    ObjectPropertyExpected(String),
    /// A federated individual cannot be mapped into the schema of a source property.
    #[error("The federated individual {individual} cannot be converted to the schema of {property}")]
    FederatedConversionFailed {
        /// The federated individual.
        individual: String,
        /// The source property whose schema was targeted.
        property: String,
    },
    /// No common federated class exists for a group of fused individuals.
    #[error("Could not derive a federated class for the fused individuals {}", .0.join(", "))]
    FusionStemDerivationFailed(Vec<String>),
    /// An error from a data source.
    #[error(transparent)]
    Source(#[from] SourceError),
    /// A source produced a term that is not a valid IRI.
    #[error(transparent)]
    InvalidIri(#[from] IriParseError),
    /// An error in SPARQL parsing.
    #[error(transparent)]
    Parsing(#[from] SparqlSyntaxError),
    /// The query uses a feature the evaluator of the working graph does not support.
    #[error("The query cannot be evaluated over the working graph: {0}")]
    Evaluation(String),
}

impl MediationError {
    /// Returns `true` if the error only affects a single resolution candidate.
    pub fn is_candidate_failure(&self) -> bool {
        matches!(self, MediationError::FederatedConversionFailed { .. })
    }

    pub fn not_supported<T>(cause: impl Into<String>) -> Result<T, Self> {
        Err(MediationError::NotSupported(cause.into()))
    }
}

/// An error related to accessing a relational source.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SourceError {
    /// The source has no table with the given name.
    #[error("The table {0} does not exist")]
    UnknownTable(String),
    /// The table has no column with the given name.
    #[error("The table {table} has no column {column}")]
    UnknownColumn {
        /// The table.
        table: String,
        /// The missing column.
        column: String,
    },
    /// The table has no declared primary key.
    #[error("The table {0} has no primary key")]
    MissingPrimaryKey(String),
    /// The table has no foreign key to the referenced table.
    #[error("The table {table} has no foreign key referencing {referenced}")]
    MissingForeignKey {
        /// The referencing table.
        table: String,
        /// The referenced table.
        referenced: String,
    },
    /// Error from the engine backing the source.
    #[error("{0}")]
    Other(#[source] Box<dyn Error + Send + Sync + 'static>),
}

impl SourceError {
    /// Builds an error from an error of the backing engine.
    pub fn other(error: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        Self::Other(error.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_conversion_failures_are_candidate_failures() {
        let conversion = MediationError::FederatedConversionFailed {
            individual: "http://ex.org/FEDERATED/User/KMS.ID.5".to_owned(),
            property: "http://ex.org/LMS/Admin#User".to_owned(),
        };
        assert!(conversion.is_candidate_failure());
        assert!(!MediationError::NotSupported("?s ?p \"o\"".to_owned()).is_candidate_failure());
    }

    #[test]
    fn stem_derivation_lists_individuals() {
        let error = MediationError::FusionStemDerivationFailed(vec![
            "http://ex.org/KMS/User/ID.1".to_owned(),
            "http://ex.org/LMS/User/ID.2".to_owned(),
        ]);
        assert_eq!(
            error.to_string(),
            "Could not derive a federated class for the fused individuals http://ex.org/KMS/User/ID.1, http://ex.org/LMS/User/ID.2"
        );
    }
}
