use crate::error::SourceError;
use async_trait::async_trait;
use mediator_model::vocab::xsd;
use mediator_model::{IriParseError, Literal, NamedNode, Term, Triple};
use std::fmt::{Debug, Display, Formatter};

/// The object of a [RawTriple].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RawObject {
    /// A reference to another individual.
    Iri(String),
    /// A column value. The datatype is `None` for columns that map to plain strings.
    Literal {
        value: String,
        datatype: Option<NamedNode>,
    },
}

impl RawObject {
    /// Creates a plain string literal.
    pub fn plain(value: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            datatype: None,
        }
    }

    /// Returns the IRI or the lexical value of the literal.
    pub fn lexical(&self) -> &str {
        match self {
            RawObject::Iri(iri) => iri,
            RawObject::Literal { value, .. } => value,
        }
    }
}

/// A triple as it is extracted from a source, before canonicalization into RDF terms.
///
/// Subject and predicate are already built from the namespace of the source.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RawTriple {
    pub subject: String,
    pub predicate: String,
    pub object: RawObject,
}

impl RawTriple {
    pub fn new(subject: impl Into<String>, predicate: impl Into<String>, object: RawObject) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object,
        }
    }

    /// Converts the raw triple into an RDF [Triple], validating all IRIs.
    pub fn into_triple(self) -> Result<Triple, IriParseError> {
        let subject = NamedNode::new(self.subject)?;
        let predicate = NamedNode::new(self.predicate)?;
        let object: Term = match self.object {
            RawObject::Iri(iri) => NamedNode::new(iri)?.into(),
            RawObject::Literal {
                value,
                datatype: Some(datatype),
            } if datatype.as_ref() != xsd::STRING => {
                Literal::new_typed_literal(value, datatype).into()
            }
            RawObject::Literal { value, .. } => Literal::new_simple_literal(value).into(),
        };
        Ok(Triple::new(subject, predicate, object))
    }
}

impl Display for RawTriple {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.subject,
            self.predicate,
            self.object.lexical()
        )
    }
}

/// Describes a lookup of the columns of a single row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubjectFetch {
    pub table: String,
    pub pk_column: String,
    pub pk_value: String,
    /// Restricts the result to this column.
    pub predicate_column: Option<String>,
    /// Restricts the result to columns whose value equals this value.
    pub object: Option<String>,
}

/// Describes the join that resolves an object property.
///
/// The property is owned by `lhs_table` and ranges over `rhs_table`. The association is stored in
/// `assoc_table`, which is either a dedicated n:m table or, if it names no other table, a foreign
/// key of `lhs_table`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectPropertyJoin {
    pub lhs_table: String,
    pub assoc_table: String,
    pub rhs_table: String,
    /// Restricts the result to the rhs row with this primary key value.
    pub object_pk: Option<String>,
}

/// Extracts triples from a single relational source.
///
/// All fetch operations return triples in canonical form:
///
/// - subjects are individual URIs: `<prefix><db>/<table>/<pk-name>.<pk-value>`
/// - predicates are property URIs: `<prefix><db>/<table>#<column>`
/// - literal objects carry the XSD datatype of their column, unless the column is a string
#[async_trait]
pub trait SourceLoader: Debug + Send + Sync {
    /// Returns the name of the database, which is part of every URI of the source.
    fn database_name(&self) -> &str;

    /// Returns the names of all tables of the source.
    async fn list_tables(&self) -> Result<Vec<String>, SourceError>;

    /// Returns the primary key column of `table`.
    async fn primary_key(&self, table: &str) -> Result<String, SourceError>;

    /// Returns the column of `table` that references the primary key of `referenced_table`.
    async fn foreign_key_referencing(
        &self,
        table: &str,
        referenced_table: &str,
    ) -> Result<Option<String>, SourceError>;

    /// Returns the triples of a single row.
    async fn fetch_for_subject(
        &self,
        prefix: &str,
        fetch: &SubjectFetch,
    ) -> Result<Vec<RawTriple>, SourceError>;

    /// Returns one triple per row of `table` whose `column` is not null. If `object` is given, only
    /// rows whose column equals `object` are returned.
    async fn fetch_for_predicate_object(
        &self,
        prefix: &str,
        table: &str,
        column: &str,
        object: Option<&str>,
    ) -> Result<Vec<RawTriple>, SourceError>;

    /// Returns one triple per associated pair of rows.
    async fn fetch_for_object_property_join(
        &self,
        prefix: &str,
        join: &ObjectPropertyJoin,
    ) -> Result<Vec<RawTriple>, SourceError>;
}
