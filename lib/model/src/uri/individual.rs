use crate::uri::{is_identifier, split_table_iri, strip_uri};
use crate::{SourceIdentity, UriError, UriKind};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A row of a relational source: `<prefix><db>/<table>/<pk-name>.<pk-value>`.
///
/// The first `.` of the last path segment separates the primary key column from its value. The
/// value itself may therefore contain dots, but never `/` or `#`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IndividualUri {
    prefix: String,
    db_name: String,
    table_name: String,
    pk_name: String,
    pk_value: String,
}

impl IndividualUri {
    /// Creates a new [IndividualUri] from its parts without validating them.
    pub fn new(
        prefix: impl Into<String>,
        db_name: impl Into<String>,
        table_name: impl Into<String>,
        pk_name: impl Into<String>,
        pk_value: impl Into<String>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            db_name: db_name.into(),
            table_name: table_name.into(),
            pk_name: pk_name.into(),
            pk_value: pk_value.into(),
        }
    }

    /// Decodes an individual URI. Surrounding angle brackets are ignored.
    pub fn parse(uri: &str) -> Result<Self, UriError> {
        let value = strip_uri(uri);
        let malformed = || UriError::malformed(UriKind::Individual, value);

        if value.contains('#') {
            return Err(malformed());
        }
        let (table_iri, key) = value.rsplit_once('/').ok_or_else(malformed)?;
        let (pk_name, pk_value) = key.split_once('.').ok_or_else(malformed)?;
        if !is_identifier(pk_name) || pk_value.is_empty() {
            return Err(malformed());
        }
        let (prefix, db, table) = split_table_iri(table_iri).ok_or_else(malformed)?;
        Ok(Self::new(prefix, db, table, pk_name, pk_value))
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn pk_name(&self) -> &str {
        &self.pk_name
    }

    pub fn pk_value(&self) -> &str {
        &self.pk_value
    }

    /// Returns the IRI of the class of this individual, which is its owning table:
    /// `<prefix><db>/<table>`.
    pub fn class_iri(&self) -> String {
        format!("{}{}/{}", self.prefix, self.db_name, self.table_name)
    }

    /// Returns the identity of this individual within its source.
    pub fn identity(&self) -> SourceIdentity {
        SourceIdentity::new(&self.db_name, &self.pk_name, &self.pk_value)
    }
}

impl Display for IndividualUri {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}/{}/{}.{}",
            self.prefix, self.db_name, self.table_name, self.pk_name, self.pk_value
        )
    }
}

impl FromStr for IndividualUri {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
