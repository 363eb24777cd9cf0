use crate::uri::{is_identifier, split_table_iri, strip_uri};
use crate::{UriError, UriKind};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A property of a relational source: `<prefix><db>/<table>#<column>`.
///
/// The column usually names a column of the table. For object properties it names the table that
/// associates the owning table with the range of the property.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PropertyUri {
    prefix: String,
    db_name: String,
    table_name: String,
    column_name: String,
}

impl PropertyUri {
    /// Creates a new [PropertyUri] from its parts without validating them.
    pub fn new(
        prefix: impl Into<String>,
        db_name: impl Into<String>,
        table_name: impl Into<String>,
        column_name: impl Into<String>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            db_name: db_name.into(),
            table_name: table_name.into(),
            column_name: column_name.into(),
        }
    }

    /// Decodes a property URI. Surrounding angle brackets are ignored.
    pub fn parse(uri: &str) -> Result<Self, UriError> {
        let value = strip_uri(uri);
        let malformed = || UriError::malformed(UriKind::Property, value);

        let (table_iri, column) = value.split_once('#').ok_or_else(malformed)?;
        if !is_identifier(column) {
            return Err(malformed());
        }
        let (prefix, db, table) = split_table_iri(table_iri).ok_or_else(malformed)?;
        Ok(Self::new(prefix, db, table, column))
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

    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    /// Returns the IRI of the class that represents the owning table: `<prefix><db>/<table>`.
    pub fn table_iri(&self) -> String {
        format!("{}{}/{}", self.prefix, self.db_name, self.table_name)
    }
}

impl Display for PropertyUri {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}/{}#{}",
            self.prefix, self.db_name, self.table_name, self.column_name
        )
    }
}

impl FromStr for PropertyUri {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
