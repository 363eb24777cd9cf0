/// A column that references the primary key of another table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub column: String,
    pub references: String,
}

/// The declared keys of a table.
///
/// Relational sources do not infer keys from the data. The mediator needs the primary key to
/// build individual URIs and the foreign keys to resolve object properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    name: String,
    primary_key: Option<String>,
    foreign_keys: Vec<ForeignKey>,
}

impl TableDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: None,
            foreign_keys: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = Some(column.into());
        self
    }

    #[must_use]
    pub fn with_foreign_key(
        mut self,
        column: impl Into<String>,
        references: impl Into<String>,
    ) -> Self {
        self.foreign_keys.push(ForeignKey {
            column: column.into(),
            references: references.into(),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }

    /// Returns the first foreign key column that references `table`.
    pub fn foreign_key_referencing(&self, table: &str) -> Option<&str> {
        self.foreign_keys
            .iter()
            .find(|fk| fk.references == table)
            .map(|fk| fk.column.as_str())
    }

    /// Returns all declared key columns.
    pub(super) fn key_columns(&self) -> impl Iterator<Item = &str> {
        self.primary_key
            .iter()
            .map(String::as_str)
            .chain(self.foreign_keys.iter().map(|fk| fk.column.as_str()))
    }
}
