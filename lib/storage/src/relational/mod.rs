mod catalog;
mod sql;
mod values;

pub use catalog::{ForeignKey, TableDescriptor};
pub use values::xsd_datatype;

use async_trait::async_trait;
use datafusion::arrow::datatypes::{Schema, SchemaRef};
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::common::TableReference;
use datafusion::datasource::{MemTable, TableProvider};
use datafusion::prelude::{CsvReadOptions, SessionContext};
use mediator_common::{
    ObjectPropertyJoin, RawObject, RawTriple, SourceError, SourceLoader, SubjectFetch,
};
use mediator_model::{IndividualUri, PropertyUri};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use tracing::{debug, trace};

/// A relational source whose tables are held by an Apache DataFusion session.
///
/// Every fetch is translated into a SQL statement. Tables are registered together with a
/// [TableDescriptor] that declares their keys.
///
/// The source is cheap to clone. Clones share the underlying session.
#[derive(Clone)]
pub struct RelationalSource {
    database: String,
    context: SessionContext,
    tables: Vec<TableDescriptor>,
}

impl RelationalSource {
    /// Creates an empty source for the database `database`.
    pub fn new(database: impl Into<String>) -> Self {
        Self::with_context(database, SessionContext::new())
    }

    /// Creates an empty source that registers its tables in `context`.
    pub fn with_context(database: impl Into<String>, context: SessionContext) -> Self {
        Self {
            database: database.into(),
            context,
            tables: Vec::new(),
        }
    }

    /// Registers an in-memory table.
    pub fn register_batch(
        &mut self,
        table: TableDescriptor,
        batch: RecordBatch,
    ) -> Result<(), SourceError> {
        let schema = batch.schema();
        validate_keys(&table, &schema)?;
        let provider =
            MemTable::try_new(Arc::clone(&schema), vec![vec![batch]]).map_err(SourceError::other)?;
        self.register(table, Arc::new(provider))
    }

    /// Registers a table from a CSV file with a header row. Column types are inferred.
    pub async fn register_csv(
        &mut self,
        table: TableDescriptor,
        path: &str,
    ) -> Result<(), SourceError> {
        let frame = self
            .context
            .read_csv(path, CsvReadOptions::new())
            .await
            .map_err(SourceError::other)?;
        validate_keys(&table, frame.schema().as_arrow())?;
        self.register(table, frame.into_view())
    }

    fn register(
        &mut self,
        table: TableDescriptor,
        provider: Arc<dyn TableProvider>,
    ) -> Result<(), SourceError> {
        self.context
            .register_table(TableReference::bare(table.name().to_owned()), provider)
            .map_err(SourceError::other)?;
        debug!(
            database = %self.database,
            table = table.name(),
            "Registered relational table"
        );
        self.tables.retain(|t| t.name() != table.name());
        self.tables.push(table);
        Ok(())
    }

    /// Returns the descriptors of all registered tables.
    pub fn tables(&self) -> &[TableDescriptor] {
        &self.tables
    }

    fn descriptor(&self, table: &str) -> Result<&TableDescriptor, SourceError> {
        self.tables
            .iter()
            .find(|t| t.name() == table)
            .ok_or_else(|| SourceError::UnknownTable(table.to_owned()))
    }

    fn required_primary_key<'a>(&'a self, table: &str) -> Result<&'a str, SourceError> {
        self.descriptor(table)?
            .primary_key()
            .ok_or_else(|| SourceError::MissingPrimaryKey(table.to_owned()))
    }

    fn required_foreign_key<'a>(
        &'a self,
        table: &str,
        referenced: &str,
    ) -> Result<&'a str, SourceError> {
        self.descriptor(table)?
            .foreign_key_referencing(referenced)
            .ok_or_else(|| SourceError::MissingForeignKey {
                table: table.to_owned(),
                referenced: referenced.to_owned(),
            })
    }

    async fn schema(&self, table: &str) -> Result<SchemaRef, SourceError> {
        let provider = self
            .context
            .table_provider(TableReference::bare(table.to_owned()))
            .await
            .map_err(SourceError::other)?;
        Ok(provider.schema())
    }

    async fn execute(&self, sql: String) -> Result<Vec<RecordBatch>, SourceError> {
        debug!(database = %self.database, %sql, "Executing source query");
        self.context
            .sql(&sql)
            .await
            .map_err(SourceError::other)?
            .collect()
            .await
            .map_err(SourceError::other)
    }

    fn individual(&self, prefix: &str, table: &str, pk: &str, pk_value: &str) -> String {
        IndividualUri::new(prefix, self.database.as_str(), table, pk, pk_value).to_string()
    }

    fn property(&self, prefix: &str, table: &str, column: &str) -> String {
        PropertyUri::new(prefix, self.database.as_str(), table, column).to_string()
    }

    /// Reads the `(subject, object)` pairs produced by [sql::select_column] and
    /// [sql::select_pairs].
    fn pairs(batches: &[RecordBatch]) -> Result<Vec<(String, String)>, SourceError> {
        let mut result = Vec::new();
        for batch in batches {
            let (subjects, objects) = (batch.column(0), batch.column(1));
            for row in 0..batch.num_rows() {
                if let (Some(subject), Some(object)) =
                    (values::render(subjects, row)?, values::render(objects, row)?)
                {
                    result.push((subject, object));
                }
            }
        }
        Ok(result)
    }
}

fn validate_keys(table: &TableDescriptor, schema: &Schema) -> Result<(), SourceError> {
    for column in table.key_columns() {
        if schema.field_with_name(column).is_err() {
            return Err(SourceError::UnknownColumn {
                table: table.name().to_owned(),
                column: column.to_owned(),
            });
        }
    }
    Ok(())
}

impl Debug for RelationalSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationalSource")
            .field("database", &self.database)
            .field("tables", &self.tables)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SourceLoader for RelationalSource {
    fn database_name(&self) -> &str {
        &self.database
    }

    async fn list_tables(&self) -> Result<Vec<String>, SourceError> {
        Ok(self.tables.iter().map(|t| t.name().to_owned()).collect())
    }

    async fn primary_key(&self, table: &str) -> Result<String, SourceError> {
        self.required_primary_key(table).map(str::to_owned)
    }

    async fn foreign_key_referencing(
        &self,
        table: &str,
        referenced_table: &str,
    ) -> Result<Option<String>, SourceError> {
        Ok(self
            .descriptor(table)?
            .foreign_key_referencing(referenced_table)
            .map(str::to_owned))
    }

    async fn fetch_for_subject(
        &self,
        prefix: &str,
        fetch: &SubjectFetch,
    ) -> Result<Vec<RawTriple>, SourceError> {
        self.descriptor(&fetch.table)?;
        if let Some(column) = &fetch.predicate_column {
            let schema = self.schema(&fetch.table).await?;
            if schema.field_with_name(column).is_err() {
                return Err(SourceError::UnknownColumn {
                    table: fetch.table.clone(),
                    column: column.clone(),
                });
            }
        }

        let batches = self
            .execute(sql::select_row(
                &fetch.table,
                &fetch.pk_column,
                &fetch.pk_value,
            ))
            .await?;
        let subject = self.individual(prefix, &fetch.table, &fetch.pk_column, &fetch.pk_value);

        let mut triples = Vec::new();
        for batch in &batches {
            let schema = batch.schema();
            for row in 0..batch.num_rows() {
                for (field, column) in schema.fields().iter().zip(batch.columns()) {
                    if fetch
                        .predicate_column
                        .as_ref()
                        .is_some_and(|c| c != field.name())
                    {
                        continue;
                    }
                    let Some(value) = values::render(column, row)? else {
                        continue;
                    };
                    if fetch.object.as_ref().is_some_and(|o| *o != value) {
                        continue;
                    }
                    let triple = RawTriple::new(
                        subject.clone(),
                        self.property(prefix, &fetch.table, field.name()),
                        RawObject::Literal {
                            value,
                            datatype: xsd_datatype(field.data_type()),
                        },
                    );
                    trace!(%triple, "Fetched triple for subject");
                    triples.push(triple);
                }
            }
        }
        Ok(triples)
    }

    async fn fetch_for_predicate_object(
        &self,
        prefix: &str,
        table: &str,
        column: &str,
        object: Option<&str>,
    ) -> Result<Vec<RawTriple>, SourceError> {
        let pk = self.required_primary_key(table)?;
        let schema = self.schema(table).await?;
        let datatype = schema
            .field_with_name(column)
            .map(|field| xsd_datatype(field.data_type()))
            .map_err(|_| SourceError::UnknownColumn {
                table: table.to_owned(),
                column: column.to_owned(),
            })?;

        let batches = self
            .execute(sql::select_column(table, pk, column, object))
            .await?;
        let predicate = self.property(prefix, table, column);

        let triples = Self::pairs(&batches)?
            .into_iter()
            .map(|(pk_value, value)| {
                RawTriple::new(
                    self.individual(prefix, table, pk, &pk_value),
                    predicate.clone(),
                    RawObject::Literal {
                        value,
                        datatype: datatype.clone(),
                    },
                )
            })
            .collect::<Vec<_>>();
        trace!(count = triples.len(), %predicate, "Fetched triples for predicate");
        Ok(triples)
    }

    async fn fetch_for_object_property_join(
        &self,
        prefix: &str,
        join: &ObjectPropertyJoin,
    ) -> Result<Vec<RawTriple>, SourceError> {
        let lhs_pk = self.required_primary_key(&join.lhs_table)?;
        let rhs_pk = self.required_primary_key(&join.rhs_table)?;

        // A dedicated association table (n:m) or a foreign key of the lhs table (1:n).
        let is_association_table = join.assoc_table != join.lhs_table
            && self.tables.iter().any(|t| t.name() == join.assoc_table);
        let statement = if is_association_table {
            sql::select_pairs(
                &join.assoc_table,
                self.required_foreign_key(&join.assoc_table, &join.lhs_table)?,
                self.required_foreign_key(&join.assoc_table, &join.rhs_table)?,
                join.object_pk.as_deref(),
            )
        } else {
            sql::select_pairs(
                &join.lhs_table,
                lhs_pk,
                self.required_foreign_key(&join.lhs_table, &join.rhs_table)?,
                join.object_pk.as_deref(),
            )
        };

        let batches = self.execute(statement).await?;
        let predicate = self.property(prefix, &join.lhs_table, &join.assoc_table);

        let triples = Self::pairs(&batches)?
            .into_iter()
            .map(|(lhs_value, rhs_value)| {
                RawTriple::new(
                    self.individual(prefix, &join.lhs_table, lhs_pk, &lhs_value),
                    predicate.clone(),
                    RawObject::Iri(self.individual(prefix, &join.rhs_table, rhs_pk, &rhs_value)),
                )
            })
            .collect::<Vec<_>>();
        trace!(count = triples.len(), %predicate, "Fetched triples for object property");
        Ok(triples)
    }
}
