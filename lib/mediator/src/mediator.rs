use mediator_common::{MediationResult, OntologyOracle, SourceRegistry};
use mediator_engine::{
    evaluate_query, fuse, resolve_ambiguities, AmbiguityResolver, LevenshteinResolver,
    QueryResults, Resolver, WorkingGraph,
};
use spargebra::Query;
use std::sync::Arc;
use tracing::debug;

/// Options of a [Mediator].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediatorOptions {
    /// The maximal edit distance at which two conflicting values are considered the same fact.
    pub ambiguity_threshold: usize,
}

impl Default for MediatorOptions {
    fn default() -> Self {
        Self {
            ambiguity_threshold: LevenshteinResolver::DEFAULT_THRESHOLD,
        }
    }
}

/// Answers [SPARQL](https://www.w3.org/TR/sparql11-query/) queries over the registered sources.
///
/// Each query is answered against its own working graph, so a mediator can be shared between
/// concurrent queries.
///
/// Usage example:
/// ```
/// use datafusion::arrow::array::{ArrayRef, Int64Array, StringArray};
/// use datafusion::arrow::record_batch::RecordBatch;
/// use mediator::common::SourceRegistry;
/// use mediator::engine::QueryResults;
/// use mediator::storage::{GraphOntology, RelationalSource, TableDescriptor};
/// use mediator::Mediator;
/// use mediator::model::Graph;
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let users = RecordBatch::try_from_iter(vec![
///     ("ID", Arc::new(Int64Array::from(vec![1])) as ArrayRef),
///     ("NAME", Arc::new(StringArray::from(vec!["Alice"])) as ArrayRef),
/// ])?;
/// let mut source = RelationalSource::new("KMS");
/// source.register_batch(TableDescriptor::new("User").with_primary_key("ID"), users)?;
///
/// let registry = SourceRegistry::new().with_source("http://ex.org/KMS/", Arc::new(source))?;
/// let mediator = Mediator::new(registry, Arc::new(GraphOntology::new(Graph::new())));
///
/// if let QueryResults::Solutions(solutions) = mediator
///     .query("SELECT ?name WHERE { <http://ex.org/KMS/User/ID.1> <http://ex.org/KMS/User#NAME> ?name }")
///     .await?
/// {
///     assert_eq!(solutions.len(), 1);
/// }
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// # }).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct Mediator {
    registry: Arc<SourceRegistry>,
    oracle: Arc<dyn OntologyOracle>,
    resolver: Resolver,
    ambiguity_resolver: Arc<dyn AmbiguityResolver>,
}

impl Mediator {
    /// Creates a mediator with the default options.
    pub fn new(registry: SourceRegistry, oracle: Arc<dyn OntologyOracle>) -> Self {
        Self::new_with_options(registry, oracle, MediatorOptions::default())
    }

    pub fn new_with_options(
        registry: SourceRegistry,
        oracle: Arc<dyn OntologyOracle>,
        options: MediatorOptions,
    ) -> Self {
        let registry = Arc::new(registry);
        let resolver = Resolver::new(Arc::clone(&registry), Arc::clone(&oracle));
        Self {
            registry,
            oracle,
            resolver,
            ambiguity_resolver: Arc::new(LevenshteinResolver::new(options.ambiguity_threshold)),
        }
    }

    /// Replaces the strategy that reconciles conflicting values.
    #[must_use]
    pub fn with_ambiguity_resolver(mut self, ambiguity_resolver: Arc<dyn AmbiguityResolver>) -> Self {
        self.ambiguity_resolver = ambiguity_resolver;
        self
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn oracle(&self) -> &Arc<dyn OntologyOracle> {
        &self.oracle
    }

    /// Parses and executes a [SPARQL 1.1 query](https://www.w3.org/TR/sparql11-query/).
    pub async fn query(&self, query: &str) -> MediationResult<QueryResults> {
        let query = Query::parse(query, None)?;
        self.execute(&query).await
    }

    /// Executes a parsed query.
    pub async fn execute(&self, query: &Query) -> MediationResult<QueryResults> {
        let graph = self.working_graph(query).await?;
        evaluate_query(query, &graph)
    }

    /// Builds the working graph of `query`, i.e., the fused triples the sources contribute to it.
    pub async fn working_graph(&self, query: &Query) -> MediationResult<WorkingGraph> {
        let pattern = match query {
            Query::Select { pattern, .. }
            | Query::Construct { pattern, .. }
            | Query::Describe { pattern, .. }
            | Query::Ask { pattern, .. } => pattern,
        };

        let derived = self.resolver.resolve(pattern).await?;
        let derived = resolve_ambiguities(derived, self.ambiguity_resolver.as_ref());
        let mut graph = WorkingGraph::new();
        let fused_entities = fuse(self.oracle.as_ref(), derived, &mut graph)?;
        debug!(
            triples = graph.len(),
            fused_entities, "Built working graph"
        );
        Ok(graph)
    }
}
