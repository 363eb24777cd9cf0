use crate::SourceLoader;
use mediator_model::strip_uri;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// An error raised while registering a source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum RegistryError {
    /// Two sources share the same namespace.
    #[error("A source with the namespace {0} is already registered")]
    DuplicateNamespace(String),
    /// The namespace does not end with the database name of the loader.
    #[error("The namespace {namespace} does not end with the database segment '{database}/'")]
    NamespaceMismatch {
        /// The namespace of the source.
        namespace: String,
        /// The database name of the loader.
        database: String,
    },
}

/// A relational source, registered under its namespace.
///
/// The namespace of a source is `<prefix><database>/`. All individual and property URIs of the
/// source start with it.
#[derive(Clone)]
pub struct SourceDescriptor {
    namespace: String,
    prefix: String,
    loader: Arc<dyn SourceLoader>,
}

impl SourceDescriptor {
    /// Creates a new descriptor.
    ///
    /// Returns an error if `namespace` does not end with the database name of `loader`.
    pub fn new(
        namespace: impl Into<String>,
        loader: Arc<dyn SourceLoader>,
    ) -> Result<Self, RegistryError> {
        let namespace = namespace.into();
        let database = loader.database_name().to_owned();
        let prefix = namespace
            .strip_suffix('/')
            .and_then(|rest| rest.strip_suffix(database.as_str()))
            .filter(|prefix| prefix.ends_with('/'))
            .map(str::to_owned)
            .ok_or_else(|| RegistryError::NamespaceMismatch {
                namespace: namespace.clone(),
                database,
            })?;
        Ok(Self {
            namespace,
            prefix,
            loader,
        })
    }

    /// The namespace, `<prefix><database>/`.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The namespace without the database segment.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn database(&self) -> &str {
        self.loader.database_name()
    }

    pub fn loader(&self) -> &Arc<dyn SourceLoader> {
        &self.loader
    }
}

impl Debug for SourceDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceDescriptor")
            .field("namespace", &self.namespace)
            .field("database", &self.database())
            .finish()
    }
}

/// Maps URIs to the source that owns them.
///
/// The registry is populated once at startup and is read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<SourceDescriptor>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new source.
    pub fn register(&mut self, source: SourceDescriptor) -> Result<(), RegistryError> {
        if self
            .sources
            .iter()
            .any(|s| s.namespace == source.namespace)
        {
            return Err(RegistryError::DuplicateNamespace(source.namespace));
        }
        self.sources.push(source);
        Ok(())
    }

    /// Builder-style variant of [Self::register].
    pub fn with_source(
        mut self,
        namespace: impl Into<String>,
        loader: Arc<dyn SourceLoader>,
    ) -> Result<Self, RegistryError> {
        self.register(SourceDescriptor::new(namespace, loader)?)?;
        Ok(self)
    }

    /// Returns the source whose namespace is the longest prefix of `uri`.
    ///
    /// Returns `None` if the URI belongs to the federated schema.
    pub fn classify(&self, uri: &str) -> Option<&SourceDescriptor> {
        let uri = strip_uri(uri);
        self.sources
            .iter()
            .filter(|s| uri.starts_with(s.namespace.as_str()))
            .max_by_key(|s| s.namespace.len())
    }

    /// Returns the source with the given database name.
    pub fn by_database(&self, database: &str) -> Option<&SourceDescriptor> {
        self.sources.iter().find(|s| s.database() == database)
    }

    /// Returns all sources in registration order.
    pub fn sources(&self) -> &[SourceDescriptor] {
        &self.sources
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ObjectPropertyJoin, RawTriple, SourceError, SubjectFetch};
    use async_trait::async_trait;

    #[derive(Debug)]
    struct EmptyLoader(&'static str);

    #[async_trait]
    impl SourceLoader for EmptyLoader {
        fn database_name(&self) -> &str {
            self.0
        }

        async fn list_tables(&self) -> Result<Vec<String>, SourceError> {
            Ok(Vec::new())
        }

        async fn primary_key(&self, table: &str) -> Result<String, SourceError> {
            Err(SourceError::UnknownTable(table.to_owned()))
        }

        async fn foreign_key_referencing(
            &self,
            _table: &str,
            _referenced_table: &str,
        ) -> Result<Option<String>, SourceError> {
            Ok(None)
        }

        async fn fetch_for_subject(
            &self,
            _prefix: &str,
            _fetch: &SubjectFetch,
        ) -> Result<Vec<RawTriple>, SourceError> {
            Ok(Vec::new())
        }

        async fn fetch_for_predicate_object(
            &self,
            _prefix: &str,
            _table: &str,
            _column: &str,
            _object: Option<&str>,
        ) -> Result<Vec<RawTriple>, SourceError> {
            Ok(Vec::new())
        }

        async fn fetch_for_object_property_join(
            &self,
            _prefix: &str,
            _join: &ObjectPropertyJoin,
        ) -> Result<Vec<RawTriple>, SourceError> {
            Ok(Vec::new())
        }
    }

    fn registry() -> SourceRegistry {
        SourceRegistry::new()
            .with_source("http://ex.org/KMS/", Arc::new(EmptyLoader("KMS")))
            .unwrap()
            .with_source("http://ex.org/KMS2/", Arc::new(EmptyLoader("KMS2")))
            .unwrap()
            .with_source("http://ex.org/KMS/Archive/", Arc::new(EmptyLoader("Archive")))
            .unwrap()
    }

    #[test]
    fn descriptor_derives_prefix() {
        let descriptor =
            SourceDescriptor::new("http://ex.org/KMS/", Arc::new(EmptyLoader("KMS"))).unwrap();
        assert_eq!(descriptor.prefix(), "http://ex.org/");
        assert_eq!(descriptor.database(), "KMS");
    }

    #[test]
    fn descriptor_rejects_foreign_database() {
        let result = SourceDescriptor::new("http://ex.org/LMS/", Arc::new(EmptyLoader("KMS")));
        assert!(matches!(
            result,
            Err(RegistryError::NamespaceMismatch { .. })
        ));
    }

    #[test]
    fn duplicate_namespace_is_rejected() {
        let result = registry().with_source("http://ex.org/KMS/", Arc::new(EmptyLoader("KMS")));
        assert_eq!(
            result.unwrap_err(),
            RegistryError::DuplicateNamespace("http://ex.org/KMS/".to_owned())
        );
    }

    #[test]
    fn classify_strips_brackets() {
        let registry = registry();
        let source = registry.classify(" <http://ex.org/KMS/User/ID.1> ").unwrap();
        assert_eq!(source.namespace(), "http://ex.org/KMS/");
    }

    #[test]
    fn classify_prefers_longest_namespace() {
        let registry = registry();
        assert_eq!(
            registry
                .classify("http://ex.org/KMS2/User/ID.1")
                .unwrap()
                .namespace(),
            "http://ex.org/KMS2/"
        );
        assert_eq!(
            registry
                .classify("http://ex.org/KMS/Archive/User#NAME")
                .unwrap()
                .namespace(),
            "http://ex.org/KMS/Archive/"
        );
    }

    #[test]
    fn classify_is_deterministic() {
        let registry = registry();
        let uri = "http://ex.org/KMS/User#EMAIL";
        let first = registry.classify(uri).map(SourceDescriptor::namespace);
        for _ in 0..10 {
            assert_eq!(registry.classify(uri).map(SourceDescriptor::namespace), first);
        }
    }

    #[test]
    fn federated_uris_are_not_classified() {
        let registry = registry();
        assert!(registry.classify("http://ex.org/FEDERATED/User#EMAIL").is_none());
        assert!(registry.classify("\"alice@x.org\"").is_none());
    }
}
