//! Abstractions shared by the components of the query mediator.
//!
//! The mediator consumes two kinds of collaborators:
//!
//! - [`SourceLoader`]s extract triples from a single relational source.
//! - An [`OntologyOracle`] answers schema questions about the federated ontology.
//!
//! Sources are registered in a [`SourceRegistry`] under their namespace.

pub mod error;
mod ontology;
mod registry;
mod source;

pub use error::{MediationError, SourceError};
pub use ontology::{ObjectProperty, OntologyOracle};
pub use registry::{RegistryError, SourceDescriptor, SourceRegistry};
pub use source::{ObjectPropertyJoin, RawObject, RawTriple, SourceLoader, SubjectFetch};

pub type MediationResult<T> = Result<T, MediationError>;
