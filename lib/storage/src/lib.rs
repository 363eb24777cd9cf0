//! Concrete collaborators of the query mediator.
//!
//! - [`RelationalSource`] is a [`SourceLoader`](mediator_common::SourceLoader) that answers fetches
//!   by issuing SQL against an Apache DataFusion session.
//! - [`GraphOntology`] is an [`OntologyOracle`](mediator_common::OntologyOracle) backed by an
//!   in-memory RDF graph.

mod error;
mod ontology;
mod relational;

pub use error::LoaderError;
pub use ontology::GraphOntology;
pub use relational::{xsd_datatype, ForeignKey, RelationalSource, TableDescriptor};
