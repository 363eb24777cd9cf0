//! The data model of the query mediator.
//!
//! Besides re-exporting the RDF data model of Oxigraph, this crate contains the codec for the
//! three addressing schemes that are used throughout the mediator:
//!
//! - [`PropertyUri`]: `<prefix><db>/<table>#<column>`
//! - [`IndividualUri`]: `<prefix><db>/<table>/<pk-name>.<pk-value>`
//! - [`FederatedIndividualUri`]: `<federated-class>/<db>.<pk-name>.<pk-value>...`

mod error;
mod uri;
pub mod vocab;

pub use error::*;
pub use uri::*;

// Re-export some oxrdf types.
pub use oxiri::Iri;
pub use oxrdf::{
    BlankNode, BlankNodeRef, Graph, IriParseError, Literal, LiteralRef, NamedNode, NamedNodeRef,
    Subject, SubjectRef, Term, TermRef, Triple, TripleRef, Variable, VariableRef,
};
pub use spargebra::term::{NamedNodePattern, TermPattern, TriplePattern};
