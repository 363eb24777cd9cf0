//! The query engine of the mediator.
//!
//! A query is answered in four steps:
//!
//! 1. The [Resolver] turns every triple pattern of the query into triples derived from the
//!    registered sources.
//! 2. [resolve_ambiguities] merges every (subject, predicate) group with several distinct objects
//!    into a single triple, whose object is reconciled by an [AmbiguityResolver].
//! 3. [fuse] asserts the triples into a [WorkingGraph] and unifies the identities of source
//!    individuals that share an inverse-functional property value.
//! 4. The query is evaluated over the [WorkingGraph] with [evaluate_query].

pub mod ambiguity;
mod fusion;
pub mod resolver;
pub mod results;
pub mod sparql;
mod working_graph;

pub use ambiguity::{resolve_ambiguities, AmbiguityResolver, LevenshteinResolver};
pub use fusion::fuse;
pub use resolver::Resolver;
pub use results::{QueryResults, QuerySolution, QuerySolutions};
pub use sparql::evaluate_query;
pub use working_graph::WorkingGraph;
