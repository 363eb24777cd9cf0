//! Errors raised by the mediator.

pub use mediator_common::{MediationError, RegistryError, SourceError};
pub use mediator_model::UriError;
pub use mediator_storage::LoaderError;
