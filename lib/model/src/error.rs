use std::fmt::{Display, Formatter};

/// The addressing scheme that was expected while decoding a URI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UriKind {
    /// `<prefix><db>/<table>#<column>`
    Property,
    /// `<prefix><db>/<table>/<pk-name>.<pk-value>`
    Individual,
    /// `<federated-class>/<db>.<pk-name>.<pk-value>...`
    FederatedIndividual,
}

impl Display for UriKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            UriKind::Property => f.write_str("property"),
            UriKind::Individual => f.write_str("individual"),
            UriKind::FederatedIndividual => f.write_str("federated individual"),
        }
    }
}

/// An error raised if a URI does not have the shape of the expected addressing scheme.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("'{uri}' is not a valid {kind} URI")]
pub struct UriError {
    kind: UriKind,
    uri: String,
}

impl UriError {
    /// Creates a new [UriError] for a `uri` that should have been of the given `kind`.
    pub fn malformed(kind: UriKind, uri: impl Into<String>) -> Self {
        Self {
            kind,
            uri: uri.into(),
        }
    }

    /// Returns the expected addressing scheme.
    pub fn kind(&self) -> UriKind {
        self.kind
    }

    /// Returns the URI that could not be decoded.
    pub fn uri(&self) -> &str {
        &self.uri
    }
}
