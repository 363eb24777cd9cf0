use crate::uri::{is_identifier, is_member_value, strip_uri};
use crate::{IndividualUri, UriError, UriKind};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The identity of a row within one source: `<db>.<pk-name>.<pk-value>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourceIdentity {
    db_name: String,
    pk_name: String,
    pk_value: String,
}

impl SourceIdentity {
    pub fn new(
        db_name: impl Into<String>,
        pk_name: impl Into<String>,
        pk_value: impl Into<String>,
    ) -> Self {
        Self {
            db_name: db_name.into(),
            pk_name: pk_name.into(),
            pk_value: pk_value.into(),
        }
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }

    pub fn pk_name(&self) -> &str {
        &self.pk_name
    }

    pub fn pk_value(&self) -> &str {
        &self.pk_value
    }
}

impl Display for SourceIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.db_name, self.pk_name, self.pk_value)
    }
}

/// An individual of the federated schema.
///
/// The URI is the IRI of a federated class (the *stem*) followed by the identities of all source
/// rows that describe the individual, in the order in which they were discovered:
/// `<stem>/<db1>.<pk1>.<value1>.<db2>.<pk2>.<value2>`.
///
/// These identifiers are synthesized while answering a single query. They are not stable across
/// runs, as adding a source may change the set of fused rows.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FederatedIndividualUri {
    stem: String,
    members: Vec<SourceIdentity>,
}

impl FederatedIndividualUri {
    /// Creates a new [FederatedIndividualUri] for the given federated class and source identities.
    pub fn new(stem: impl Into<String>, members: Vec<SourceIdentity>) -> Self {
        Self {
            stem: stem.into(),
            members,
        }
    }

    /// Creates the federated counterpart of a single source individual.
    pub fn for_individual(stem: impl Into<String>, individual: &IndividualUri) -> Self {
        Self::new(stem, vec![individual.identity()])
    }

    /// Decodes a federated individual URI.
    ///
    /// Every member must consist of three dot-separated segments. Database and primary key names
    /// are word segments. Primary key values may contain other characters, but primary key values
    /// that contain dots can not be decoded, even though they can be encoded.
    pub fn parse(uri: &str) -> Result<Self, UriError> {
        let value = strip_uri(uri);
        let malformed = || UriError::malformed(UriKind::FederatedIndividual, value);

        let (stem, members) = value.rsplit_once('/').ok_or_else(malformed)?;
        if !stem.contains("://") || stem.contains('#') {
            return Err(malformed());
        }

        let segments = members.split('.').collect::<Vec<_>>();
        if segments.len() % 3 != 0 {
            return Err(malformed());
        }
        let valid = segments.chunks_exact(3).all(|chunk| {
            is_identifier(chunk[0]) && is_identifier(chunk[1]) && is_member_value(chunk[2])
        });
        if !valid {
            return Err(malformed());
        }

        let members = segments
            .chunks_exact(3)
            .map(|chunk| SourceIdentity::new(chunk[0], chunk[1], chunk[2]))
            .collect();
        Ok(Self::new(stem, members))
    }

    /// Returns the IRI of the federated class.
    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn members(&self) -> &[SourceIdentity] {
        &self.members
    }

    /// Returns the identity of this individual within the source `db_name`, if it has one.
    pub fn identity_for(&self, db_name: &str) -> Option<&SourceIdentity> {
        self.members.iter().find(|m| m.db_name == db_name)
    }
}

impl Display for FederatedIndividualUri {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/", self.stem)?;
        for (i, member) in self.members.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{member}")?;
        }
        Ok(())
    }
}

impl FromStr for FederatedIndividualUri {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
