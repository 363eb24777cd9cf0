mod federated;
mod individual;
mod literal;
mod property;

pub use federated::{FederatedIndividualUri, SourceIdentity};
pub use individual::IndividualUri;
pub use literal::is_literal_value;
pub use property::PropertyUri;

/// Removes surrounding whitespace and angle brackets from `uri`.
pub fn strip_uri(uri: &str) -> &str {
    uri.trim()
        .trim_start_matches('<')
        .trim_end_matches('>')
        .trim()
}

/// Returns `true` if `value` is a non-empty sequence of word characters.
fn is_identifier(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Returns `true` if `value` can be a primary key value of a federated member, i.e., it is
/// non-empty and contains no member separator or IRI delimiter.
fn is_member_value(value: &str) -> bool {
    !value.is_empty()
        && !value
            .chars()
            .any(|c| matches!(c, '.' | '/' | '#' | '<' | '>') || c.is_whitespace())
}

/// Splits `<prefix><db>/<table>` into its three parts.
///
/// The returned prefix keeps its trailing `/`. It must be an absolute `http` or `https` IRI with a
/// non-empty authority.
fn split_table_iri(value: &str) -> Option<(&str, &str, &str)> {
    let (rest, table) = value.rsplit_once('/')?;
    let (before_db, db) = rest.rsplit_once('/')?;
    let prefix = &rest[..=before_db.len()];

    let authority = prefix
        .strip_prefix("http://")
        .or_else(|| prefix.strip_prefix("https://"))?;
    if authority.len() < 2 {
        return None;
    }

    (is_identifier(db) && is_identifier(table)).then_some((prefix, db, table))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_uri_removes_brackets_and_whitespace() {
        assert_eq!(strip_uri(" <http://ex.org/a> "), "http://ex.org/a");
        assert_eq!(strip_uri("http://ex.org/a"), "http://ex.org/a");
    }

    #[test]
    fn split_table_iri_keeps_prefix_slash() {
        assert_eq!(
            split_table_iri("http://www.semanticweb.org/LMS/User"),
            Some(("http://www.semanticweb.org/", "LMS", "User"))
        );
    }

    #[test]
    fn split_table_iri_requires_authority() {
        assert_eq!(split_table_iri("http://LMS/User"), None);
        assert_eq!(split_table_iri("ftp://ex.org/LMS/User"), None);
        assert_eq!(split_table_iri("http://ex.org/LMS/Us-er"), None);
    }
}
