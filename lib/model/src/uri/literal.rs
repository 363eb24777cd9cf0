use oxiri::Iri;

/// Returns `true` if `token` denotes a literal value rather than an IRI.
///
/// A token is a literal if it is quoted, or if it is neither angle-bracketed nor a well-formed
/// absolute IRI. Empty and whitespace-only tokens are never literals.
pub fn is_literal_value(token: &str) -> bool {
    let token = token.trim();
    if token.is_empty() {
        return false;
    }

    let quoted = token.len() >= 2 && token.starts_with('"') && token.ends_with('"');
    if quoted {
        return true;
    }

    let bracketed = token.starts_with('<') && token.ends_with('>');
    !bracketed && Iri::parse(token).is_err()
}
