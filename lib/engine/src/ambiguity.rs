//! Reconciliation of conflicting attribute values.
//!
//! Sources that describe the same entity rarely agree on every attribute. Before identity fusion,
//! all derived triples that share a subject and a predicate but disagree on the object are merged
//! into a single triple, whose object is chosen by an [AmbiguityResolver].

use mediator_model::{is_literal_value, strip_uri, Literal, NamedNode, Subject, Term, Triple};
use rustc_hash::FxHashMap;
use std::fmt::Debug;
use tracing::{debug, trace};

/// A strategy for merging two conflicting values.
pub trait AmbiguityResolver: Debug + Send + Sync {
    /// Returns the merged value of `first` and `second`.
    fn resolve(&self, first: &str, second: &str) -> String;
}

/// Prefers the more informative of two similar values and concatenates dissimilar values.
///
/// - If one value contains the other, the containing value wins.
/// - If the edit distance is at most `threshold`, the longer value wins. On equal length, the
///   lexicographically greater value wins.
/// - Otherwise, both values are kept as `"{first}; {second}"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevenshteinResolver {
    threshold: usize,
}

impl LevenshteinResolver {
    pub const DEFAULT_THRESHOLD: usize = 10;

    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }
}

impl Default for LevenshteinResolver {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLD)
    }
}

impl AmbiguityResolver for LevenshteinResolver {
    fn resolve(&self, first: &str, second: &str) -> String {
        if first.contains(second) {
            return first.to_owned();
        }
        if second.contains(first) {
            return second.to_owned();
        }

        if levenshtein(first, second, self.threshold) <= self.threshold {
            let first_len = first.chars().count();
            let second_len = second.chars().count();
            let first_wins = first_len > second_len || (first_len == second_len && first > second);
            return if first_wins { first } else { second }.to_owned();
        }

        format!("{first}; {second}")
    }
}

/// Levenshtein distance over chars with an early-exit cap.
///
/// Returns the exact distance if it is at most `max`, otherwise some value greater than `max`.
fn levenshtein(a: &str, b: &str, max: usize) -> usize {
    let a = a.chars().collect::<Vec<_>>();
    let b = b.chars().collect::<Vec<_>>();
    if a.len().abs_diff(b.len()) > max {
        return max + 1;
    }

    let mut previous = (0..=b.len()).collect::<Vec<_>>();
    let mut current = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        let mut row_min = current[0];
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
            row_min = row_min.min(current[j + 1]);
        }
        if row_min > max {
            return max + 1;
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

/// The string form of a term that is compared by the resolver.
fn value_of(term: &Term) -> &str {
    match term {
        Term::NamedNode(node) => node.as_str(),
        Term::BlankNode(node) => node.as_str(),
        Term::Literal(literal) => literal.value(),
        #[allow(unreachable_patterns, reason = "Only reachable with the rdf-star feature")]
        _ => "",
    }
}

/// Maps a resolved value back to a term.
fn term_for(resolved: String, candidates: &[&Term]) -> Term {
    if let Some(term) = candidates.iter().find(|t| value_of(t) == resolved) {
        return (*term).clone();
    }
    if !is_literal_value(&resolved) {
        if let Ok(node) = NamedNode::new(strip_uri(&resolved)) {
            return node.into();
        }
    }
    Literal::new_simple_literal(resolved).into()
}

/// Merges all triples that share a subject and a predicate but have distinct objects.
///
/// The merged triple takes the position of the first triple of its group. Values are folded
/// left-to-right in first-seen order.
pub fn resolve_ambiguities(derived: Vec<Triple>, resolver: &dyn AmbiguityResolver) -> Vec<Triple> {
    let mut objects: FxHashMap<(&Subject, &NamedNode), Vec<&Term>> =
        FxHashMap::default();
    for triple in &derived {
        let group = objects
            .entry((&triple.subject, &triple.predicate))
            .or_default();
        if !group.contains(&&triple.object) {
            group.push(&triple.object);
        }
    }

    let mut resolved: FxHashMap<(&Subject, &NamedNode), Option<Term>> =
        FxHashMap::default();
    for (key, group) in &objects {
        let Some((first, rest)) = group.split_first() else {
            continue;
        };
        if rest.is_empty() {
            continue;
        }
        let value = rest.iter().fold(value_of(first).to_owned(), |acc, next| {
            resolver.resolve(&acc, value_of(next))
        });
        debug!(
            subject = %key.0,
            predicate = %key.1,
            candidates = group.len(),
            value = %value,
            "Resolved ambiguous values"
        );
        resolved.insert(*key, Some(term_for(value, group)));
    }

    let mut result = Vec::with_capacity(derived.len());
    for triple in &derived {
        match resolved.get_mut(&(&triple.subject, &triple.predicate)) {
            Some(slot) => {
                // Only the first triple of a group is replaced, all others are dropped.
                if let Some(object) = slot.take() {
                    let merged =
                        Triple::new(triple.subject.clone(), triple.predicate.clone(), object);
                    trace!(triple = %merged, "Merged ambiguous triple");
                    result.push(merged);
                }
            }
            None => result.push(triple.clone()),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levenshtein_distance() {
        assert_eq!(levenshtein("kitten", "sitting", 10), 3);
        assert_eq!(levenshtein("", "abc", 10), 3);
        assert_eq!(levenshtein("Alexander Cole", "Alex Cole", 10), 5);
        assert!(levenshtein("Alexander Cole", "Alex Cole", 2) > 2);
    }

    #[test]
    fn resolve_is_idempotent() {
        let resolver = LevenshteinResolver::default();
        assert_eq!(resolver.resolve("Alice", "Alice"), "Alice");
    }

    #[test]
    fn containing_value_wins() {
        let resolver = LevenshteinResolver::default();
        assert_eq!(
            resolver.resolve("Alexander Cole", "Alexander"),
            "Alexander Cole"
        );
        assert_eq!(
            resolver.resolve("Alexander", "Alexander Cole"),
            "Alexander Cole"
        );
    }

    #[test]
    fn similar_values_keep_the_longer() {
        let resolver = LevenshteinResolver::default();
        assert_eq!(
            resolver.resolve("Alexander Cole", "Alex Cole"),
            "Alexander Cole"
        );
    }

    #[test]
    fn dissimilar_values_are_concatenated() {
        let resolver = LevenshteinResolver::new(2);
        assert_eq!(
            resolver.resolve("Alexander Cole", "Alex Cole"),
            "Alexander Cole; Alex Cole"
        );
    }

    #[test]
    fn default_strategy_is_symmetric() {
        let resolver = LevenshteinResolver::default();
        for (a, b) in [
            ("Bob", "Rob"),
            ("Alexander Cole", "Alex Cole"),
            ("abc", "abd"),
        ] {
            assert_eq!(resolver.resolve(a, b), resolver.resolve(b, a));
        }
    }

    fn triple(subject: &str, predicate: &str, object: impl Into<Term>) -> Triple {
        Triple::new(
            NamedNode::new_unchecked(subject),
            NamedNode::new_unchecked(predicate),
            object,
        )
    }

    #[test]
    fn conflicting_objects_are_merged_in_place() {
        let derived = vec![
            triple("http://ex.org/a", "http://ex.org/name", Literal::from("Alex Cole")),
            triple("http://ex.org/a", "http://ex.org/age", Literal::from(42)),
            triple("http://ex.org/a", "http://ex.org/name", Literal::from("Alexander Cole")),
        ];
        let result = resolve_ambiguities(derived, &LevenshteinResolver::default());
        assert_eq!(
            result,
            vec![
                triple("http://ex.org/a", "http://ex.org/name", Literal::from("Alexander Cole")),
                triple("http://ex.org/a", "http://ex.org/age", Literal::from(42)),
            ]
        );
    }

    #[test]
    fn concatenated_values_become_plain_literals() {
        let derived = vec![
            triple("http://ex.org/a", "http://ex.org/name", Literal::from("Alexander Cole")),
            triple("http://ex.org/a", "http://ex.org/name", Literal::from("Alex Cole")),
        ];
        let result = resolve_ambiguities(derived, &LevenshteinResolver::new(2));
        assert_eq!(
            result,
            vec![triple(
                "http://ex.org/a",
                "http://ex.org/name",
                Literal::new_simple_literal("Alexander Cole; Alex Cole")
            )]
        );
    }

    #[test]
    fn duplicates_are_not_ambiguous() {
        let derived = vec![
            triple("http://ex.org/a", "http://ex.org/name", Literal::from("Alice")),
            triple("http://ex.org/a", "http://ex.org/name", Literal::from("Alice")),
            triple("http://ex.org/b", "http://ex.org/name", Literal::from("Bob")),
        ];
        let result = resolve_ambiguities(derived.clone(), &LevenshteinResolver::default());
        assert_eq!(result, derived);
    }
}
