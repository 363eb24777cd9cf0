use spargebra::algebra::GraphPattern;
use spargebra::term::TriplePattern;

/// The role of a graph pattern during mediation.
///
/// Only basic graph patterns address the sources. All other operators are traversed, so that the
/// basic graph patterns nested in them are mediated too.
#[derive(Debug, Clone, Copy)]
pub enum AlgebraNode<'a> {
    /// A basic graph pattern. Each triple pattern is resolved.
    Bgp(&'a [TriplePattern]),
    /// An operator with a single input.
    Unary(&'a GraphPattern),
    /// An operator that combines two inputs.
    BinaryJoinLike(&'a GraphPattern, &'a GraphPattern),
    /// A pattern that contains nothing to mediate.
    Leaf,
}

impl<'a> AlgebraNode<'a> {
    pub fn classify(pattern: &'a GraphPattern) -> Self {
        match pattern {
            GraphPattern::Bgp { patterns } => Self::Bgp(patterns),
            GraphPattern::Filter { inner, .. }
            | GraphPattern::Project { inner, .. }
            | GraphPattern::Distinct { inner }
            | GraphPattern::Reduced { inner }
            | GraphPattern::Slice { inner, .. }
            | GraphPattern::OrderBy { inner, .. }
            | GraphPattern::Extend { inner, .. }
            | GraphPattern::Group { inner, .. }
            | GraphPattern::Graph { inner, .. }
            | GraphPattern::Service { inner, .. } => Self::Unary(inner),
            GraphPattern::Join { left, right }
            | GraphPattern::LeftJoin { left, right, .. }
            | GraphPattern::Union { left, right }
            | GraphPattern::Minus { left, right } => Self::BinaryJoinLike(left, right),
            GraphPattern::Values { .. } | GraphPattern::Path { .. } => Self::Leaf,
            #[allow(unreachable_patterns, reason = "LATERAL is behind the sep-0006 feature")]
            _ => Self::Leaf,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spargebra::Query;

    fn pattern(query: &str) -> GraphPattern {
        match Query::parse(query, None).unwrap() {
            Query::Select { pattern, .. } => pattern,
            _ => unreachable!(),
        }
    }

    #[test]
    fn select_is_unary() {
        let pattern = pattern("SELECT ?s WHERE { ?s ?p ?o }");
        let AlgebraNode::Unary(inner) = AlgebraNode::classify(&pattern) else {
            panic!("projection must be unary");
        };
        assert!(matches!(AlgebraNode::classify(inner), AlgebraNode::Bgp(p) if p.len() == 1));
    }

    #[test]
    fn optional_is_binary() {
        let pattern = pattern("SELECT * WHERE { ?s ?p ?o OPTIONAL { ?s ?q ?r } }");
        let AlgebraNode::Unary(inner) = AlgebraNode::classify(&pattern) else {
            panic!("projection must be unary");
        };
        assert!(matches!(
            AlgebraNode::classify(inner),
            AlgebraNode::BinaryJoinLike(..)
        ));
    }

    #[test]
    fn values_is_leaf() {
        let pattern = pattern("SELECT * WHERE { VALUES ?s { <http://ex.org/a> } }");
        let AlgebraNode::Unary(inner) = AlgebraNode::classify(&pattern) else {
            panic!("projection must be unary");
        };
        assert!(matches!(AlgebraNode::classify(inner), AlgebraNode::Leaf));
    }
}
