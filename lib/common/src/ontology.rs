use mediator_model::NamedNode;
use std::collections::HashSet;
use std::fmt::Debug;

/// An object property, as declared by the ontology.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectProperty {
    pub property: NamedNode,
    /// The first declared range. `None` if the property declares no range.
    pub range: Option<NamedNode>,
}

/// Answers schema questions about the federated ontology.
///
/// The oracle is backed by a reasoning-capable store. Implementations must return the same answer
/// for the same question for the lifetime of the oracle.
pub trait OntologyOracle: Debug + Send + Sync {
    /// Returns the properties that are declared `owl:equivalentProperty` to a property whose IRI
    /// starts with `property`.
    fn equivalent_properties(&self, property: &str) -> Vec<NamedNode>;

    /// Returns all properties declared `owl:InverseFunctionalProperty`.
    fn inverse_functional_properties(&self) -> HashSet<NamedNode>;

    /// Returns the (transitive) super classes of `class`, excluding `class` itself.
    fn superclasses(&self, class: &str) -> Vec<NamedNode>;

    /// Returns the object property with the IRI `property`, if it is declared as such.
    fn resolve_object_property(&self, property: &str) -> Option<ObjectProperty>;

    /// Returns all properties that declare `class` as their range.
    fn properties_with_range(&self, class: &str) -> Vec<NamedNode>;

    /// Returns the declared ranges of `property`.
    fn ranges(&self, property: &str) -> Vec<NamedNode>;

    /// Returns the superclasses of `class` that have no superclass themselves.
    fn supreme_superclasses(&self, class: &str) -> Vec<NamedNode> {
        self.superclasses(class)
            .into_iter()
            .filter(|c| self.superclasses(c.as_str()).is_empty())
            .collect()
    }
}
