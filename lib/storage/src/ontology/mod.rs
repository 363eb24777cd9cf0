mod closure;

use crate::LoaderError;
use itertools::Itertools;
use mediator_common::{ObjectProperty, OntologyOracle};
use mediator_model::vocab::{owl, rdf, rdfs};
use mediator_model::{strip_uri, Graph, NamedNode, NamedNodeRef, SubjectRef, TermRef, TripleRef};
use oxrdfio::{RdfFormat, RdfParser};
use std::cmp::Reverse;
use std::collections::HashSet;
use std::io::Read;
use tracing::debug;

/// An [OntologyOracle] over an in-memory RDF graph.
///
/// Super classes are returned from the most to the least specific class, so the first shared
/// super class of two classes is their most specific common ancestor.
///
/// The graph is closed under the transitivity of `rdfs:subClassOf` and `rdfs:subPropertyOf` and
/// the symmetry of `owl:equivalentProperty` once, when the ontology is created. Afterward, the
/// ontology is immutable.
#[derive(Debug, Clone)]
pub struct GraphOntology {
    graph: Graph,
}

impl GraphOntology {
    /// Creates a new ontology from the asserted triples in `graph`.
    pub fn new(mut graph: Graph) -> Self {
        let asserted = graph.len();
        closure::materialize(&mut graph);
        debug!(
            asserted,
            inferred = graph.len() - asserted,
            "Materialized ontology closure"
        );
        Self { graph }
    }

    /// Parses an ontology serialized in `format`. Graph names are ignored.
    ///
    /// Usage example:
    /// ```
    /// use mediator_storage::GraphOntology;
    /// use mediator_common::OntologyOracle;
    /// use oxrdfio::RdfFormat;
    ///
    /// let file = "<http://ex.org/KMS/User> <http://www.w3.org/2000/01/rdf-schema#subClassOf> <http://ex.org/FEDERATED/Person> .";
    /// let ontology = GraphOntology::from_reader(RdfFormat::NTriples, None, file.as_bytes())?;
    /// assert_eq!(ontology.superclasses("http://ex.org/KMS/User").len(), 1);
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn from_reader(
        format: RdfFormat,
        base_iri: Option<&str>,
        reader: impl Read,
    ) -> Result<Self, LoaderError> {
        let mut parser = RdfParser::from_format(format);
        if let Some(base_iri) = base_iri {
            parser = parser
                .with_base_iri(base_iri)
                .map_err(|error| LoaderError::InvalidBaseIri {
                    iri: base_iri.to_owned(),
                    error,
                })?;
        }

        let mut graph = Graph::new();
        for quad in parser.for_reader(reader) {
            let quad = quad?;
            graph.insert(TripleRef::new(&quad.subject, &quad.predicate, &quad.object));
        }
        Ok(Self::new(graph))
    }

    /// Returns the graph, including the inferred triples.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    fn named_objects<'a>(
        &'a self,
        subject: NamedNodeRef<'a>,
        predicate: NamedNodeRef<'a>,
    ) -> impl Iterator<Item = NamedNode> + 'a {
        self.graph
            .objects_for_subject_predicate(subject, predicate)
            .filter_map(|object| match object {
                TermRef::NamedNode(node) => Some(node.into_owned()),
                _ => None,
            })
    }

    fn strict_superclasses<'a>(
        &'a self,
        class: NamedNodeRef<'a>,
    ) -> impl Iterator<Item = NamedNode> + 'a {
        self.named_objects(class, rdfs::SUB_CLASS_OF)
            .filter(move |superclass| superclass.as_ref() != class)
    }

    fn named_subjects<'a>(
        &'a self,
        predicate: NamedNodeRef<'a>,
        object: NamedNodeRef<'a>,
    ) -> impl Iterator<Item = NamedNode> + 'a {
        self.graph
            .subjects_for_predicate_object(predicate, object)
            .filter_map(|subject| match subject {
                SubjectRef::NamedNode(node) => Some(node.into_owned()),
                _ => None,
            })
    }
}

/// Parses `value` as a named node. Invalid IRIs match nothing in the ontology.
fn as_named_node(value: &str) -> Option<NamedNodeRef<'_>> {
    NamedNodeRef::new(strip_uri(value)).ok()
}

impl OntologyOracle for GraphOntology {
    fn equivalent_properties(&self, property: &str) -> Vec<NamedNode> {
        let prefix = strip_uri(property);
        self.graph
            .triples_for_predicate(owl::EQUIVALENT_PROPERTY)
            .filter_map(|triple| match (triple.subject, triple.object) {
                (SubjectRef::NamedNode(subject), TermRef::NamedNode(object))
                    if subject.as_str().starts_with(prefix) && subject != object =>
                {
                    Some(object.into_owned())
                }
                _ => None,
            })
            .sorted()
            .dedup()
            .collect()
    }

    fn inverse_functional_properties(&self) -> HashSet<NamedNode> {
        self.named_subjects(rdf::TYPE, owl::INVERSE_FUNCTIONAL_PROPERTY)
            .collect()
    }

    fn superclasses(&self, class: &str) -> Vec<NamedNode> {
        let Some(class) = as_named_node(class) else {
            return Vec::new();
        };
        self.strict_superclasses(class)
            .sorted_by_cached_key(|superclass| {
                let depth = self.strict_superclasses(superclass.as_ref()).count();
                (Reverse(depth), superclass.clone())
            })
            .collect()
    }

    fn resolve_object_property(&self, property: &str) -> Option<ObjectProperty> {
        let property = as_named_node(property)?;
        if !self
            .graph
            .contains(TripleRef::new(property, rdf::TYPE, owl::OBJECT_PROPERTY))
        {
            return None;
        }
        Some(ObjectProperty {
            property: property.into_owned(),
            range: self.ranges(property.as_str()).into_iter().next(),
        })
    }

    fn properties_with_range(&self, class: &str) -> Vec<NamedNode> {
        let Some(class) = as_named_node(class) else {
            return Vec::new();
        };
        self.named_subjects(rdfs::RANGE, class).sorted().collect()
    }

    fn ranges(&self, property: &str) -> Vec<NamedNode> {
        let Some(property) = as_named_node(property) else {
            return Vec::new();
        };
        self.named_objects(property, rdfs::RANGE).sorted().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONTOLOGY: &str = r#"
        @prefix owl: <http://www.w3.org/2002/07/owl#> .
        @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
        @prefix fed: <http://ex.org/FEDERATED/> .
        @prefix kms: <http://ex.org/KMS/> .
        @prefix lms: <http://ex.org/LMS/> .

        fed:Person a owl:Class .
        fed:User a owl:Class ; rdfs:subClassOf fed:Person .
        kms:User rdfs:subClassOf fed:User .
        lms:Account rdfs:subClassOf fed:User .

        <http://ex.org/FEDERATED/User#email> owl:equivalentProperty <http://ex.org/KMS/User#EMAIL> .
        <http://ex.org/LMS/Account#MAIL> owl:equivalentProperty <http://ex.org/FEDERATED/User#email> .

        <http://ex.org/KMS/User#EMAIL> a owl:InverseFunctionalProperty .
        <http://ex.org/LMS/Account#MAIL> a owl:InverseFunctionalProperty .

        <http://ex.org/KMS/User#Course> a owl:ObjectProperty ;
            rdfs:range kms:Course .
        <http://ex.org/KMS/User#NAME> a owl:DatatypeProperty .
    "#;

    fn ontology() -> GraphOntology {
        GraphOntology::from_reader(RdfFormat::Turtle, None, ONTOLOGY.as_bytes()).unwrap()
    }

    #[test]
    fn superclasses_are_transitive() {
        let superclasses = ontology().superclasses("<http://ex.org/KMS/User>");
        assert_eq!(
            superclasses,
            vec![
                NamedNode::new_unchecked("http://ex.org/FEDERATED/User"),
                NamedNode::new_unchecked("http://ex.org/FEDERATED/Person"),
            ]
        );
    }

    #[test]
    fn supreme_superclasses_have_no_superclass() {
        let supreme = ontology().supreme_superclasses("http://ex.org/KMS/User");
        assert_eq!(
            supreme,
            vec![NamedNode::new_unchecked("http://ex.org/FEDERATED/Person")]
        );
    }

    #[test]
    fn equivalent_properties_are_symmetric() {
        let properties = ontology().equivalent_properties("http://ex.org/FEDERATED/User#email");
        assert_eq!(
            properties,
            vec![
                NamedNode::new_unchecked("http://ex.org/KMS/User#EMAIL"),
                NamedNode::new_unchecked("http://ex.org/LMS/Account#MAIL"),
            ]
        );
    }

    #[test]
    fn inverse_functional_properties_are_declared() {
        let ifps = ontology().inverse_functional_properties();
        assert_eq!(ifps.len(), 2);
        assert!(ifps.contains(&NamedNode::new_unchecked("http://ex.org/KMS/User#EMAIL")));
    }

    #[test]
    fn object_property_has_first_range() {
        let ontology = ontology();
        let property = ontology
            .resolve_object_property("http://ex.org/KMS/User#Course")
            .unwrap();
        assert_eq!(
            property.range,
            Some(NamedNode::new_unchecked("http://ex.org/KMS/Course"))
        );
        assert!(ontology
            .resolve_object_property("http://ex.org/KMS/User#NAME")
            .is_none());
    }

    #[test]
    fn properties_with_range_are_found() {
        assert_eq!(
            ontology().properties_with_range("http://ex.org/KMS/Course"),
            vec![NamedNode::new_unchecked("http://ex.org/KMS/User#Course")]
        );
    }

    #[test]
    fn invalid_iris_match_nothing() {
        let ontology = ontology();
        assert!(ontology.superclasses("not an iri").is_empty());
        assert!(ontology.ranges("").is_empty());
    }
}
