//! Vocabularies that are used by the mediator.

pub use oxrdf::vocab::{rdf, rdfs, xsd};

pub mod owl {
    //! [OWL](https://www.w3.org/TR/owl2-overview/) vocabulary.
    use oxrdf::NamedNodeRef;

    /// The class of object properties.
    pub const OBJECT_PROPERTY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#ObjectProperty");
    /// The class of data properties.
    pub const DATATYPE_PROPERTY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#DatatypeProperty");
    /// The class of inverse-functional properties.
    pub const INVERSE_FUNCTIONAL_PROPERTY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#InverseFunctionalProperty");
    /// The property that determines that two given properties are equivalent.
    pub const EQUIVALENT_PROPERTY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#equivalentProperty");
    /// The property that determines that two given classes are equivalent.
    pub const EQUIVALENT_CLASS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#equivalentClass");
    /// The class of OWL classes.
    pub const CLASS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#Class");
}
