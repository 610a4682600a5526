//! Vocabulary IRIs used by the introspection queries.
//!
//! Query text is assembled from these constants and from fixed templates only.
//! Caller supplied identifiers never appear here; they travel as variable
//! bindings on [`crate::sparql::SelectQuery`].

use oxigraph::model::NamedNode;
use once_cell::sync::Lazy;

// =============================================================================
// Namespaces
// =============================================================================

pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const OWL: &str = "http://www.w3.org/2002/07/owl#";
pub const SKOS: &str = "http://www.w3.org/2004/02/skos/core#";
/// OntoPortal / BioPortal metadata namespace (`prefixIRI` annotations).
pub const PORTAL_META: &str = "http://data.bioontology.org/metadata/";
/// Namespace of the predicates stored in the meta graph.
pub const AIT: &str = "urn:ait:ontology#";

/// Named graph holding per-ontology settings and stored prefixes.
pub const META_GRAPH: &str = "urn:ait:meta";

/// Predicate stem for stored prefix bindings: `<ontology> <urn:ait:ontology#prefix/PFX> "namespace"`.
pub const AIT_PREFIX_STEM: &str = "urn:ait:ontology#prefix/";

// =============================================================================
// Terms
// =============================================================================

pub const OWL_CLASS: &str = "http://www.w3.org/2002/07/owl#Class";
pub const OWL_THING: &str = "http://www.w3.org/2002/07/owl#Thing";
pub const OWL_NOTHING: &str = "http://www.w3.org/2002/07/owl#Nothing";
pub const OWL_OBJECT_PROPERTY: &str = "http://www.w3.org/2002/07/owl#ObjectProperty";
pub const OWL_DATATYPE_PROPERTY: &str = "http://www.w3.org/2002/07/owl#DatatypeProperty";
pub const OWL_ANNOTATION_PROPERTY: &str = "http://www.w3.org/2002/07/owl#AnnotationProperty";
pub const OWL_NAMED_INDIVIDUAL: &str = "http://www.w3.org/2002/07/owl#NamedIndividual";
pub const RDFS_CLASS: &str = "http://www.w3.org/2000/01/rdf-schema#Class";
pub const RDFS_RESOURCE: &str = "http://www.w3.org/2000/01/rdf-schema#Resource";
pub const SKOS_CONCEPT_SCHEME: &str = "http://www.w3.org/2004/02/skos/core#ConceptScheme";
pub const SKOS_CONCEPT: &str = "http://www.w3.org/2004/02/skos/core#Concept";

pub const AIT_SELECTED_NAMESPACE: &str = "urn:ait:ontology#selectedNamespace";
pub const AIT_DISPLAY_NAME_MODE: &str = "urn:ait:ontology#displayNameMode";
pub const AIT_SHOW_DEPRECATED: &str = "urn:ait:ontology#showDeprecated";

/// Implicit roots and meta-classes that never appear as hierarchy nodes or parents.
pub const EXCLUDED_ROOTS: [&str; 5] = [OWL_THING, OWL_NOTHING, RDFS_RESOURCE, RDFS_CLASS, OWL_CLASS];

pub fn is_excluded_root(iri: &str) -> bool {
    EXCLUDED_ROOTS.contains(&iri)
}

pub static META_GRAPH_NODE: Lazy<NamedNode> = Lazy::new(|| NamedNode::new_unchecked(META_GRAPH));
pub static SELECTED_NAMESPACE: Lazy<NamedNode> =
    Lazy::new(|| NamedNode::new_unchecked(AIT_SELECTED_NAMESPACE));
pub static DISPLAY_NAME_MODE: Lazy<NamedNode> =
    Lazy::new(|| NamedNode::new_unchecked(AIT_DISPLAY_NAME_MODE));
pub static SHOW_DEPRECATED: Lazy<NamedNode> =
    Lazy::new(|| NamedNode::new_unchecked(AIT_SHOW_DEPRECATED));

/// Standard `PREFIX` declarations shared by every introspection query.
pub const QUERY_PREFIXES: [(&str, &str); 6] = [
    ("rdf", RDF),
    ("rdfs", RDFS),
    ("owl", OWL),
    ("skos", SKOS),
    ("meta", PORTAL_META),
    ("ait", AIT),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excluded_roots_cover_meta_classes() {
        assert!(is_excluded_root(OWL_THING));
        assert!(is_excluded_root("http://www.w3.org/2000/01/rdf-schema#Class"));
        assert!(!is_excluded_root("http://example.org/soil#SoilProfile"));
    }

    #[test]
    fn prefix_constants_are_namespaces_of_their_terms() {
        assert!(OWL_CLASS.starts_with(OWL));
        assert!(SKOS_CONCEPT.starts_with(SKOS));
        assert!(AIT_SHOW_DEPRECATED.starts_with(AIT));
        assert!(AIT_PREFIX_STEM.starts_with(AIT));
        assert_eq!(META_GRAPH_NODE.as_str(), META_GRAPH);
    }
}
