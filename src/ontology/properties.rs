//! Properties of a class: declared on it, inherited along its superclass
//! chain, and those that point at it.

use super::entity::{EntityKind, RefRow, detect_entity_kind, walk_parents};
use super::{EntityRef, label_or_local_name, sort_by_label};
use crate::error::Result;
use crate::gateway::{GraphId, QueryGateway};
use crate::sparql::{FromRow, QueryBuilder, RdfValue, Row, RowError, SelectQuery, map_first, map_rows};
use crate::vocab;
use indexmap::{IndexMap, IndexSet};
use oxigraph::model::NamedNode;
use serde::Serialize;
use std::collections::HashSet;
use strum::{AsRefStr, Display, EnumString};
use tracing::{debug, instrument};

/// Upper bound on superclass chain length.
pub const CHAIN_MAX_HOPS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, AsRefStr)]
pub enum PropertyKind {
    ObjectProperty,
    DatatypeProperty,
    AnnotationProperty,
}

impl PropertyKind {
    /// Datatype wins over annotation; anything else is an object property.
    fn from_types<'a>(types: impl IntoIterator<Item = &'a str>) -> Self {
        let mut kind = PropertyKind::ObjectProperty;
        for ty in types {
            match ty {
                vocab::OWL_DATATYPE_PROPERTY => return PropertyKind::DatatypeProperty,
                vocab::OWL_ANNOTATION_PROPERTY => kind = PropertyKind::AnnotationProperty,
                _ => {}
            }
        }
        kind
    }
}

impl From<EntityKind> for PropertyKind {
    fn from(kind: EntityKind) -> Self {
        match kind {
            EntityKind::DatatypeProperty => PropertyKind::DatatypeProperty,
            EntityKind::AnnotationProperty => PropertyKind::AnnotationProperty,
            _ => PropertyKind::ObjectProperty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyInfo {
    pub uri: String,
    pub label: String,
    pub property_kind: PropertyKind,
    pub domains: Vec<EntityRef>,
    pub ranges: Vec<EntityRef>,
}

/// Properties a class picks up from one ancestor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InheritedPropertyGroup {
    pub source_class: EntityRef,
    pub properties: Vec<PropertyInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassProperties {
    pub domain_of: Vec<PropertyInfo>,
    /// Nearest ancestor first.
    pub inherited: Vec<InheritedPropertyGroup>,
    pub range_of: Vec<PropertyInfo>,
}

/// Which end of the property the class sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Domain,
    Range,
}

impl Side {
    /// Anchor pattern and the optional pattern reaching the opposite end.
    fn patterns(self) -> (&'static str, &'static str) {
        match self {
            Side::Domain => (
                "?prop rdfs:domain ?class",
                "?prop rdfs:range ?other \
                 OPTIONAL { ?other rdfs:label ?otherLabel } \
                 OPTIONAL { ?other meta:prefixIRI ?otherPrefix }",
            ),
            Side::Range => (
                "?prop rdfs:range ?class",
                "?prop rdfs:domain ?other \
                 OPTIONAL { ?other rdfs:label ?otherLabel } \
                 OPTIONAL { ?other meta:prefixIRI ?otherPrefix }",
            ),
        }
    }
}

/// One (property, type, opposite end) combination.
struct PropertyRow {
    prop: String,
    label: Option<String>,
    ty: Option<String>,
    other: Option<RdfValue>,
    other_label: Option<String>,
    other_prefix: Option<String>,
}

impl FromRow for PropertyRow {
    fn from_row(row: &Row) -> std::result::Result<Self, RowError> {
        Ok(Self {
            prop: row.iri("prop")?.to_string(),
            label: row.text_opt("label").map(str::to_string),
            ty: row.iri_opt("type").map(str::to_string),
            other: row.get("other").cloned(),
            other_label: row.text_opt("otherLabel").map(str::to_string),
            other_prefix: row.text_opt("otherPrefix").map(str::to_string),
        })
    }
}

fn property_query(side: Side, class: &NamedNode) -> Result<SelectQuery> {
    let (anchor, opposite) = side.patterns();
    Ok(QueryBuilder::select()
        .distinct()
        .variable("?prop")
        .variable("?label")
        .variable("?type")
        .variable("?other")
        .variable("?otherLabel")
        .variable("?otherPrefix")
        .where_clause(anchor)
        .filter("isIRI(?prop)")
        .optional("?prop rdfs:label ?label")
        .optional("?prop a ?type")
        .optional(opposite)
        .bind("?class", class)
        .order_by("?prop")
        .build()?)
}

/// Per-property accumulator while folding rows.
#[derive(Default)]
struct Pending {
    label: Option<String>,
    types: IndexSet<String>,
    others: IndexMap<String, EntityRef>,
    has_blank_other: bool,
}

fn fold_rows(rows: Vec<PropertyRow>) -> IndexMap<String, Pending> {
    let mut pending: IndexMap<String, Pending> = IndexMap::new();
    for row in rows {
        let entry = pending.entry(row.prop).or_default();
        if entry.label.is_none() {
            entry.label = row.label;
        }
        if let Some(ty) = row.ty {
            entry.types.insert(ty);
        }
        match row.other {
            Some(RdfValue::Iri(uri)) => {
                entry.others.entry(uri.clone()).or_insert_with(|| {
                    EntityRef::new(uri, row.other_label.as_deref())
                        .with_prefix_iri(row.other_prefix.as_deref())
                });
            }
            Some(RdfValue::Blank(_)) => entry.has_blank_other = true,
            _ => {}
        }
    }
    pending
}

/// IRI members of `owl:oneOf` lists hanging off blank ranges of `property`.
fn enumerated_ranges<G: QueryGateway + ?Sized>(
    gateway: &G,
    ontology: &GraphId,
    property: &NamedNode,
) -> Result<Vec<EntityRef>> {
    let query = QueryBuilder::select()
        .distinct()
        .variable("?uri")
        .variable("?label")
        .variable("?prefixIri")
        .where_clause("?prop rdfs:range ?range")
        .where_clause("?range owl:oneOf/rdf:rest*/rdf:first ?uri")
        .filter("isBlank(?range) && isIRI(?uri)")
        .optional("?uri rdfs:label ?label")
        .optional("?uri meta:prefixIRI ?prefixIri")
        .bind("?prop", property)
        .order_by("?uri")
        .build()?;

    let mut unique: IndexMap<String, EntityRef> = IndexMap::new();
    for RefRow(entity) in map_rows::<RefRow>(&gateway.select(ontology, &query)?)? {
        unique.entry(entity.uri.clone()).or_insert(entity);
    }
    Ok(unique.into_values().collect())
}

fn sorted(mut refs: Vec<EntityRef>) -> Vec<EntityRef> {
    sort_by_label(&mut refs, |r| (r.label.as_str(), r.uri.as_str()));
    refs
}

/// Properties with `class` on `side`, each carrying `class` as its fixed end.
fn properties_on<G: QueryGateway + ?Sized>(
    gateway: &G,
    ontology: &GraphId,
    class: &EntityRef,
    class_node: &NamedNode,
    side: Side,
) -> Result<Vec<PropertyInfo>> {
    let rows: Vec<PropertyRow> =
        map_rows(&gateway.select(ontology, &property_query(side, class_node)?)?)?;

    let mut properties = Vec::new();
    for (uri, pending) in fold_rows(rows) {
        let mut others: Vec<EntityRef> = pending.others.into_values().collect();
        if side == Side::Domain && others.is_empty() && pending.has_blank_other {
            others = enumerated_ranges(gateway, ontology, &NamedNode::new_unchecked(uri.as_str()))?;
        }
        let others = sorted(others);
        let fixed = vec![class.clone()];
        let (domains, ranges) = match side {
            Side::Domain => (fixed, others),
            Side::Range => (others, fixed),
        };

        properties.push(PropertyInfo {
            label: label_or_local_name(pending.label.as_deref(), &uri),
            property_kind: PropertyKind::from_types(pending.types.iter().map(String::as_str)),
            uri,
            domains,
            ranges,
        });
    }
    sort_by_label(&mut properties, |p| (p.label.as_str(), p.uri.as_str()));
    Ok(properties)
}

/// Reference to `entity` with its label and prefixIRI, if any.
fn entity_ref<G: QueryGateway + ?Sized>(
    gateway: &G,
    ontology: &GraphId,
    entity: &NamedNode,
) -> Result<EntityRef> {
    struct Annotated {
        label: Option<String>,
        prefix_iri: Option<String>,
    }
    impl FromRow for Annotated {
        fn from_row(row: &Row) -> std::result::Result<Self, RowError> {
            Ok(Self {
                label: row.text_opt("label").map(str::to_string),
                prefix_iri: row.text_opt("prefixIri").map(str::to_string),
            })
        }
    }

    let query = QueryBuilder::select()
        .variable("?label")
        .variable("?prefixIri")
        .optional("?entity rdfs:label ?label")
        .optional("?entity meta:prefixIRI ?prefixIri")
        .bind("?entity", entity)
        .limit(1)
        .build()?;
    let annotated = map_first::<Annotated>(&gateway.select(ontology, &query)?)?;
    let (label, prefix_iri) = match annotated {
        Some(a) => (a.label, a.prefix_iri),
        None => (None, None),
    };
    Ok(EntityRef::new(entity.as_str(), label.as_deref()).with_prefix_iri(prefix_iri.as_deref()))
}

/// Linear chain of ancestors above `class`, nearest first, at most
/// [`CHAIN_MAX_HOPS`] entries.
pub fn superclass_chain<G: QueryGateway + ?Sized>(
    gateway: &G,
    ontology: &GraphId,
    class: &NamedNode,
) -> Result<Vec<EntityRef>> {
    walk_parents(gateway, ontology, class, CHAIN_MAX_HOPS)
}

/// Properties declared on `class`, inherited by it, and ranging over it.
#[instrument(skip(gateway, ontology, class), fields(ontology = %ontology, class = %class.as_str()))]
pub fn get_class_properties<G: QueryGateway + ?Sized>(
    gateway: &G,
    ontology: &GraphId,
    class: &NamedNode,
) -> Result<ClassProperties> {
    let class_ref = entity_ref(gateway, ontology, class)?;
    let domain_of = properties_on(gateway, ontology, &class_ref, class, Side::Domain)?;
    let range_of = properties_on(gateway, ontology, &class_ref, class, Side::Range)?;

    let mut seen: HashSet<String> = domain_of.iter().map(|p| p.uri.clone()).collect();
    let mut inherited = Vec::new();
    for ancestor in superclass_chain(gateway, ontology, class)? {
        let node = NamedNode::new_unchecked(ancestor.uri.as_str());
        let properties: Vec<PropertyInfo> =
            properties_on(gateway, ontology, &ancestor, &node, Side::Domain)?
                .into_iter()
                .filter(|p| seen.insert(p.uri.clone()))
                .collect();
        if !properties.is_empty() {
            inherited.push(InheritedPropertyGroup {
                source_class: ancestor,
                properties,
            });
        }
    }

    debug!(
        declared = domain_of.len(),
        inherited_groups = inherited.len(),
        ranging = range_of.len(),
        "resolved class properties"
    );
    Ok(ClassProperties {
        domain_of,
        inherited,
        range_of,
    })
}

fn endpoints<G: QueryGateway + ?Sized>(
    gateway: &G,
    ontology: &GraphId,
    property: &NamedNode,
    predicate: &str,
) -> Result<Vec<EntityRef>> {
    let query = QueryBuilder::select()
        .variable("?uri")
        .sample("?l", "?label")
        .sample("?p", "?prefixIri")
        .where_clause(&format!("?prop {predicate} ?uri"))
        .filter("isIRI(?uri)")
        .optional("?uri rdfs:label ?l")
        .optional("?uri meta:prefixIRI ?p")
        .bind("?prop", property)
        .group_by("?uri")
        .build()?;
    Ok(map_rows::<RefRow>(&gateway.select(ontology, &query)?)?
        .into_iter()
        .map(|r| r.0)
        .collect())
}

/// A single property with its kind, IRI domains and ranges.
#[instrument(skip(gateway, ontology, property), fields(ontology = %ontology, property = %property.as_str()))]
pub fn get_property_info<G: QueryGateway + ?Sized>(
    gateway: &G,
    ontology: &GraphId,
    property: &NamedNode,
) -> Result<PropertyInfo> {
    let property_kind = PropertyKind::from(detect_entity_kind(gateway, ontology, property)?);
    let reference = entity_ref(gateway, ontology, property)?;
    let domains = endpoints(gateway, ontology, property, "rdfs:domain")?;
    let mut ranges = endpoints(gateway, ontology, property, "rdfs:range")?;
    if ranges.is_empty() {
        ranges = enumerated_ranges(gateway, ontology, property)?;
    }

    Ok(PropertyInfo {
        uri: reference.uri,
        label: reference.label,
        property_kind,
        domains: sorted(domains),
        ranges: sorted(ranges),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(prop: &str, ty: Option<&str>, other: Option<RdfValue>) -> PropertyRow {
        PropertyRow {
            prop: prop.to_string(),
            label: None,
            ty: ty.map(str::to_string),
            other,
            other_label: None,
            other_prefix: None,
        }
    }

    #[test]
    fn test_kind_considers_every_type() {
        assert_eq!(
            PropertyKind::from_types([vocab::OWL_OBJECT_PROPERTY, vocab::OWL_DATATYPE_PROPERTY]),
            PropertyKind::DatatypeProperty
        );
        assert_eq!(
            PropertyKind::from_types([vocab::OWL_ANNOTATION_PROPERTY]),
            PropertyKind::AnnotationProperty
        );
        assert_eq!(
            PropertyKind::from_types(["http://www.w3.org/1999/02/22-rdf-syntax-ns#Property"]),
            PropertyKind::ObjectProperty
        );
        assert_eq!(PropertyKind::from_types([]), PropertyKind::ObjectProperty);
    }

    #[test]
    fn test_kind_from_entity_kind() {
        assert_eq!(
            PropertyKind::from(EntityKind::AnnotationProperty),
            PropertyKind::AnnotationProperty
        );
        assert_eq!(PropertyKind::from(EntityKind::Unknown), PropertyKind::ObjectProperty);
    }

    #[test]
    fn test_fold_dedupes_ranges_and_notes_blanks() {
        let folded = fold_rows(vec![
            row("http://ex.org/p", Some(vocab::OWL_OBJECT_PROPERTY), Some(RdfValue::iri("http://ex.org/R"))),
            row("http://ex.org/p", Some(vocab::OWL_DATATYPE_PROPERTY), Some(RdfValue::iri("http://ex.org/R"))),
            row("http://ex.org/q", None, Some(RdfValue::Blank("b0".into()))),
        ]);

        let p = &folded["http://ex.org/p"];
        assert_eq!(p.others.len(), 1);
        assert_eq!(p.types.len(), 2);
        assert!(!p.has_blank_other);

        let q = &folded["http://ex.org/q"];
        assert!(q.others.is_empty());
        assert!(q.has_blank_other);
    }

    #[test]
    fn test_property_query_binds_class() {
        let class = NamedNode::new("http://ex.org/soil#SoilProfile").unwrap();
        let query = property_query(Side::Range, &class).unwrap();
        assert!(query.text().contains("?prop rdfs:range ?class"));
        assert!(query.text().contains("OPTIONAL { ?prop rdfs:domain ?other OPTIONAL { ?other rdfs:label"));
        assert_eq!(query.binding("class"), Some(&class));
    }
}
