//! Entity details: kind detection, annotations, breadcrumb and subclasses.

use super::{EntityRef, sort_by_label, label_or_local_name};
use crate::error::Result;
use crate::gateway::{GraphId, QueryGateway};
use crate::sparql::{FromRow, QueryBuilder, Row, RowError, map_first, map_rows};
use crate::vocab;
use oxigraph::model::NamedNode;
use serde::Serialize;
use std::collections::HashSet;
use strum::{AsRefStr, Display, EnumString};
use tracing::instrument;

/// Upper bound on breadcrumb length.
pub const BREADCRUMB_MAX_HOPS: usize = 20;

/// Upper bound on listed direct subclasses.
pub const SUBCLASS_LIMIT: usize = 50;

/// Kind of an entity, decided by its `rdf:type` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, AsRefStr)]
pub enum EntityKind {
    ConceptScheme,
    Concept,
    Class,
    ObjectProperty,
    DatatypeProperty,
    AnnotationProperty,
    NamedIndividual,
    Unknown,
}

impl EntityKind {
    /// Most specific kind among `types`. SKOS kinds come first since a scheme
    /// may also be declared a class.
    pub fn from_types<'a>(types: impl IntoIterator<Item = &'a str>) -> Self {
        let types: HashSet<&str> = types.into_iter().collect();
        let precedence = [
            (vocab::SKOS_CONCEPT_SCHEME, EntityKind::ConceptScheme),
            (vocab::SKOS_CONCEPT, EntityKind::Concept),
            (vocab::OWL_CLASS, EntityKind::Class),
            (vocab::RDFS_CLASS, EntityKind::Class),
            (vocab::OWL_OBJECT_PROPERTY, EntityKind::ObjectProperty),
            (vocab::OWL_DATATYPE_PROPERTY, EntityKind::DatatypeProperty),
            (vocab::OWL_ANNOTATION_PROPERTY, EntityKind::AnnotationProperty),
            (vocab::OWL_NAMED_INDIVIDUAL, EntityKind::NamedIndividual),
        ];
        precedence
            .into_iter()
            .find(|(iri, _)| types.contains(iri))
            .map(|(_, kind)| kind)
            .unwrap_or(EntityKind::Unknown)
    }

    pub fn is_class(self) -> bool {
        self == EntityKind::Class
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityInfo {
    pub uri: String,
    pub label: String,
    pub prefix_iri: Option<String>,
    pub comment: Option<String>,
    pub entity_kind: EntityKind,
    pub all_types: Vec<EntityRef>,
    pub is_defined_by: Option<String>,
    /// Breadcrumb from the direct parent upwards.
    pub superclasses: Vec<EntityRef>,
    pub subclasses: Vec<EntityRef>,
}

/// An entity reference row: `?uri` with optional `?label` and `?prefixIri`.
pub(crate) struct RefRow(pub(crate) EntityRef);

impl FromRow for RefRow {
    fn from_row(row: &Row) -> std::result::Result<Self, RowError> {
        Ok(RefRow(
            EntityRef::new(row.iri("uri")?, row.text_opt("label"))
                .with_prefix_iri(row.text_opt("prefixIri")),
        ))
    }
}

struct Annotations {
    label: Option<String>,
    comment: Option<String>,
    is_defined_by: Option<String>,
    prefix_iri: Option<String>,
}

impl FromRow for Annotations {
    fn from_row(row: &Row) -> std::result::Result<Self, RowError> {
        Ok(Self {
            label: row.text_opt("label").map(str::to_string),
            comment: row.text_opt("comment").map(str::to_string),
            is_defined_by: row.text_opt("definedBy").map(str::to_string),
            prefix_iri: row.text_opt("prefixIri").map(str::to_string),
        })
    }
}

/// Kind of `entity` within `ontology`; `Unknown` when it has no recognised type.
pub fn detect_entity_kind<G: QueryGateway + ?Sized>(
    gateway: &G,
    ontology: &GraphId,
    entity: &NamedNode,
) -> Result<EntityKind> {
    let query = QueryBuilder::select()
        .distinct()
        .variable("?type")
        .where_clause("?entity a ?type")
        .filter("isIRI(?type)")
        .bind("?entity", entity)
        .build()?;
    let rows = gateway.select(ontology, &query)?;
    Ok(EntityKind::from_types(rows.iter().filter_map(|row| row.iri_opt("type"))))
}

fn annotations<G: QueryGateway + ?Sized>(
    gateway: &G,
    ontology: &GraphId,
    entity: &NamedNode,
) -> Result<Option<Annotations>> {
    let query = QueryBuilder::select()
        .variable("?label")
        .variable("?comment")
        .variable("?definedBy")
        .variable("?prefixIri")
        .optional("?entity rdfs:label ?label")
        .optional("?entity rdfs:comment ?comment")
        .optional("?entity rdfs:isDefinedBy ?definedBy")
        .optional("?entity meta:prefixIRI ?prefixIri")
        .bind("?entity", entity)
        .limit(1)
        .build()?;
    Ok(map_first(&gateway.select(ontology, &query)?)?)
}

/// First IRI parent of `class` by URI order, excluding `class` itself.
fn first_parent<G: QueryGateway + ?Sized>(
    gateway: &G,
    ontology: &GraphId,
    class: &NamedNode,
) -> Result<Option<EntityRef>> {
    let query = QueryBuilder::select()
        .variable("?uri")
        .variable("?label")
        .variable("?prefixIri")
        .where_clause("?class rdfs:subClassOf ?uri")
        .filter("isIRI(?uri) && ?uri != ?class")
        .optional("?uri rdfs:label ?label")
        .optional("?uri meta:prefixIRI ?prefixIri")
        .bind("?class", class)
        .order_by("?uri")
        .limit(1)
        .build()?;
    Ok(map_first::<RefRow>(&gateway.select(ontology, &query)?)?.map(|r| r.0))
}

/// Single-parent walk up from `class`, nearest first.
///
/// Stops at an excluded root, at a class already visited, or after
/// `max_hops` steps.
pub(crate) fn walk_parents<G: QueryGateway + ?Sized>(
    gateway: &G,
    ontology: &GraphId,
    class: &NamedNode,
    max_hops: usize,
) -> Result<Vec<EntityRef>> {
    let mut trail = Vec::new();
    let mut visited: HashSet<String> = HashSet::from([class.as_str().to_string()]);
    let mut current = class.clone();

    for _ in 0..max_hops {
        let Some(parent) = first_parent(gateway, ontology, &current)? else {
            break;
        };
        if vocab::is_excluded_root(&parent.uri) || !visited.insert(parent.uri.clone()) {
            break;
        }
        current = NamedNode::new_unchecked(parent.uri.as_str());
        trail.push(parent);
    }
    Ok(trail)
}

/// Breadcrumb above `class`, at most [`BREADCRUMB_MAX_HOPS`] entries.
pub fn breadcrumb<G: QueryGateway + ?Sized>(
    gateway: &G,
    ontology: &GraphId,
    class: &NamedNode,
) -> Result<Vec<EntityRef>> {
    walk_parents(gateway, ontology, class, BREADCRUMB_MAX_HOPS)
}

fn direct_subclasses<G: QueryGateway + ?Sized>(
    gateway: &G,
    ontology: &GraphId,
    class: &NamedNode,
) -> Result<Vec<EntityRef>> {
    let query = QueryBuilder::select()
        .variable("?uri")
        .sample("?l", "?label")
        .sample("?p", "?prefixIri")
        .where_clause("?uri rdfs:subClassOf ?class")
        .filter("isIRI(?uri) && ?uri != ?class")
        .optional("?uri rdfs:label ?l")
        .optional("?uri meta:prefixIRI ?p")
        .bind("?class", class)
        .group_by("?uri")
        .order_by("?uri")
        .limit(SUBCLASS_LIMIT)
        .build()?;
    let mut subclasses: Vec<EntityRef> = map_rows::<RefRow>(&gateway.select(ontology, &query)?)?
        .into_iter()
        .map(|r| r.0)
        .collect();
    sort_by_label(&mut subclasses, |r| (r.label.as_str(), r.uri.as_str()));
    Ok(subclasses)
}

fn all_types<G: QueryGateway + ?Sized>(
    gateway: &G,
    ontology: &GraphId,
    entity: &NamedNode,
) -> Result<Vec<EntityRef>> {
    let query = QueryBuilder::select()
        .variable("?uri")
        .sample("?l", "?label")
        .sample("?p", "?prefixIri")
        .where_clause("?entity a ?uri")
        .filter("isIRI(?uri)")
        .optional("?uri rdfs:label ?l")
        .optional("?uri meta:prefixIRI ?p")
        .bind("?entity", entity)
        .group_by("?uri")
        .build()?;
    let mut types: Vec<EntityRef> = map_rows::<RefRow>(&gateway.select(ontology, &query)?)?
        .into_iter()
        .map(|r| r.0)
        .collect();
    sort_by_label(&mut types, |r| (r.label.as_str(), r.uri.as_str()));
    Ok(types)
}

/// Everything known about `entity`. An entity absent from the graph comes
/// back as `Unknown` with its local name as label.
#[instrument(skip(gateway, ontology, entity), fields(ontology = %ontology, entity = %entity.as_str()))]
pub fn get_entity_info<G: QueryGateway + ?Sized>(
    gateway: &G,
    ontology: &GraphId,
    entity: &NamedNode,
) -> Result<EntityInfo> {
    let entity_kind = detect_entity_kind(gateway, ontology, entity)?;
    let annotations = annotations(gateway, ontology, entity)?;

    let (superclasses, subclasses) = if entity_kind.is_class() {
        (
            breadcrumb(gateway, ontology, entity)?,
            direct_subclasses(gateway, ontology, entity)?,
        )
    } else {
        (Vec::new(), Vec::new())
    };

    let (label, comment, is_defined_by, prefix_iri) = match annotations {
        Some(a) => (a.label, a.comment, a.is_defined_by, a.prefix_iri),
        None => (None, None, None, None),
    };

    Ok(EntityInfo {
        uri: entity.as_str().to_string(),
        label: label_or_local_name(label.as_deref(), entity.as_str()),
        prefix_iri,
        comment,
        entity_kind,
        all_types: all_types(gateway, ontology, entity)?,
        is_defined_by,
        superclasses,
        subclasses,
    })
}
