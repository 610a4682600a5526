// =============================================================================
// Class hierarchy
// =============================================================================
// One bulk query, then in-memory assembly: nodes with every direct parent,
// namespace classification, promotion of external ancestors of internal
// classes, deprecation filtering and label ordering.

use super::entity::EntityKind;
use super::namespace::{classify, namespace};
use super::settings::load_config;
use super::{label_or_local_name, sort_by_label};
use crate::error::Result;
use crate::gateway::{GraphId, QueryGateway};
use crate::sparql::{FromRow, QueryBuilder, RdfValue, Row, RowError, map_rows};
use crate::vocab;
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, instrument};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HierarchyNode {
    pub uri: String,
    pub label: String,
    pub prefix_iri: Option<String>,
    pub entity_kind: EntityKind,
    /// Direct parents in discovery order. Never the node itself, never an excluded root.
    pub parent_uris: IndexSet<String>,
    pub is_external: bool,
    pub is_deprecated: bool,
}

/// One row of the bulk query; a class appears once per (label, prefixIRI, parent, deprecated) combination.
struct ClassRow {
    class: RdfValue,
    label: Option<String>,
    prefix_iri: Option<String>,
    parent: Option<RdfValue>,
    deprecated: Option<String>,
}

impl FromRow for ClassRow {
    fn from_row(row: &Row) -> std::result::Result<Self, RowError> {
        Ok(Self {
            class: row.value("class")?.clone(),
            label: row.text_opt("label").map(str::to_string),
            prefix_iri: row.text_opt("prefixIri").map(str::to_string),
            parent: row.get("parent").cloned(),
            deprecated: row.get("deprecated").map(|v| v.as_str().to_string()),
        })
    }
}

fn class_query() -> Result<crate::sparql::SelectQuery> {
    Ok(QueryBuilder::select()
        .distinct()
        .variable("?class")
        .variable("?label")
        .variable("?prefixIri")
        .variable("?parent")
        .variable("?deprecated")
        .where_clause("{ ?class a owl:Class } UNION { ?class a rdfs:Class }")
        .optional("?class rdfs:label ?label")
        .optional("?class meta:prefixIRI ?prefixIri")
        .optional("?class owl:deprecated ?deprecated")
        .optional("?class rdfs:subClassOf ?parent . FILTER(isIRI(?parent))")
        .build()?)
}

/// Flat list of every class in `ontology`, ordered by lowercased label.
///
/// Uses the stored namespace selection when one exists, otherwise detects
/// internal namespaces with `threshold`. An empty or unknown graph yields an
/// empty list.
#[instrument(skip(gateway, ontology), fields(ontology = %ontology))]
pub fn build_hierarchy<G: QueryGateway + ?Sized>(
    gateway: &G,
    ontology: &GraphId,
    threshold: f64,
) -> Result<Vec<HierarchyNode>> {
    let config = load_config(gateway, ontology)?;
    let rows: Vec<ClassRow> = map_rows(&gateway.select(ontology, &class_query()?)?)?;

    let mut nodes: IndexMap<String, HierarchyNode> = IndexMap::new();
    let mut children: IndexMap<String, IndexSet<String>> = IndexMap::new();

    for row in rows {
        let RdfValue::Iri(class_uri) = row.class else {
            continue;
        };
        if vocab::is_excluded_root(&class_uri) {
            continue;
        }

        let deprecated = row
            .deprecated
            .as_deref()
            .is_some_and(|flag| flag.eq_ignore_ascii_case("true"));

        let node = nodes
            .entry(class_uri.clone())
            .or_insert_with(|| HierarchyNode {
                uri: class_uri.clone(),
                label: label_or_local_name(row.label.as_deref(), &class_uri),
                prefix_iri: row.prefix_iri.clone(),
                entity_kind: EntityKind::Class,
                parent_uris: IndexSet::new(),
                is_external: false,
                is_deprecated: false,
            });
        node.is_deprecated |= deprecated;

        let Some(RdfValue::Iri(parent)) = row.parent else {
            continue;
        };
        if parent == class_uri || vocab::is_excluded_root(&parent) {
            continue;
        }
        node.parent_uris.insert(parent.clone());
        children.entry(parent).or_default().insert(class_uri);
    }

    let stored_selection: Option<BTreeSet<String>> =
        config.as_ref().map(|c| c.selected_namespaces.clone());
    let internal = classify(
        nodes.keys().map(String::as_str),
        stored_selection.as_ref(),
        threshold,
    );
    let is_internal = |uri: &str| internal.contains(namespace(uri));

    for node in nodes.values_mut() {
        node.is_external = !is_internal(&node.uri);
    }

    let promoted: Vec<String> = nodes
        .values()
        .filter(|node| node.is_external)
        .filter(|node| has_internal_descendant(&node.uri, &children, &nodes, &is_internal))
        .map(|node| node.uri.clone())
        .collect();
    for uri in &promoted {
        if let Some(node) = nodes.get_mut(uri) {
            node.is_external = false;
        }
    }

    let show_deprecated = config.as_ref().is_some_and(|c| c.show_deprecated);
    let mut result: Vec<HierarchyNode> = nodes
        .into_values()
        .filter(|node| show_deprecated || !node.is_deprecated)
        .collect();
    sort_by_label(&mut result, |node| (node.label.as_str(), node.uri.as_str()));

    debug!(
        classes = result.len(),
        internal_namespaces = internal.len(),
        promoted = promoted.len(),
        "built class hierarchy"
    );
    Ok(result)
}

/// Depth-first search below `start` for a known class in an internal namespace.
fn has_internal_descendant(
    start: &str,
    children: &IndexMap<String, IndexSet<String>>,
    nodes: &IndexMap<String, HierarchyNode>,
    is_internal: &impl Fn(&str) -> bool,
) -> bool {
    let mut visited: HashSet<&str> = HashSet::from([start]);
    let mut stack: Vec<&str> = vec![start];

    while let Some(current) = stack.pop() {
        let Some(direct) = children.get(current) else {
            continue;
        };
        for child in direct {
            if !nodes.contains_key(child) {
                continue;
            }
            if is_internal(child) {
                return true;
            }
            if visited.insert(child.as_str()) {
                stack.push(child.as_str());
            }
        }
    }
    false
}
