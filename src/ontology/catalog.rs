//! Catalog views: loaded ontologies and the namespaces their classes live in.

use super::namespace::{classify, namespace};
use super::prefixes::{prefix_for, resolve_prefixes};
use super::settings::load_config;
use super::sort_by_label;
use crate::error::Result;
use crate::gateway::{GraphId, QueryGateway};
use crate::sparql::{FromRow, QueryBuilder, Row, RowError, map_first, map_rows};
use crate::vocab;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::instrument;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OntologySummary {
    pub uri: String,
    pub label: String,
    pub triple_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamespaceStat {
    pub namespace: String,
    pub prefix: Option<String>,
    pub class_count: usize,
    /// Whether the namespace is treated as internal.
    pub selected: bool,
}

struct LabelRow(Option<String>);

impl FromRow for LabelRow {
    fn from_row(row: &Row) -> std::result::Result<Self, RowError> {
        Ok(LabelRow(row.text_opt("label").map(str::to_string)))
    }
}

/// Label for a graph without an `rdfs:label`: last `/` segment, then last `#` segment.
fn fallback_label(uri: &str) -> &str {
    let trimmed = uri.trim_end_matches(['/', '#']);
    let segment = trimmed.rsplit('/').next().unwrap_or(trimmed);
    match segment.rsplit('#').next() {
        Some(tail) if !tail.is_empty() => tail,
        _ => uri,
    }
}

/// Every loaded ontology graph, the settings graph excluded.
#[instrument(skip(gateway))]
pub fn list_ontologies<G: QueryGateway + ?Sized>(gateway: &G) -> Result<Vec<OntologySummary>> {
    let mut summaries = Vec::new();
    for graph in gateway.graphs()? {
        if graph.is_meta() {
            continue;
        }
        let query = QueryBuilder::select()
            .variable("?label")
            .where_clause("?graph rdfs:label ?label")
            .bind("?graph", graph.as_named_node())
            .order_by("?label")
            .limit(1)
            .build()?;
        let label = map_first::<LabelRow>(&gateway.select(&graph, &query)?)?
            .and_then(|row| row.0)
            .unwrap_or_else(|| fallback_label(graph.as_str()).to_string());

        summaries.push(OntologySummary {
            triple_count: gateway.triple_count(&graph)?,
            uri: graph.as_str().to_string(),
            label,
        });
    }
    sort_by_label(&mut summaries, |s| (s.label.as_str(), s.uri.as_str()));
    Ok(summaries)
}

struct ClassUri(String);

impl FromRow for ClassUri {
    fn from_row(row: &Row) -> std::result::Result<Self, RowError> {
        Ok(ClassUri(row.iri("class")?.to_string()))
    }
}

/// Class counts per namespace, largest first.
///
/// `selected` reflects the stored namespace selection when there is one and
/// the auto-detected internal set otherwise.
#[instrument(skip(gateway, ontology), fields(ontology = %ontology))]
pub fn namespace_stats<G: QueryGateway + ?Sized>(
    gateway: &G,
    ontology: &GraphId,
    threshold: f64,
) -> Result<Vec<NamespaceStat>> {
    let query = QueryBuilder::select()
        .distinct()
        .variable("?class")
        .where_clause("{ ?class a owl:Class } UNION { ?class a rdfs:Class }")
        .filter("isIRI(?class)")
        .build()?;
    let classes: BTreeSet<String> = map_rows::<ClassUri>(&gateway.select(ontology, &query)?)?
        .into_iter()
        .map(|c| c.0)
        .filter(|uri| !vocab::is_excluded_root(uri))
        .collect();

    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for uri in &classes {
        *counts.entry(namespace(uri)).or_default() += 1;
    }

    let stored = load_config(gateway, ontology)?.map(|c| c.selected_namespaces);
    let internal = classify(classes.iter().map(String::as_str), stored.as_ref(), threshold);
    let prefixes = resolve_prefixes(gateway, ontology)?;

    let mut stats: Vec<NamespaceStat> = counts
        .into_iter()
        .map(|(ns, class_count)| NamespaceStat {
            namespace: ns.to_string(),
            prefix: prefix_for(ns, &prefixes),
            class_count,
            selected: internal.contains(ns),
        })
        .collect();
    stats.sort_by(|a, b| {
        b.class_count
            .cmp(&a.class_count)
            .then_with(|| a.namespace.cmp(&b.namespace))
    });
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_label_uses_last_segment() {
        assert_eq!(fallback_label("http://example.org/onto/glosis"), "glosis");
        assert_eq!(fallback_label("http://example.org/onto/soil#"), "soil");
        assert_eq!(fallback_label("http://example.org/onto#core"), "core");
        assert_eq!(fallback_label("urn:x"), "urn:x");
    }
}
