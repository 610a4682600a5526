//! Namespace prefixes: declared in the source document, derived from
//! `meta:prefixIRI` annotations, or taken from a table of well-known
//! vocabularies, in that order of preference.

use crate::error::Result;
use crate::gateway::{GraphId, QueryGateway, UpdateStatement};
use crate::sparql::{FromRow, QueryBuilder, RowError, Row, map_rows};
use crate::vocab;
use indexmap::IndexMap;
use oxigraph::model::{Literal, NamedNode, Triple};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument, warn};

/// Prefixes for common vocabularies, keyed by namespace.
pub static WELL_KNOWN_PREFIXES: Lazy<IndexMap<&'static str, &'static str>> = Lazy::new(|| {
    IndexMap::from([
        ("http://www.w3.org/1999/02/22-rdf-syntax-ns#", "rdf"),
        ("http://www.w3.org/2000/01/rdf-schema#", "rdfs"),
        ("http://www.w3.org/2002/07/owl#", "owl"),
        ("http://www.w3.org/2001/XMLSchema#", "xsd"),
        ("http://www.w3.org/2004/02/skos/core#", "skos"),
        ("http://www.w3.org/ns/shacl#", "sh"),
        ("http://www.w3.org/ns/prov#", "prov"),
        ("http://www.w3.org/ns/dcat#", "dcat"),
        ("http://www.w3.org/ns/sosa/", "sosa"),
        ("http://www.w3.org/ns/ssn/", "ssn"),
        ("http://www.w3.org/ns/org#", "org"),
        ("http://www.w3.org/ns/adms#", "adms"),
        ("http://purl.org/dc/terms/", "dct"),
        ("http://purl.org/dc/elements/1.1/", "dc"),
        ("http://xmlns.com/foaf/0.1/", "foaf"),
        ("http://schema.org/", "schema"),
        ("https://schema.org/", "schema"),
        ("http://purl.org/vocab/vann/", "vann"),
        ("http://rdfs.org/ns/void#", "void"),
        ("http://www.opengis.net/ont/geosparql#", "geo"),
        ("http://www.w3.org/2003/01/geo/wgs84_pos#", "wgs84"),
        ("http://qudt.org/schema/qudt/", "qudt"),
        ("http://qudt.org/vocab/unit/", "unit"),
        ("http://qudt.org/vocab/quantitykind/", "quantitykind"),
        ("http://purl.obolibrary.org/obo/", "obo"),
        ("http://purl.bioontology.org/ontology/", "bioportal"),
        ("http://def.isotc211.org/iso19156/2011/SamplingFeature#", "sf"),
        ("http://def.isotc211.org/iso19156/2011/Observation#", "om"),
        ("http://def.isotc211.org/iso19156/2011/GeneralFeatureInstance#", "gfi"),
        ("http://def.isotc211.org/iso19156/2011/SpatialSamplingFeature#", "ssf"),
        ("http://dbpedia.org/ontology/", "dbo"),
        ("http://dbpedia.org/property/", "dbp"),
        ("http://dbpedia.org/resource/", "dbr"),
        ("http://w3id.org/glosis/model/", "glosis"),
    ])
});

/// Turtle `PN_PREFIX`, restricted to ASCII.
static PREFIX_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_.-]*$").expect("Invalid regex"));

pub fn well_known_prefix(namespace: &str) -> Option<&'static str> {
    WELL_KNOWN_PREFIXES.get(namespace).copied()
}

struct StoredPrefixRow {
    predicate: String,
    namespace: String,
}

impl FromRow for StoredPrefixRow {
    fn from_row(row: &Row) -> std::result::Result<Self, RowError> {
        Ok(Self {
            predicate: row.iri("predicate")?.to_string(),
            namespace: row.value("namespace")?.as_str().to_string(),
        })
    }
}

struct PrefixIriRow {
    class: String,
    prefix_iri: String,
}

impl FromRow for PrefixIriRow {
    fn from_row(row: &Row) -> std::result::Result<Self, RowError> {
        Ok(Self {
            class: row.iri("class")?.to_string(),
            prefix_iri: row.value("prefixIri")?.as_str().to_string(),
        })
    }
}

fn stored_prefix_rows<G: QueryGateway + ?Sized>(
    gateway: &G,
    ontology: &GraphId,
) -> Result<Vec<StoredPrefixRow>> {
    let query = QueryBuilder::select()
        .variable("?predicate")
        .variable("?namespace")
        .where_clause("?ontology ?predicate ?namespace")
        .filter(&format!(
            "STRSTARTS(STR(?predicate), \"{}\")",
            vocab::AIT_PREFIX_STEM
        ))
        .bind("?ontology", ontology.as_named_node())
        .build()?;
    let rows = gateway.select(&GraphId::meta(), &query)?;
    Ok(map_rows(&rows)?)
}

/// Prefix declarations stored for `ontology` when it was loaded.
pub fn stored_prefixes<G: QueryGateway + ?Sized>(
    gateway: &G,
    ontology: &GraphId,
) -> Result<IndexMap<String, String>> {
    Ok(stored_prefix_rows(gateway, ontology)?
        .into_iter()
        .filter_map(|row| {
            let prefix = row.predicate.strip_prefix(vocab::AIT_PREFIX_STEM)?;
            (!prefix.is_empty() && !row.namespace.is_empty())
                .then(|| (row.namespace, prefix.to_string()))
        })
        .collect())
}

/// Replace the stored prefix declarations of `ontology`.
///
/// Prefixes that are not valid Turtle prefix names, or whose namespace is
/// empty, are skipped.
#[instrument(skip(gateway, ontology, prefixes), fields(ontology = %ontology))]
pub fn save_prefixes<G: QueryGateway + ?Sized>(
    gateway: &G,
    ontology: &GraphId,
    prefixes: &IndexMap<String, String>,
) -> Result<usize> {
    let meta = GraphId::meta();
    let subject = ontology.as_named_node().clone();

    for row in stored_prefix_rows(gateway, ontology)? {
        let predicate = NamedNode::new(row.predicate.as_str())
            .map_err(|e| crate::error::IntrospectError::invalid_iri(&row.predicate, e))?;
        gateway.apply(&UpdateStatement::DeleteMatching {
            graph: meta.clone(),
            subject: subject.clone(),
            predicate: Some(predicate),
        })?;
    }

    let mut triples = Vec::with_capacity(prefixes.len());
    for (namespace, prefix) in prefixes {
        if namespace.is_empty() || !PREFIX_NAME.is_match(prefix) || prefix.ends_with('.') {
            warn!(%prefix, %namespace, "skipping unstorable prefix");
            continue;
        }
        match NamedNode::new(format!("{}{prefix}", vocab::AIT_PREFIX_STEM)) {
            Ok(predicate) => triples.push(Triple::new(
                subject.clone(),
                predicate,
                Literal::new_simple_literal(namespace.as_str()),
            )),
            Err(err) => warn!(%prefix, %namespace, error = %err, "skipping unstorable prefix"),
        }
    }

    let stored = triples.len();
    if stored > 0 {
        gateway.apply(&UpdateStatement::InsertTriples {
            graph: meta,
            triples,
        })?;
    }
    debug!(stored, "saved prefix declarations");
    Ok(stored)
}

/// Namespace to prefix map: stored declarations first, then prefixes derived
/// from `prefixIRI` values shaped `prefix:localName` whose local name ends
/// the annotated class URI.
pub fn resolve_prefixes<G: QueryGateway + ?Sized>(
    gateway: &G,
    ontology: &GraphId,
) -> Result<IndexMap<String, String>> {
    let mut prefixes = stored_prefixes(gateway, ontology)?;

    let query = QueryBuilder::select()
        .distinct()
        .variable("?class")
        .variable("?prefixIri")
        .where_clause("?class meta:prefixIRI ?prefixIri")
        .filter("isIRI(?class)")
        .order_by("?class")
        .build()?;
    let rows: Vec<PrefixIriRow> = map_rows(&gateway.select(ontology, &query)?)?;

    for row in rows {
        let Some((prefix, local)) = row.prefix_iri.split_once(':') else {
            continue;
        };
        if prefix.is_empty() || local.is_empty() {
            continue;
        }
        if let Some(namespace) = row.class.strip_suffix(local) {
            if !namespace.is_empty() && !prefixes.contains_key(namespace) {
                prefixes.insert(namespace.to_string(), prefix.to_string());
            }
        }
    }
    Ok(prefixes)
}

/// Prefix for `namespace` from `resolved`, else from the well-known table.
pub fn prefix_for(namespace: &str, resolved: &IndexMap<String, String>) -> Option<String> {
    resolved
        .get(namespace)
        .cloned()
        .or_else(|| well_known_prefix(namespace).map(str::to_string))
}
