// =============================================================================
// Code lists
// =============================================================================
// Enumerated value sets appear under four modeling patterns. Detection runs
// one COUNT query per pattern in fixed precedence; resolution runs a single
// query for the detected pattern.

use super::{EntityRef, label_or_local_name, sort_by_label};
use crate::error::Result;
use crate::gateway::{GraphId, QueryGateway};
use crate::sparql::{FromRow, QueryBuilder, Row, RowError, SelectQuery, map_first, map_rows};
use indexmap::IndexMap;
use oxigraph::model::NamedNode;
use serde::Serialize;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::{debug, instrument};

/// Rows fetched per member query; longer lists are truncated.
pub const MEMBER_LIMIT: usize = 500;

/// Modeling pattern of a code list, in detection precedence order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CodeListPattern {
    /// Members point at the entity with `skos:inScheme`.
    SkosScheme,
    /// The entity is an `owl:oneOf` enumeration.
    OwlOneof,
    /// The entity is equivalent to an `owl:oneOf` enumeration.
    OwlEquivalentOneof,
    /// The entity lists members with `skos:member`.
    SkosCollection,
}

impl CodeListPattern {
    /// Graph pattern linking `?entity` to each `?member`.
    fn member_pattern(self) -> &'static str {
        match self {
            CodeListPattern::SkosScheme => "?member skos:inScheme ?entity",
            CodeListPattern::OwlOneof => "?entity owl:oneOf/rdf:rest*/rdf:first ?member",
            CodeListPattern::OwlEquivalentOneof => {
                "?entity owl:equivalentClass/owl:oneOf/rdf:rest*/rdf:first ?member"
            }
            CodeListPattern::SkosCollection => "?entity skos:member ?member",
        }
    }

    fn is_skos(self) -> bool {
        matches!(self, CodeListPattern::SkosScheme | CodeListPattern::SkosCollection)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeListMember {
    pub uri: String,
    pub label: String,
    pub notation: Option<String>,
    pub description: Option<String>,
}

impl FromRow for CodeListMember {
    fn from_row(row: &Row) -> std::result::Result<Self, RowError> {
        let uri = row.iri("member")?;
        let label = row.text_opt("prefLabel").or_else(|| row.text_opt("label"));
        Ok(Self {
            uri: uri.to_string(),
            label: label_or_local_name(label, uri),
            notation: row.text_opt("notation").map(str::to_string),
            description: row.text_opt("description").map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeListInfo {
    pub uri: String,
    pub label: String,
    pub pattern: CodeListPattern,
    pub member_count: usize,
    pub members: Vec<CodeListMember>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeListSummary {
    pub uri: String,
    pub label: String,
    pub prefix_iri: Option<String>,
    pub pattern: CodeListPattern,
    pub member_count: usize,
}

fn count_query(pattern: CodeListPattern, entity: &NamedNode) -> Result<SelectQuery> {
    Ok(QueryBuilder::select()
        .count("?member", "?count", false)
        .where_clause(pattern.member_pattern())
        .bind("?entity", entity)
        .build()?)
}

fn members_query(pattern: CodeListPattern, entity: &NamedNode) -> Result<SelectQuery> {
    let builder = QueryBuilder::select()
        .variable("?member")
        .sample("?l", "?label")
        .where_clause(pattern.member_pattern())
        .filter("isIRI(?member)")
        .optional("?member rdfs:label ?l");

    let builder = if pattern.is_skos() {
        builder
            .sample("?pl", "?prefLabel")
            .sample("?n", "?notation")
            .sample("?d", "?description")
            .optional("?member skos:prefLabel ?pl")
            .optional("?member skos:notation ?n")
            .optional("?member skos:definition ?d")
    } else {
        builder
    };

    // One row per member, so the limit caps members rather than label combinations.
    Ok(builder
        .bind("?entity", entity)
        .group_by("?member")
        .order_by("?member")
        .limit(MEMBER_LIMIT)
        .build()?)
}

/// First pattern with at least one member, or `None` when `entity` is not a code list.
#[instrument(skip(gateway, ontology, entity), fields(ontology = %ontology, entity = %entity.as_str()))]
pub fn detect_pattern<G: QueryGateway + ?Sized>(
    gateway: &G,
    ontology: &GraphId,
    entity: &NamedNode,
) -> Result<Option<CodeListPattern>> {
    for pattern in CodeListPattern::iter() {
        let rows = gateway.select(ontology, &count_query(pattern, entity)?)?;
        let count = match rows.first() {
            Some(row) => row.count("count")?,
            None => 0,
        };
        if count > 0 {
            debug!(%pattern, count, "detected code list pattern");
            return Ok(Some(pattern));
        }
    }
    Ok(None)
}

/// Members of `entity` under `pattern`, one entry per URI.
///
/// Ordered with notation-less members first, then by notation compared as
/// plain strings, then by label ignoring case, then by URI.
#[instrument(skip(gateway, ontology, entity), fields(ontology = %ontology, entity = %entity.as_str()))]
pub fn resolve_members<G: QueryGateway + ?Sized>(
    gateway: &G,
    ontology: &GraphId,
    entity: &NamedNode,
    pattern: CodeListPattern,
) -> Result<Vec<CodeListMember>> {
    let rows = gateway.select(ontology, &members_query(pattern, entity)?)?;
    if rows.len() >= MEMBER_LIMIT {
        debug!(limit = MEMBER_LIMIT, "members truncated");
    }

    let mut unique: IndexMap<String, CodeListMember> = IndexMap::new();
    for member in map_rows::<CodeListMember>(&rows)? {
        unique.entry(member.uri.clone()).or_insert(member);
    }

    let mut members: Vec<CodeListMember> = unique.into_values().collect();
    sort_members(&mut members);
    Ok(members)
}

fn sort_members(members: &mut [CodeListMember]) {
    members.sort_by_cached_key(|m| {
        (
            m.notation.is_some(),
            m.notation.clone().unwrap_or_default(),
            m.label.to_lowercase(),
            m.uri.clone(),
        )
    });
}

/// Detect and resolve in one call; `None` when `entity` is not a code list.
pub fn get_code_list<G: QueryGateway + ?Sized>(
    gateway: &G,
    ontology: &GraphId,
    entity: &NamedNode,
) -> Result<Option<CodeListInfo>> {
    let Some(pattern) = detect_pattern(gateway, ontology, entity)? else {
        return Ok(None);
    };

    let label = entity_label(gateway, ontology, entity)?;
    let members = resolve_members(gateway, ontology, entity, pattern)?;
    Ok(Some(CodeListInfo {
        uri: entity.as_str().to_string(),
        label,
        pattern,
        member_count: members.len(),
        members,
    }))
}

struct SummaryRow {
    entity: EntityRef,
    count: usize,
}

impl FromRow for SummaryRow {
    fn from_row(row: &Row) -> std::result::Result<Self, RowError> {
        Ok(Self {
            entity: EntityRef::new(row.iri("entity")?, row.text_opt("label"))
                .with_prefix_iri(row.text_opt("prefixIri")),
            count: row.count("count")?,
        })
    }
}

fn summary_query(pattern: CodeListPattern) -> Result<SelectQuery> {
    Ok(QueryBuilder::select()
        .variable("?entity")
        .sample("?l", "?label")
        .sample("?p", "?prefixIri")
        .count("?member", "?count", true)
        .where_clause(pattern.member_pattern())
        .filter("isIRI(?entity)")
        .optional("?entity rdfs:label ?l")
        .optional("?entity meta:prefixIRI ?p")
        .group_by("?entity")
        .order_by("?entity")
        .build()?)
}

/// SKOS concept schemes and collections with member counts.
///
/// OWL enumerations are left to the class hierarchy. An entity that is both a
/// scheme and a collection is listed once, as a scheme.
#[instrument(skip(gateway, ontology), fields(ontology = %ontology))]
pub fn list_code_lists<G: QueryGateway + ?Sized>(
    gateway: &G,
    ontology: &GraphId,
) -> Result<Vec<CodeListSummary>> {
    let mut listed: IndexMap<String, CodeListSummary> = IndexMap::new();

    for pattern in [CodeListPattern::SkosScheme, CodeListPattern::SkosCollection] {
        let rows: Vec<SummaryRow> = map_rows(&gateway.select(ontology, &summary_query(pattern)?)?)?;
        for row in rows {
            if listed.contains_key(&row.entity.uri) {
                continue;
            }
            listed.insert(
                row.entity.uri.clone(),
                CodeListSummary {
                    uri: row.entity.uri,
                    label: row.entity.label,
                    prefix_iri: row.entity.prefix_iri,
                    pattern,
                    member_count: row.count,
                },
            );
        }
    }

    let mut summaries: Vec<CodeListSummary> = listed.into_values().collect();
    sort_by_label(&mut summaries, |s| (s.label.as_str(), s.uri.as_str()));
    Ok(summaries)
}

fn entity_label<G: QueryGateway + ?Sized>(
    gateway: &G,
    ontology: &GraphId,
    entity: &NamedNode,
) -> Result<String> {
    struct LabelRow(Option<String>);
    impl FromRow for LabelRow {
        fn from_row(row: &Row) -> std::result::Result<Self, RowError> {
            Ok(LabelRow(row.text_opt("label").map(str::to_string)))
        }
    }

    let query = QueryBuilder::select()
        .variable("?label")
        .where_clause("?entity rdfs:label ?label")
        .bind("?entity", entity)
        .limit(1)
        .build()?;
    let label = map_first::<LabelRow>(&gateway.select(ontology, &query)?)?.and_then(|l| l.0);
    Ok(label_or_local_name(label.as_deref(), entity.as_str()))
}
