//! Per-ontology display settings stored in the meta graph.
//!
//! Layout, one subject per ontology graph:
//!
//! ```text
//! <ontology> ait:selectedNamespace <ns> .        (zero or more)
//! <ontology> ait:displayNameMode "label" .
//! <ontology> ait:showDeprecated "false" .
//! ```
//!
//! Saving replaces all three predicates wholesale.

use crate::error::Result;
use crate::gateway::{GraphId, QueryGateway, UpdateStatement};
use crate::sparql::{QueryBuilder, RdfValue, Row};
use crate::vocab;
use oxigraph::model::{Literal, NamedNode, Triple};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumString};
use tracing::{debug, instrument, warn};

/// How entity names are shown by clients.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DisplayNameMode {
    #[default]
    Label,
    Identifier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OntologyConfig {
    pub ontology_id: GraphId,
    pub selected_namespaces: BTreeSet<String>,
    pub display_name_mode: DisplayNameMode,
    pub show_deprecated: bool,
}

impl OntologyConfig {
    /// Settings used when nothing is stored.
    pub fn defaults(ontology_id: GraphId) -> Self {
        Self {
            ontology_id,
            selected_namespaces: BTreeSet::new(),
            display_name_mode: DisplayNameMode::default(),
            show_deprecated: false,
        }
    }
}

/// Read stored settings.
///
/// `Ok(None)` when nothing is stored, and also when the stored triples are
/// malformed; the latter is logged and callers fall back to defaults.
#[instrument(skip(gateway, ontology), fields(ontology = %ontology))]
pub fn load_config<G: QueryGateway + ?Sized>(
    gateway: &G,
    ontology: &GraphId,
) -> Result<Option<OntologyConfig>> {
    let query = QueryBuilder::select()
        .variable("?predicate")
        .variable("?value")
        .where_clause("?ontology ?predicate ?value")
        .filter("?predicate IN (ait:selectedNamespace, ait:displayNameMode, ait:showDeprecated)")
        .bind("?ontology", ontology.as_named_node())
        .build()?;
    let rows = gateway.select(&GraphId::meta(), &query)?;
    if rows.is_empty() {
        debug!("no stored settings");
        return Ok(None);
    }

    match parse_config(ontology, &rows) {
        Ok(config) => Ok(Some(config)),
        Err(reason) => {
            warn!(%reason, "ignoring malformed stored settings");
            Ok(None)
        }
    }
}

fn parse_config(ontology: &GraphId, rows: &[Row]) -> std::result::Result<OntologyConfig, String> {
    let mut config = OntologyConfig::defaults(ontology.clone());
    let mut mode: Option<DisplayNameMode> = None;
    let mut show: Option<bool> = None;

    for row in rows {
        let predicate = row.iri("predicate").map_err(|e| e.to_string())?;
        let value = row.value("value").map_err(|e| e.to_string())?;

        match predicate {
            vocab::AIT_SELECTED_NAMESPACE => {
                let namespace = match value {
                    RdfValue::Iri(ns) => ns.as_str(),
                    RdfValue::Literal { value, .. } if !value.trim().is_empty() => value.trim(),
                    other => return Err(format!("selectedNamespace has unusable value {other:?}")),
                };
                config.selected_namespaces.insert(namespace.to_string());
            }
            vocab::AIT_DISPLAY_NAME_MODE => {
                let parsed = match value {
                    RdfValue::Literal { value, .. } => DisplayNameMode::from_str(value.trim())
                        .map_err(|_| format!("unknown displayNameMode '{value}'"))?,
                    other => return Err(format!("displayNameMode is not a literal: {other:?}")),
                };
                if mode.is_some_and(|existing| existing != parsed) {
                    return Err("conflicting displayNameMode values".to_string());
                }
                mode = Some(parsed);
            }
            vocab::AIT_SHOW_DEPRECATED => {
                let parsed = match value {
                    RdfValue::Literal { value, .. } => parse_flag(value)
                        .ok_or_else(|| format!("showDeprecated is not a boolean: '{value}'"))?,
                    other => return Err(format!("showDeprecated is not a literal: {other:?}")),
                };
                if show.is_some_and(|existing| existing != parsed) {
                    return Err("conflicting showDeprecated values".to_string());
                }
                show = Some(parsed);
            }
            other => return Err(format!("unexpected predicate {other}")),
        }
    }

    config.display_name_mode = mode.unwrap_or_default();
    config.show_deprecated = show.unwrap_or(false);
    Ok(config)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Replace the stored settings for `config.ontology_id`.
#[instrument(skip(gateway, config), fields(ontology = %config.ontology_id))]
pub fn save_config<G: QueryGateway + ?Sized>(gateway: &G, config: &OntologyConfig) -> Result<()> {
    let meta = GraphId::meta();
    let subject = config.ontology_id.as_named_node().clone();

    for predicate in [
        &*vocab::SELECTED_NAMESPACE,
        &*vocab::DISPLAY_NAME_MODE,
        &*vocab::SHOW_DEPRECATED,
    ] {
        gateway.apply(&UpdateStatement::DeleteMatching {
            graph: meta.clone(),
            subject: subject.clone(),
            predicate: Some(predicate.clone()),
        })?;
    }

    let mut triples = Vec::with_capacity(config.selected_namespaces.len() + 2);
    for namespace in &config.selected_namespaces {
        let node = NamedNode::new(namespace.as_str())
            .map_err(|e| crate::error::IntrospectError::invalid_iri(namespace, e))?;
        triples.push(Triple::new(
            subject.clone(),
            vocab::SELECTED_NAMESPACE.clone(),
            node,
        ));
    }
    triples.push(Triple::new(
        subject.clone(),
        vocab::DISPLAY_NAME_MODE.clone(),
        Literal::new_simple_literal(config.display_name_mode.as_ref()),
    ));
    triples.push(Triple::new(
        subject,
        vocab::SHOW_DEPRECATED.clone(),
        Literal::new_simple_literal(if config.show_deprecated { "true" } else { "false" }),
    ));

    gateway.apply(&UpdateStatement::InsertTriples {
        graph: meta,
        triples,
    })?;
    debug!(
        namespaces = config.selected_namespaces.len(),
        mode = %config.display_name_mode,
        show_deprecated = config.show_deprecated,
        "saved settings"
    );
    Ok(())
}
