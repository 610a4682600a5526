//! CLI command execution. Each command produces one JSON document.

use crate::config::{AppConfig, Command};
use crate::error::IntrospectError;
use crate::gateway::{GraphId, LoadReport, OxigraphGateway, QueryGateway, RdfSyntax, UpdateStatement};
use crate::introspector::Introspector;
use crate::logging::command_span;
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use tracing::info;

/// Open the persistent store named by `config` and run `command` against it.
pub fn run(config: &AppConfig, command: &Command) -> Result<Value> {
    config.ensure_data_dir()?;
    let gateway = OxigraphGateway::open(&config.data_dir)
        .with_context(|| format!("failed to open store at {:?}", config.data_dir))?;
    execute(&gateway, config.threshold, command)
}

/// Run `command` against an already opened gateway.
pub fn execute(gateway: &OxigraphGateway, threshold: f64, command: &Command) -> Result<Value> {
    let _span = command_span(command.name()).entered();
    let introspector = Introspector::new(gateway).with_threshold(threshold);

    match command {
        Command::Load {
            file,
            ontology,
            format,
            replace,
        } => {
            let report = load_file(gateway, file, ontology, *format, *replace)?;
            let stored = introspector.store_prefixes(ontology, &report.prefixes)?;
            info!(
                ontology = %ontology,
                triples = report.triples_added,
                prefixes = stored,
                "ontology loaded"
            );
            Ok(json!({ "ontology": ontology, "report": report }))
        }
        Command::Ontologies => to_json(introspector.list_ontologies()?),
        Command::Namespaces { ontology } => to_json(introspector.namespace_stats(ontology)?),
        Command::Hierarchy {
            ontology,
            internal_only,
        } => {
            let mut nodes = introspector.build_hierarchy(ontology)?;
            if *internal_only {
                nodes.retain(|node| !node.is_external);
            }
            to_json(nodes)
        }
        Command::Codelists { ontology } => to_json(introspector.list_code_lists(ontology)?),
        Command::Codelist { ontology, entity } => {
            to_json(introspector.get_code_list(ontology, entity)?)
        }
        Command::ClassProperties { ontology, class } => {
            to_json(introspector.get_class_properties(ontology, class)?)
        }
        Command::Property { ontology, property } => {
            to_json(introspector.get_property_info(ontology, property)?)
        }
        Command::Entity { ontology, entity } => {
            to_json(introspector.get_entity_info(ontology, entity)?)
        }
        Command::ConfigShow { ontology } => {
            let stored = introspector.load_settings(ontology)?;
            let is_stored = stored.is_some();
            let config = match stored {
                Some(config) => config,
                None => introspector.settings_or_default(ontology)?,
            };
            Ok(json!({ "stored": is_stored, "config": config }))
        }
        Command::ConfigSet {
            ontology,
            namespaces,
            clear_namespaces,
            display_name_mode,
            show_deprecated,
        } => {
            let mut config = introspector.settings_or_default(ontology)?;
            if *clear_namespaces {
                config.selected_namespaces.clear();
            }
            if let Some(namespaces) = namespaces {
                config.selected_namespaces = namespaces
                    .iter()
                    .map(|ns| ns.trim().to_string())
                    .filter(|ns| !ns.is_empty())
                    .collect();
            }
            if let Some(mode) = display_name_mode {
                config.display_name_mode = *mode;
            }
            if let Some(flag) = show_deprecated {
                config.show_deprecated = *flag;
            }
            introspector.save_settings(&config)?;
            info!(ontology = %ontology, "settings saved");
            to_json(config)
        }
    }
}

fn to_json<T: Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value).context("failed to serialize command output")
}

fn load_file(
    gateway: &OxigraphGateway,
    file: &Path,
    ontology: &str,
    format: Option<RdfSyntax>,
    replace: bool,
) -> Result<LoadReport> {
    let graph = GraphId::parse(ontology).map_err(|e| IntrospectError::invalid_iri(ontology, e))?;
    anyhow::ensure!(!graph.is_meta(), "{ontology} is reserved for stored settings");

    let data = fs::read(file).with_context(|| format!("failed to read {:?}", file))?;

    if replace {
        gateway
            .apply(&UpdateStatement::ClearGraph {
                graph: graph.clone(),
            })
            .map_err(IntrospectError::from)?;
    }

    let syntax = format.or_else(|| {
        file.extension()
            .and_then(|ext| ext.to_str())
            .and_then(RdfSyntax::from_extension)
    });

    let report = match syntax {
        Some(syntax) => gateway.load(&graph, data.as_slice(), syntax),
        None => gateway.load_any(&graph, &data),
    }
    .map_err(IntrospectError::from)
    .with_context(|| format!("failed to load {:?}", file))?;
    Ok(report)
}
