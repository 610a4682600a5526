// =============================================================================
// Introspector
// =============================================================================
// Caller-facing handle over a gateway. Accepts identifiers as strings,
// rejects anything that is not an absolute IRI before a query is issued, and
// delegates to the free functions in `ontology`.

use crate::error::{IntrospectError, Result};
use crate::gateway::{GraphId, QueryGateway};
use crate::ontology::{
    self, ClassProperties, CodeListInfo, CodeListMember, CodeListPattern, CodeListSummary,
    EntityInfo, HierarchyNode, NamespaceStat, OntologyConfig, OntologySummary, PropertyInfo,
    DEFAULT_THRESHOLD,
};
use indexmap::IndexMap;
use oxigraph::model::NamedNode;
use std::collections::BTreeSet;

/// Read-mostly access to the ontologies behind a [`QueryGateway`].
///
/// Holds nothing but the gateway reference and the classification threshold,
/// so it is `Send + Sync` whenever the gateway is.
pub struct Introspector<'g, G: QueryGateway + ?Sized> {
    gateway: &'g G,
    threshold: f64,
}

impl<G: QueryGateway + ?Sized> Clone for Introspector<'_, G> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<G: QueryGateway + ?Sized> Copy for Introspector<'_, G> {}

impl<'g, G: QueryGateway + ?Sized> Introspector<'g, G> {
    pub fn new(gateway: &'g G) -> Self {
        Self {
            gateway,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    /// Threshold for namespace auto-detection, clamped to `[0, 1]`.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn gateway(&self) -> &'g G {
        self.gateway
    }

    pub fn build_hierarchy(&self, ontology_id: &str) -> Result<Vec<HierarchyNode>> {
        let ontology = parse_graph(ontology_id)?;
        ontology::build_hierarchy(self.gateway, &ontology, self.threshold)
    }

    pub fn detect_pattern(&self, ontology_id: &str, entity: &str) -> Result<Option<CodeListPattern>> {
        let ontology = parse_graph(ontology_id)?;
        let entity = parse_node(entity)?;
        ontology::detect_pattern(self.gateway, &ontology, &entity)
    }

    pub fn resolve_members(
        &self,
        ontology_id: &str,
        entity: &str,
        pattern: CodeListPattern,
    ) -> Result<Vec<CodeListMember>> {
        let ontology = parse_graph(ontology_id)?;
        let entity = parse_node(entity)?;
        ontology::resolve_members(self.gateway, &ontology, &entity, pattern)
    }

    pub fn get_code_list(&self, ontology_id: &str, entity: &str) -> Result<Option<CodeListInfo>> {
        let ontology = parse_graph(ontology_id)?;
        let entity = parse_node(entity)?;
        ontology::get_code_list(self.gateway, &ontology, &entity)
    }

    pub fn list_code_lists(&self, ontology_id: &str) -> Result<Vec<CodeListSummary>> {
        let ontology = parse_graph(ontology_id)?;
        ontology::list_code_lists(self.gateway, &ontology)
    }

    pub fn get_class_properties(&self, ontology_id: &str, class_uri: &str) -> Result<ClassProperties> {
        let ontology = parse_graph(ontology_id)?;
        let class = parse_node(class_uri)?;
        ontology::get_class_properties(self.gateway, &ontology, &class)
    }

    pub fn get_property_info(&self, ontology_id: &str, property_uri: &str) -> Result<PropertyInfo> {
        let ontology = parse_graph(ontology_id)?;
        let property = parse_node(property_uri)?;
        ontology::get_property_info(self.gateway, &ontology, &property)
    }

    pub fn get_entity_info(&self, ontology_id: &str, entity: &str) -> Result<EntityInfo> {
        let ontology = parse_graph(ontology_id)?;
        let entity = parse_node(entity)?;
        ontology::get_entity_info(self.gateway, &ontology, &entity)
    }

    /// Pure classification with this handle's threshold.
    pub fn classify<'a>(
        &self,
        class_uris: impl IntoIterator<Item = &'a str>,
        stored_selection: Option<&BTreeSet<String>>,
    ) -> BTreeSet<String> {
        ontology::classify(class_uris, stored_selection, self.threshold)
    }

    pub fn namespace_stats(&self, ontology_id: &str) -> Result<Vec<NamespaceStat>> {
        let ontology = parse_graph(ontology_id)?;
        ontology::namespace_stats(self.gateway, &ontology, self.threshold)
    }

    pub fn list_ontologies(&self) -> Result<Vec<OntologySummary>> {
        ontology::list_ontologies(self.gateway)
    }

    pub fn load_settings(&self, ontology_id: &str) -> Result<Option<OntologyConfig>> {
        let ontology = parse_graph(ontology_id)?;
        ontology::load_config(self.gateway, &ontology)
    }

    /// Stored settings, or defaults when none are stored.
    pub fn settings_or_default(&self, ontology_id: &str) -> Result<OntologyConfig> {
        let ontology = parse_graph(ontology_id)?;
        Ok(ontology::load_config(self.gateway, &ontology)?
            .unwrap_or_else(|| OntologyConfig::defaults(ontology)))
    }

    /// Persist settings. Namespace entries must be absolute IRIs.
    pub fn save_settings(&self, config: &OntologyConfig) -> Result<()> {
        for ns in &config.selected_namespaces {
            parse_node(ns)?;
        }
        ontology::save_config(self.gateway, config)
    }

    /// Namespace to prefix map for an ontology.
    pub fn prefixes(&self, ontology_id: &str) -> Result<IndexMap<String, String>> {
        let ontology = parse_graph(ontology_id)?;
        ontology::prefixes::resolve_prefixes(self.gateway, &ontology)
    }

    /// Replace the prefix declarations recorded for an ontology.
    pub fn store_prefixes(&self, ontology_id: &str, prefixes: &IndexMap<String, String>) -> Result<usize> {
        let ontology = parse_graph(ontology_id)?;
        ontology::prefixes::save_prefixes(self.gateway, &ontology, prefixes)
    }
}

fn parse_graph(value: &str) -> Result<GraphId> {
    GraphId::parse(value).map_err(|e| IntrospectError::invalid_iri(value, e))
}

fn parse_node(value: &str) -> Result<NamedNode> {
    NamedNode::new(value).map_err(|e| IntrospectError::invalid_iri(value, e))
}
