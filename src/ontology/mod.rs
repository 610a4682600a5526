//! Ontology introspection over a [`QueryGateway`](crate::gateway::QueryGateway).
//!
//! Every reader here takes the gateway and the ontology graph explicitly and
//! keeps nothing between calls.

pub mod catalog;
pub mod codelist;
pub mod entity;
pub mod hierarchy;
pub mod namespace;
pub mod prefixes;
pub mod properties;
pub mod settings;

pub use catalog::{NamespaceStat, OntologySummary, list_ontologies, namespace_stats};
pub use codelist::{
    CodeListInfo, CodeListMember, CodeListPattern, CodeListSummary, MEMBER_LIMIT, detect_pattern,
    get_code_list, list_code_lists, resolve_members,
};
pub use entity::{EntityInfo, EntityKind, detect_entity_kind, get_entity_info};
pub use hierarchy::{HierarchyNode, build_hierarchy};
pub use namespace::{DEFAULT_THRESHOLD, classify, local_name, namespace};
pub use properties::{
    ClassProperties, InheritedPropertyGroup, PropertyInfo, PropertyKind, get_class_properties,
    get_property_info,
};
pub use settings::{DisplayNameMode, OntologyConfig, load_config, save_config};

use serde::Serialize;

/// An entity reference as shown to users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EntityRef {
    pub uri: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix_iri: Option<String>,
}

impl EntityRef {
    /// Reference labelled with `label`, or the local name when there is none.
    pub fn new(uri: impl Into<String>, label: Option<&str>) -> Self {
        let uri = uri.into();
        let label = label_or_local_name(label, &uri);
        Self {
            uri,
            label,
            prefix_iri: None,
        }
    }

    pub fn with_prefix_iri(mut self, prefix_iri: Option<&str>) -> Self {
        self.prefix_iri = prefix_iri.map(str::to_string);
        self
    }
}

pub(crate) fn label_or_local_name(label: Option<&str>, uri: &str) -> String {
    match label {
        Some(label) if !label.is_empty() => label.to_string(),
        _ => local_name(uri).to_string(),
    }
}

/// Case-insensitive label order with the URI as tie-break.
pub(crate) fn sort_by_label<T>(items: &mut [T], key: impl Fn(&T) -> (&str, &str)) {
    items.sort_by_cached_key(|item| {
        let (label, uri) = key(item);
        (label.to_lowercase(), uri.to_string())
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_ref_falls_back_to_local_name() {
        let named = EntityRef::new("http://ex.org/soil#Layer", Some("Soil layer"));
        assert_eq!(named.label, "Soil layer");
        let bare = EntityRef::new("http://ex.org/soil#Layer", None);
        assert_eq!(bare.label, "Layer");
        let empty = EntityRef::new("http://ex.org/soil#Layer", Some(""));
        assert_eq!(empty.label, "Layer");
    }

    #[test]
    fn sort_by_label_ignores_case() {
        let mut refs = vec![
            EntityRef::new("http://ex.org/b", Some("beta")),
            EntityRef::new("http://ex.org/a", Some("Alpha")),
            EntityRef::new("http://ex.org/c", Some("alpha")),
        ];
        sort_by_label(&mut refs, |r| (r.label.as_str(), r.uri.as_str()));
        let uris: Vec<&str> = refs.iter().map(|r| r.uri.as_str()).collect();
        assert_eq!(uris, ["http://ex.org/a", "http://ex.org/c", "http://ex.org/b"]);
    }

    #[test]
    fn prefix_iri_skipped_when_absent() {
        let json = serde_json::to_value(EntityRef::new("http://ex.org/a", Some("A"))).unwrap();
        assert!(json.get("prefix_iri").is_none());
    }
}
