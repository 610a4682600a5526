// =============================================================================
// Property Resolution Tests
// =============================================================================

mod support;

use ait_introspect::{ClassProperties, Introspector, PropertyInfo, PropertyKind};
use support::*;

fn names(properties: &[PropertyInfo]) -> Vec<&str> {
    properties.iter().map(|p| p.label.as_str()).collect()
}

fn class_properties(ontology: &str, class: &str) -> ClassProperties {
    let gateway = fixture_gateway();
    Introspector::new(&gateway)
        .get_class_properties(ontology, class)
        .unwrap()
}

#[cfg(test)]
mod declared_tests {
    use super::*;

    #[test]
    fn test_domain_of_with_kinds_and_ranges() {
        let props = class_properties(SOIL, &soil("Layer"));
        assert_eq!(names(&props.domain_of), ["depth", "texture"]);

        let depth = &props.domain_of[0];
        assert_eq!(depth.property_kind, PropertyKind::DatatypeProperty);
        assert_eq!(depth.domains.len(), 1);
        assert_eq!(depth.domains[0].uri, soil("Layer"));
        assert_eq!(depth.ranges.len(), 1);
        assert_eq!(depth.ranges[0].label, "decimal");
    }

    #[test]
    fn test_blank_enumerated_range_resolved_to_members() {
        let props = class_properties(SOIL, &soil("Layer"));
        let texture = props
            .domain_of
            .iter()
            .find(|p| p.uri == soil("texture"))
            .unwrap();
        assert_eq!(texture.property_kind, PropertyKind::ObjectProperty);
        let ranges: Vec<&str> = texture.ranges.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(ranges, ["Clay", "Sand", "Silt"]);
    }

    #[test]
    fn test_range_of_carries_domains() {
        let props = class_properties(SOIL, &soil("Layer"));
        assert_eq!(names(&props.range_of), ["has layer"]);

        let has_layer = &props.range_of[0];
        assert_eq!(has_layer.ranges[0].uri, soil("Layer"));
        assert_eq!(has_layer.domains.len(), 1);
        assert_eq!(has_layer.domains[0].label, "Soil profile");
        assert_eq!(has_layer.domains[0].prefix_iri.as_deref(), Some("soil:SoilProfile"));
    }

    #[test]
    fn test_annotation_property_kind() {
        let props = class_properties(SOIL, &soil("Horizon"));
        assert_eq!(names(&props.domain_of), ["note"]);
        assert_eq!(props.domain_of[0].property_kind, PropertyKind::AnnotationProperty);
        assert!(props.domain_of[0].ranges.is_empty());
    }

    #[test]
    fn test_class_without_properties() {
        let props = class_properties(SOIL, &soil("SoilFeature"));
        assert_eq!(props, ClassProperties::default());
    }

    #[test]
    fn test_unknown_class_gives_empty_result() {
        let props = class_properties(SOIL, "http://example.org/soil#Nope");
        assert_eq!(props, ClassProperties::default());
    }
}

#[cfg(test)]
mod inheritance_tests {
    use super::*;

    #[test]
    fn test_inherited_grouped_nearest_ancestor_first() {
        let props = class_properties(SOIL, &soil("Horizon"));
        assert_eq!(props.inherited.len(), 1);
        assert_eq!(props.inherited[0].source_class.label, "Layer");
        assert_eq!(names(&props.inherited[0].properties), ["depth", "texture"]);
    }

    #[test]
    fn test_property_reported_once_at_nearest_ancestor() {
        let props = class_properties(INHERIT, &inherit("Grandchild"));
        assert!(props.domain_of.is_empty());

        let groups: Vec<(&str, Vec<&str>)> = props
            .inherited
            .iter()
            .map(|g| (g.source_class.label.as_str(), names(&g.properties)))
            .collect();
        assert_eq!(
            groups,
            [("Child", vec!["childOnly", "code"]), ("Base", vec!["name"])]
        );
    }

    #[test]
    fn test_declared_properties_not_repeated_as_inherited() {
        let props = class_properties(INHERIT, &inherit("Child"));
        assert_eq!(names(&props.domain_of), ["childOnly", "code"]);
        assert_eq!(props.inherited.len(), 1);
        assert_eq!(names(&props.inherited[0].properties), ["name"]);
    }

    #[test]
    fn test_cyclic_hierarchy_terminates() {
        let props = class_properties(INHERIT, &inherit("CycleA"));
        assert_eq!(props.inherited.len(), 1);
        assert_eq!(props.inherited[0].source_class.uri, inherit("CycleB"));
        assert_eq!(names(&props.inherited[0].properties), ["cyclic"]);
    }

    #[test]
    fn test_excluded_root_ends_the_chain() {
        let gateway = fixture_gateway();
        let chain = ait_introspect::ontology::properties::superclass_chain(
            &gateway,
            &ait_introspect::GraphId::parse(SOIL).unwrap(),
            &oxigraph::model::NamedNode::new(soil("Horizon")).unwrap(),
        )
        .unwrap();
        let uris: Vec<&str> = chain.iter().map(|r| r.uri.as_str()).collect();
        assert_eq!(uris, [soil("Layer").as_str()]);
    }
}

#[cfg(test)]
mod property_info_tests {
    use super::*;

    #[test]
    fn test_property_info_with_enumerated_range() {
        let gateway = fixture_gateway();
        let info = Introspector::new(&gateway)
            .get_property_info(SOIL, &soil("texture"))
            .unwrap();
        assert_eq!(info.label, "texture");
        assert_eq!(info.property_kind, PropertyKind::ObjectProperty);
        let domains: Vec<&str> = info.domains.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(domains, ["Layer"]);
        let ranges: Vec<&str> = info.ranges.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(ranges, ["Clay", "Sand", "Silt"]);
    }

    #[test]
    fn test_property_info_multiple_domains() {
        let gateway = fixture_gateway();
        let info = Introspector::new(&gateway)
            .get_property_info(INHERIT, &inherit("code"))
            .unwrap();
        assert_eq!(info.property_kind, PropertyKind::DatatypeProperty);
        assert_eq!(info.label, "code");
        let domains: Vec<&str> = info.domains.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(domains, ["Base", "Child"]);
        assert!(info.ranges.is_empty());
    }

    #[test]
    fn test_property_kind_serialized_by_name() {
        let gateway = fixture_gateway();
        let info = Introspector::new(&gateway)
            .get_property_info(SOIL, &soil("note"))
            .unwrap();
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["property_kind"], "AnnotationProperty");
    }
}
