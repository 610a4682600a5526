// =============================================================================
// Namespace classification
// =============================================================================
// Splits class namespaces into internal (the ontology under study) and
// external (borrowed vocabularies).

use indexmap::IndexMap;
use std::collections::BTreeSet;

/// Share of all classes a namespace needs to count as major.
pub const DEFAULT_THRESHOLD: f64 = 0.05;

/// Floor on the class count of a major namespace.
pub const MIN_MAJOR_COUNT: usize = 3;

/// Leading `/`-separated parts a shared base prefix must extend past
/// (`http:`, empty, authority).
const MIN_BASE_PARTS: usize = 3;

/// Major namespaces that must share a base prefix for it to count.
const MIN_SHARING_NAMESPACES: usize = 2;

/// URI up to and including the last `#`, else the last `/`, else the URI itself.
pub fn namespace(uri: &str) -> &str {
    if let Some(idx) = uri.rfind('#') {
        return &uri[..=idx];
    }
    if let Some(idx) = uri.rfind('/') {
        return &uri[..=idx];
    }
    uri
}

/// Text after the last `#` or `/`, whichever is later.
pub fn local_name(uri: &str) -> &str {
    match uri.rfind(['#', '/']) {
        Some(idx) => &uri[idx + 1..],
        None => uri,
    }
}

/// Decide which namespaces are internal.
///
/// A non-empty `stored_selection` wins verbatim. Otherwise namespaces holding
/// at least `max(3, floor(total * threshold))` of the distinct classes are
/// major; path prefixes shared by two or more major namespaces become base
/// prefixes, and every namespace under a base prefix is internal as well.
pub fn classify<'a, I>(
    class_uris: I,
    stored_selection: Option<&BTreeSet<String>>,
    threshold: f64,
) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a str>,
{
    if let Some(selection) = stored_selection.filter(|s| !s.is_empty()) {
        return selection.clone();
    }

    let distinct: BTreeSet<&str> = class_uris.into_iter().collect();
    if distinct.is_empty() {
        return BTreeSet::new();
    }

    let mut namespace_counts: IndexMap<&str, usize> = IndexMap::new();
    for uri in &distinct {
        *namespace_counts.entry(namespace(uri)).or_default() += 1;
    }

    let total = distinct.len();
    let min_count = MIN_MAJOR_COUNT.max((total as f64 * threshold).floor() as usize);
    let major: BTreeSet<&str> = namespace_counts
        .iter()
        .filter(|(_, count)| **count >= min_count)
        .map(|(ns, _)| *ns)
        .collect();

    let mut base_prefixes: BTreeSet<String> = BTreeSet::new();
    for ns in &major {
        let parts: Vec<&str> = ns.trim_end_matches('/').split('/').collect();
        for i in MIN_BASE_PARTS..parts.len() {
            let prefix = format!("{}/", parts[..i].join("/"));
            let sharing = major.iter().filter(|m| m.starts_with(&prefix)).count();
            if sharing >= MIN_SHARING_NAMESPACES {
                base_prefixes.insert(prefix);
            }
        }
    }

    let mut internal: BTreeSet<String> = major.iter().map(|ns| ns.to_string()).collect();
    for ns in namespace_counts.keys() {
        if base_prefixes.iter().any(|base| ns.starts_with(base.as_str())) {
            internal.insert(ns.to_string());
        }
    }
    internal
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uris(namespace: &str, names: &[&str]) -> Vec<String> {
        names.iter().map(|n| format!("{namespace}{n}")).collect()
    }

    #[test]
    fn test_namespace_and_local_name() {
        assert_eq!(namespace("http://ex.org/soil#Profile"), "http://ex.org/soil#");
        assert_eq!(namespace("http://ex.org/soil/Profile"), "http://ex.org/soil/");
        assert_eq!(namespace("urn:isbn:1234"), "urn:isbn:1234");
        // the last '#' wins even when a '/' follows it
        assert_eq!(namespace("http://ex.org/a#b/c"), "http://ex.org/a#");

        assert_eq!(local_name("http://ex.org/soil#Profile"), "Profile");
        assert_eq!(local_name("http://ex.org/a#b/c"), "c");
        assert_eq!(local_name("urn:isbn:1234"), "urn:isbn:1234");
        assert_eq!(local_name("http://ex.org/soil/"), "");
    }

    #[test]
    fn test_empty_input_is_empty() {
        assert!(classify(std::iter::empty(), None, DEFAULT_THRESHOLD).is_empty());
    }

    #[test]
    fn test_stored_selection_returned_verbatim() {
        let stored: BTreeSet<String> = ["http://other.org/".to_string()].into();
        let classes = uris("http://ex.org/soil#", &["A", "B", "C", "D"]);
        let result = classify(classes.iter().map(String::as_str), Some(&stored), DEFAULT_THRESHOLD);
        assert_eq!(result, stored);
    }

    #[test]
    fn test_empty_stored_selection_falls_back_to_detection() {
        let stored = BTreeSet::new();
        let classes = uris("http://ex.org/soil#", &["A", "B", "C"]);
        let result = classify(classes.iter().map(String::as_str), Some(&stored), DEFAULT_THRESHOLD);
        assert_eq!(result, ["http://ex.org/soil#".to_string()].into());
    }

    #[test]
    fn test_minor_namespaces_are_external() {
        let mut classes = uris("http://ex.org/soil#", &["A", "B", "C", "D", "E"]);
        classes.extend(uris("http://www.w3.org/ns/sosa/", &["Sample", "Sensor"]));
        let result = classify(classes.iter().map(String::as_str), None, DEFAULT_THRESHOLD);
        assert_eq!(result, ["http://ex.org/soil#".to_string()].into());
    }

    #[test]
    fn test_base_prefix_pulls_in_sibling_namespaces() {
        let mut classes = uris("http://w3id.org/glosis/model/layerhorizon/", &["A", "B", "C"]);
        classes.extend(uris("http://w3id.org/glosis/model/common/", &["D", "E", "F"]));
        classes.extend(uris("http://w3id.org/glosis/model/codelists/", &["G"]));
        classes.extend(uris("http://www.w3.org/ns/sosa/", &["Sample"]));

        let result = classify(classes.iter().map(String::as_str), None, DEFAULT_THRESHOLD);
        let expected: BTreeSet<String> = [
            "http://w3id.org/glosis/model/codelists/",
            "http://w3id.org/glosis/model/common/",
            "http://w3id.org/glosis/model/layerhorizon/",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        assert_eq!(result, expected);
    }

    #[test]
    fn test_threshold_scales_with_total() {
        // 100 classes at 5% gives min_count 5: a namespace with 4 is not major
        let mut classes: Vec<String> = (0..96).map(|i| format!("http://ex.org/main#C{i}")).collect();
        classes.extend(uris("http://ex.org/minor#", &["A", "B", "C", "D"]));
        let result = classify(classes.iter().map(String::as_str), None, DEFAULT_THRESHOLD);
        assert_eq!(result, ["http://ex.org/main#".to_string()].into());
    }

    #[test]
    fn test_duplicates_do_not_inflate_counts() {
        let classes = ["http://ex.org/a#X"; 5];
        let result = classify(classes, None, DEFAULT_THRESHOLD);
        assert!(result.is_empty());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn class_uri() -> impl Strategy<Value = String> {
            (
                prop::sample::select(vec![
                    "http://ex.org/soil#",
                    "http://w3id.org/glosis/model/common/",
                    "http://w3id.org/glosis/model/layerhorizon/",
                    "http://www.w3.org/ns/sosa/",
                    "urn:x:",
                ]),
                "[A-Z][a-z]{0,6}",
            )
                .prop_map(|(ns, name)| format!("{ns}{name}"))
        }

        proptest! {
            #[test]
            fn classify_is_deterministic(classes in prop::collection::vec(class_uri(), 0..60)) {
                let first = classify(classes.iter().map(String::as_str), None, DEFAULT_THRESHOLD);
                let mut reversed = classes.clone();
                reversed.reverse();
                let second = classify(reversed.iter().map(String::as_str), None, DEFAULT_THRESHOLD);
                prop_assert_eq!(first, second);
            }

            #[test]
            fn non_empty_selection_is_identity(
                classes in prop::collection::vec(class_uri(), 0..30),
                selection in prop::collection::btree_set("[a-z]{1,8}", 1..4),
            ) {
                let result = classify(classes.iter().map(String::as_str), Some(&selection), DEFAULT_THRESHOLD);
                prop_assert_eq!(result, selection);
            }

            #[test]
            fn major_namespaces_are_always_internal(classes in prop::collection::vec(class_uri(), 1..60)) {
                let result = classify(classes.iter().map(String::as_str), None, DEFAULT_THRESHOLD);
                let distinct: BTreeSet<&str> = classes.iter().map(String::as_str).collect();
                let min_count = MIN_MAJOR_COUNT.max((distinct.len() as f64 * DEFAULT_THRESHOLD).floor() as usize);
                for ns in distinct.iter().map(|uri| namespace(uri)) {
                    let count = distinct.iter().filter(|uri| namespace(uri) == ns).count();
                    if count >= min_count {
                        prop_assert!(result.contains(ns));
                    }
                }
            }
        }
    }
}
