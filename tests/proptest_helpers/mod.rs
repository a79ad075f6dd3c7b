#![allow(dead_code)]

use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use serde_json::{json, Value};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// ASCII NCNames, including the `-` and `.` characters NCNames allow after
/// the first position.
pub fn arb_ncname() -> BoxedStrategy<String> {
    "[A-Za-z_][A-Za-z0-9_.-]{0,12}".boxed()
}

pub fn arb_namespace() -> BoxedStrategy<String> {
    "[a-z]{1,10}(/[a-z0-9]{1,6}){0,3}"
        .prop_map(|path| format!("http://example.com/{path}"))
        .boxed()
}

/// Concept names `ex:C0 .. ex:C{n-1}`.
pub fn concept_names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("ex:C{i}")).collect()
}

/// Edges between concepts by index, possibly with cycles and self loops.
pub fn arb_edges(concepts: usize, max_edges: usize) -> BoxedStrategy<Vec<(usize, usize)>> {
    prop::collection::vec((0..concepts, 0..concepts), 0..=max_edges).boxed()
}

/// A taxonomy document with `concepts` decimal concepts, one network per
/// relationship type over the given edges, and one label per concept.
pub fn taxonomy_document(concepts: usize, edges: &[(usize, usize)], relationship_type: &str) -> Value {
    let names = concept_names(concepts);
    let relationships: Vec<Value> = edges
        .iter()
        .enumerate()
        .map(|(i, (s, t))| json!({"source": names[*s], "target": names[*t], "order": i}))
        .collect();
    let concept_objects: Vec<Value> = names
        .iter()
        .map(|name| json!({"name": name, "dataType": "xs:decimal", "periodType": "duration"}))
        .collect();
    let labels: Vec<Value> = names
        .iter()
        .map(|name| json!({"relatedName": name, "language": "en", "value": name}))
        .collect();

    json!({
        "documentInfo": {
            "documentType": "https://xbrl.org/2025/taxonomy",
            "namespaces": {
                "ex": "http://example.com/ex",
                "xbrl": "https://xbrl.org/2025",
                "xs": "http://www.w3.org/2001/XMLSchema"
            }
        },
        "taxonomy": {
            "name": "ex:Generated",
            "concepts": concept_objects,
            "networks": [{
                "name": "ex:Net",
                "relationshipTypeName": relationship_type,
                "relationships": relationships
            }],
            "labels": labels
        }
    })
}

pub fn arb_relationship_type() -> BoxedStrategy<&'static str> {
    prop::sample::select(vec![
        "xbrl:parent-child",
        "xbrl:summation-item",
        "xbrl:general-special",
    ])
    .boxed()
}

/// Durations of whole years or months, as a fact period would span.
pub fn arb_fact_period() -> BoxedStrategy<String> {
    (2000i32..2030, 1u32..=12, prop::bool::ANY)
        .prop_map(|(year, month, instant)| {
            if instant {
                format!("{year}-{month:02}-01")
            } else {
                format!("{year}-{month:02}-01/{}-{month:02}-01", year + 1)
            }
        })
        .boxed()
}
