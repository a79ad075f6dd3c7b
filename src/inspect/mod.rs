//! Taxonomy inspection.
//!
//! Summarizes a built [`TaxonomyModel`]: what was loaded, how many objects
//! of each kind it holds, and the shape of every network and domain.

mod report;

pub use report::{GraphSummary, InspectReport, KindCount, SummarySection};

use crate::model::{ObjectKind, TaxonomyModel};
use crate::relationships::RelationshipSet;

/// Options for the inspect command.
#[derive(Clone, Debug, Default)]
pub struct InspectOptions {
    /// Render each network and domain as an indented tree.
    pub show_trees: bool,
}

/// Inspect a taxonomy model and produce a report.
pub fn inspect_taxonomy(model: &TaxonomyModel, opts: &InspectOptions) -> InspectReport {
    InspectReport {
        summary: compute_summary(model),
        kinds: compute_kind_counts(model),
        graphs: compute_graphs(model, opts),
    }
}

/// The built-in core vocabulary is counted with everything else but left
/// out of the taxonomy list.
fn compute_summary(model: &TaxonomyModel) -> SummarySection {
    let core = model.core_taxonomy();
    SummarySection {
        taxonomies: model
            .taxonomies()
            .filter(|taxonomy| Some(taxonomy.id()) != core)
            .filter_map(|taxonomy| taxonomy.name().map(ToString::to_string))
            .collect(),
        objects: model.objects().count(),
        registry_len: model.registry_len(),
        tag_index_len: model.tag_index_len(),
        facts: model.facts().count(),
    }
}

/// Non-zero counts in [`ObjectKind::ALL`] order.
fn compute_kind_counts(model: &TaxonomyModel) -> Vec<KindCount> {
    let mut counts = vec![0usize; ObjectKind::ALL.len()];
    for obj in model.objects() {
        if let Some(slot) = ObjectKind::ALL.iter().position(|kind| *kind == obj.kind()) {
            counts[slot] += 1;
        }
    }
    ObjectKind::ALL
        .iter()
        .zip(counts)
        .filter(|(_, count)| *count > 0)
        .map(|(kind, count)| KindCount { kind: *kind, count })
        .collect()
}

/// One summary per base network or domain; extensions are folded into the
/// object they extend.
fn compute_graphs(model: &TaxonomyModel, opts: &InspectOptions) -> Vec<GraphSummary> {
    model
        .objects()
        .filter(|obj| matches!(obj.kind(), ObjectKind::Network | ObjectKind::Domain))
        .filter(|obj| !obj.has("extendTargetName"))
        .map(|owner| {
            let set = RelationshipSet::new(model, owner);
            let relationship_type = match owner.kind() {
                ObjectKind::Domain => Some("xbrl:domain-member".to_string()),
                _ => owner.qname("relationshipTypeName").map(ToString::to_string),
            };
            GraphSummary {
                kind: owner.kind(),
                name: model.label_of(owner.id()).to_string(),
                relationship_type,
                roots: set.roots().iter().map(ToString::to_string).collect(),
                edges: set.len(),
                tree: opts.show_trees.then(|| set.render_tree()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{NoImports, TaxonomyBuilder};
    use serde_json::json;

    fn make_test_model() -> TaxonomyModel {
        let doc = json!({
            "documentInfo": {
                "documentType": "https://xbrl.org/2025/taxonomy",
                "namespaces": {
                    "ex": "http://example.com/ex",
                    "xbrl": "https://xbrl.org/2025",
                    "xs": "http://www.w3.org/2001/XMLSchema"
                }
            },
            "taxonomy": {
                "name": "ex:Sample",
                "concepts": [
                    {"name": "ex:Assets", "dataType": "xs:decimal", "periodType": "instant"},
                    {"name": "ex:Cash", "dataType": "xs:decimal", "periodType": "instant"},
                    {"name": "ex:Land", "dataType": "xs:decimal", "periodType": "instant"}
                ],
                "networks": [{
                    "name": "ex:Balance",
                    "relationshipTypeName": "xbrl:parent-child",
                    "relationships": [
                        {"source": "ex:Assets", "target": "ex:Cash"},
                        {"source": "ex:Assets", "target": "ex:Land"}
                    ]
                }]
            }
        });
        TaxonomyBuilder::new(&NoImports)
            .build(&doc, "sample.json")
            .unwrap()
            .model
    }

    #[test]
    fn test_summary_counts() {
        let model = make_test_model();
        let report = inspect_taxonomy(&model, &InspectOptions::default());

        assert_eq!(report.summary.taxonomies, vec!["ex:Sample".to_string()]);
        // The core vocabulary is loaded but not listed.
        assert_eq!(model.taxonomies().count(), 2);
        assert_eq!(report.summary.facts, 0);
        assert!(report.summary.registry_len >= 4);
        let concepts = report
            .kinds
            .iter()
            .find(|entry| entry.kind == ObjectKind::Concept)
            .unwrap();
        assert_eq!(concepts.count, 3);
    }

    #[test]
    fn test_kind_counts_follow_kind_order() {
        let model = make_test_model();
        let report = inspect_taxonomy(&model, &InspectOptions::default());

        let order: Vec<usize> = report
            .kinds
            .iter()
            .map(|entry| ObjectKind::ALL.iter().position(|k| *k == entry.kind).unwrap())
            .collect();
        let mut sorted = order.clone();
        sorted.sort_unstable();
        assert_eq!(order, sorted);
        assert!(report.kinds.iter().all(|entry| entry.count > 0));
    }

    #[test]
    fn test_network_summary() {
        let model = make_test_model();
        let report = inspect_taxonomy(&model, &InspectOptions::default());

        let network = report
            .graphs
            .iter()
            .find(|g| g.name == "ex:Balance")
            .unwrap();
        assert_eq!(network.edges, 2);
        assert_eq!(network.roots, vec!["ex:Assets".to_string()]);
        assert_eq!(network.relationship_type.as_deref(), Some("xbrl:parent-child"));
        assert!(network.tree.is_none());
    }

    #[test]
    fn test_trees_rendered_on_request() {
        let model = make_test_model();
        let opts = InspectOptions { show_trees: true };
        let report = inspect_taxonomy(&model, &opts);

        let network = report
            .graphs
            .iter()
            .find(|g| g.name == "ex:Balance")
            .unwrap();
        assert_eq!(
            network.tree.as_deref(),
            Some("ex:Assets\n  ex:Cash\n  ex:Land\n")
        );
    }

    #[test]
    fn test_display_output() {
        let model = make_test_model();
        let report = inspect_taxonomy(&model, &InspectOptions { show_trees: true });

        let output = format!("{}", report);

        assert!(output.contains("Taxonomy Inspection Report"));
        assert!(output.contains("Summary"));
        assert!(output.contains("Objects"));
        assert!(output.contains("Networks and Domains"));
        assert!(output.contains("ex:Balance"));
    }
}
