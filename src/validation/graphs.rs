//! Dimensions, domains, networks and relationship types.

use std::collections::HashSet;

use super::{extension_base, Checker, IssueKind};
use crate::model::{ObjectKind, QName, TaxonomyObject};
use crate::relationships::{edge_source, edge_target, RelationshipSet};

/// Link properties a relationship type may allow or require.
pub(crate) const LINK_PROPERTIES: &[&str] = &["order", "weight", "preferredLabel", "usable"];

const CYCLE_POLICIES: &[&str] = &["any", "undirected", "none"];

const DOMAIN_SOURCES: &[ObjectKind] = &[
    ObjectKind::DomainRoot,
    ObjectKind::Member,
    ObjectKind::Concept,
    ObjectKind::Abstract,
];
const DOMAIN_TARGETS: &[ObjectKind] = &[ObjectKind::Member, ObjectKind::Concept, ObjectKind::Abstract];

pub(super) fn validate(checker: &mut Checker<'_>) {
    for dimension in checker.objects(ObjectKind::Dimension) {
        checker.reference(dimension, "domainRoot", &[ObjectKind::DomainRoot]);
        checker.references(dimension, "cubeTypes", &[ObjectKind::CubeType]);
    }
    for root in checker.objects(ObjectKind::DomainRoot) {
        checker.references(root, "allowedDomainItems", &[]);
    }
    for relationship_type in checker.objects(ObjectKind::RelationshipType) {
        validate_relationship_type(checker, relationship_type);
    }
    for domain in checker.objects(ObjectKind::Domain) {
        validate_domain(checker, domain);
    }
    for network in checker.objects(ObjectKind::Network) {
        validate_network(checker, network);
    }
}

fn validate_relationship_type<'m>(checker: &mut Checker<'m>, relationship_type: &'m TaxonomyObject) {
    checker.enumeration(relationship_type, "cycles", CYCLE_POLICIES);
    for property in ["allowedLinkProperties", "requiredLinkProperties"] {
        for value in relationship_type.strings(property) {
            if !LINK_PROPERTIES.contains(&value.as_str()) {
                checker.issue(
                    IssueKind::InvalidEnumeration {
                        property,
                        value: value.clone(),
                        allowed: LINK_PROPERTIES,
                    },
                    relationship_type,
                );
            }
        }
    }

    let allowed = relationship_type.strings("allowedLinkProperties");
    if let Some(name) = relationship_type.name() {
        for required in relationship_type.strings("requiredLinkProperties") {
            if LINK_PROPERTIES.contains(&required.as_str()) && !allowed.contains(required) {
                checker.issue(
                    IssueKind::InvalidLinkProperty {
                        property: required.clone(),
                        relationship_type: name.clone(),
                    },
                    relationship_type,
                );
            }
        }
    }
    checker.object_types(relationship_type, "sourceObjects");
    checker.object_types(relationship_type, "targetObjects");
}

fn validate_domain<'m>(checker: &mut Checker<'m>, domain: &'m TaxonomyObject) {
    if !checker.name_or_extend_target(domain) {
        return;
    }
    checker.reference(domain, "extendTargetName", &[ObjectKind::Domain]);
    checker.reference(domain, "root", &[ObjectKind::DomainRoot]);

    let domain_member = QName::xbrl("domain-member");
    let link_rules = checker
        .model
        .lookup_kind(&domain_member, ObjectKind::RelationshipType);
    for id in domain.children("relationships") {
        let rel = checker.object(*id);
        check_endpoint(checker, rel, "source", DOMAIN_SOURCES);
        check_endpoint(checker, rel, "target", DOMAIN_TARGETS);
        if let Some(rules) = link_rules {
            check_link_properties(checker, rel, rules);
        }
    }

    // Graph checks run once per base domain, over its extensions too.
    if domain.has("extendTargetName") {
        return;
    }
    let set = RelationshipSet::new(checker.model, domain);
    check_duplicate_edges(checker, &set);

    for rel in set.relationships() {
        let Some(target) = edge_target(rel) else { continue };
        if checker
            .model
            .lookup_kind(target, ObjectKind::DomainRoot)
            .is_some()
        {
            checker.issue(
                IssueKind::DomainRootAsTarget {
                    root: target.clone(),
                },
                rel,
            );
        }
    }
    if let Some(root) = domain.qname("root") {
        if !set.is_empty() && set.relationships_from(root).is_empty() {
            checker.issue(IssueKind::DomainRootNotSource { root: root.clone() }, domain);
        }
    }
    let inferred = set.inferred_roots();
    if inferred.len() > 1 {
        checker.issue(IssueKind::MultipleDomainRoots { roots: inferred }, domain);
    }
    if let Some(node) = set.find_cycle() {
        checker.issue(IssueKind::DomainCycle { node }, domain);
    }
}

fn validate_network<'m>(checker: &mut Checker<'m>, network: &'m TaxonomyObject) {
    if !checker.name_or_extend_target(network) {
        return;
    }
    checker.reference(network, "extendTargetName", &[ObjectKind::Network]);
    if network.has("name") && !network.has("relationshipTypeName") {
        checker.issue(
            IssueKind::MissingRequiredProperty {
                property: "relationshipTypeName",
            },
            network,
        );
    }
    let own_type = checker.reference(network, "relationshipTypeName", &[ObjectKind::RelationshipType]);
    checker.references(network, "roots", &[]);

    let relationship_type = own_type.or_else(|| {
        let base = extension_base(checker.model, network);
        base.qname("relationshipTypeName")
            .and_then(|name| checker.model.lookup_kind(name, ObjectKind::RelationshipType))
    });

    for id in network.children("relationships") {
        let rel = checker.object(*id);
        let Some(rules) = relationship_type else {
            check_endpoint(checker, rel, "source", &[]);
            check_endpoint(checker, rel, "target", &[]);
            continue;
        };
        check_typed_endpoint(checker, rel, "source", rules, "sourceObjects");
        check_typed_endpoint(checker, rel, "target", rules, "targetObjects");
        check_link_properties(checker, rel, rules);
        checker.reference(rel, "preferredLabel", &[ObjectKind::LabelType]);
    }

    if network.has("extendTargetName") {
        return;
    }
    let set = RelationshipSet::new(checker.model, network);
    check_duplicate_edges(checker, &set);

    let Some(rules) = relationship_type else { return };
    let policy = rules.str("cycles").unwrap_or("any");
    let cycle = match policy {
        "none" => set.find_undirected_cycle(),
        "undirected" => set.find_cycle(),
        _ => None,
    };
    if let Some(node) = cycle {
        checker.issue(
            IssueKind::RelationshipCycle {
                node,
                policy: policy.to_string(),
            },
            network,
        );
    }
}

/// Resolves one end of an edge and checks its kind against `expected`.
fn check_endpoint<'m>(
    checker: &mut Checker<'m>,
    rel: &'m TaxonomyObject,
    end: &'static str,
    expected: &[ObjectKind],
) -> Option<&'m TaxonomyObject> {
    checker.reference(rel, end, expected)
}

/// Checks an edge end against a relationship type's allowed object types.
fn check_typed_endpoint<'m>(
    checker: &mut Checker<'m>,
    rel: &'m TaxonomyObject,
    end: &'static str,
    rules: &TaxonomyObject,
    allowed_property: &str,
) {
    let Some(object) = check_endpoint(checker, rel, end, &[]) else {
        return;
    };
    let allowed = rules.qnames(allowed_property);
    if allowed.is_empty() || allowed.contains(&object.kind().type_qname()) {
        return;
    }
    if let (Some(name), Some(relationship_type)) = (rel.qname(end), rules.name()) {
        checker.issue(
            IssueKind::InvalidRelationshipEndpoint {
                end,
                name: name.clone(),
                relationship_type: relationship_type.clone(),
            },
            rel,
        );
    }
}

/// Link properties an edge carries. `usable` only counts when it switches
/// the edge off.
fn present_link_properties(rel: &TaxonomyObject) -> Vec<&'static str> {
    LINK_PROPERTIES
        .iter()
        .copied()
        .filter(|property| match *property {
            "usable" => rel.boolean("usable") == Some(false),
            other => rel.has(other),
        })
        .collect()
}

fn check_link_properties(checker: &mut Checker<'_>, rel: &TaxonomyObject, rules: &TaxonomyObject) {
    let Some(relationship_type) = rules.name() else {
        return;
    };
    let allowed = rules.strings("allowedLinkProperties");
    let present = present_link_properties(rel);
    for property in &present {
        if !allowed.iter().any(|a| a == property) {
            checker.issue(
                IssueKind::InvalidLinkProperty {
                    property: property.to_string(),
                    relationship_type: relationship_type.clone(),
                },
                rel,
            );
        }
    }
    for required in rules.strings("requiredLinkProperties") {
        if !present.contains(&required.as_str()) {
            checker.issue(
                IssueKind::MissingLinkProperty {
                    property: required.clone(),
                    relationship_type: relationship_type.clone(),
                },
                rel,
            );
        }
    }
}

fn check_duplicate_edges(checker: &mut Checker<'_>, set: &RelationshipSet<'_>) {
    let mut seen = HashSet::new();
    for rel in set.relationships() {
        let (Some(source), Some(target)) = (edge_source(rel), edge_target(rel)) else {
            continue;
        };
        let order = rel.number("order").map(|o| o.to_string());
        if !seen.insert((source, target, order.clone())) {
            checker.issue(
                IssueKind::DuplicateRelationship {
                    source: source.clone(),
                    target: target.clone(),
                    order,
                },
                rel,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::validate;
    use super::super::IssueCode;
    use serde_json::json;

    fn concepts() -> serde_json::Value {
        json!([
            {"name": "ex:Total", "dataType": "xs:decimal", "periodType": "duration"},
            {"name": "ex:PartA", "dataType": "xs:decimal", "periodType": "duration"},
            {"name": "ex:PartB", "dataType": "xs:decimal", "periodType": "duration"}
        ])
    }

    #[test]
    fn test_well_formed_domain_is_clean() {
        let (_, report) = validate(json!({
            "name": "ex:T",
            "members": [{"name": "ex:North"}, {"name": "ex:South"}],
            "domainRoots": [{"name": "ex:RegionRoot"}],
            "dimensions": [{"name": "ex:Region", "domainRoot": "ex:RegionRoot"}],
            "domains": [{
                "name": "ex:RegionDomain",
                "root": "ex:RegionRoot",
                "relationships": [
                    {"source": "ex:RegionRoot", "target": "ex:North", "order": 1},
                    {"source": "ex:RegionRoot", "target": "ex:South", "order": 2, "usable": false}
                ]
            }]
        }));
        assert!(report.is_clean(), "{report}");
    }

    #[test]
    fn test_domain_structure_rules() {
        let (_, report) = validate(json!({
            "name": "ex:T",
            "members": [{"name": "ex:A"}, {"name": "ex:B"}, {"name": "ex:C"}],
            "domainRoots": [{"name": "ex:Root"}, {"name": "ex:OtherRoot"}],
            "domains": [
                {
                    "name": "ex:D",
                    "root": "ex:Root",
                    "relationships": [
                        {"source": "ex:A", "target": "ex:B"},
                        {"source": "ex:B", "target": "ex:A"},
                        {"source": "ex:C", "target": "ex:OtherRoot"}
                    ]
                },
                {"name": "ex:E", "extendTargetName": "ex:D"}
            ]
        }));
        assert_eq!(report.count(IssueCode::InvalidNameOrExtendTarget), 1);
        assert_eq!(report.count(IssueCode::DomainRootNotSource), 1);
        assert_eq!(report.count(IssueCode::DomainCycle), 1);
        assert_eq!(report.count(IssueCode::DomainRootAsTarget), 1);
        // The root may not even be a valid target kind.
        assert_eq!(report.count(IssueCode::InvalidReferenceKind), 1);
    }

    #[test]
    fn test_multiple_domain_roots() {
        let (_, report) = validate(json!({
            "name": "ex:T",
            "members": [{"name": "ex:A"}, {"name": "ex:B"}, {"name": "ex:C"}],
            "domainRoots": [{"name": "ex:Root"}],
            "domains": [{
                "name": "ex:D",
                "root": "ex:Root",
                "relationships": [
                    {"source": "ex:Root", "target": "ex:A"},
                    {"source": "ex:B", "target": "ex:C"}
                ]
            }]
        }));
        assert_eq!(report.count(IssueCode::MultipleDomainRoots), 1);
    }

    #[test]
    fn test_network_link_properties_and_endpoints() {
        let (_, report) = validate(json!({
            "name": "ex:T",
            "concepts": concepts(),
            "members": [{"name": "ex:M"}],
            "networks": [{
                "name": "ex:Calc",
                "relationshipTypeName": "xbrl:summation-item",
                "relationships": [
                    {"source": "ex:Total", "target": "ex:PartA", "weight": 1},
                    {"source": "ex:Total", "target": "ex:PartB", "preferredLabel": "xbrl:totalLabel"},
                    {"source": "ex:Total", "target": "ex:M", "weight": 1}
                ]
            }]
        }));
        assert_eq!(report.count(IssueCode::InvalidLinkProperty), 1);
        assert_eq!(report.count(IssueCode::MissingLinkProperty), 1);
        assert_eq!(report.count(IssueCode::InvalidRelationshipEndpoint), 1);
    }

    #[test]
    fn test_network_cycle_policy_and_duplicates() {
        let (_, report) = validate(json!({
            "name": "ex:T",
            "concepts": concepts(),
            "networks": [
                {
                    "name": "ex:Tree",
                    "relationshipTypeName": "xbrl:parent-child",
                    "relationships": [
                        {"source": "ex:Total", "target": "ex:PartA", "order": 1},
                        {"source": "ex:Total", "target": "ex:PartB", "order": 2},
                        {"source": "ex:PartA", "target": "ex:PartB", "order": 1},
                        {"source": "ex:Total", "target": "ex:PartA", "order": 1}
                    ]
                },
                {
                    "name": "ex:Calc",
                    "relationshipTypeName": "xbrl:summation-item",
                    "relationships": [
                        {"source": "ex:Total", "target": "ex:PartA", "weight": 1},
                        {"source": "ex:Total", "target": "ex:PartB", "weight": 1},
                        {"source": "ex:PartA", "target": "ex:PartB", "weight": 1}
                    ]
                }
            ]
        }));
        assert_eq!(report.count(IssueCode::DuplicateRelationship), 1);
        // parent-child forbids the undirected loop; summation-item tolerates it.
        assert_eq!(report.count(IssueCode::RelationshipCycle), 1);
    }

    #[test]
    fn test_relationship_type_declarations() {
        let (_, report) = validate(json!({
            "name": "ex:T",
            "relationshipTypes": [{
                "name": "ex:custom",
                "cycles": "sometimes",
                "allowedLinkProperties": ["order", "colour"],
                "requiredLinkProperties": ["weight"],
                "sourceObjects": ["xbrl:conceptObject", "xbrl:gadgetObject"]
            }],
            "networks": [{"name": "ex:N"}]
        }));
        assert_eq!(report.count(IssueCode::InvalidEnumerationValue), 2);
        assert_eq!(report.count(IssueCode::InvalidLinkProperty), 1);
        assert_eq!(report.count(IssueCode::InvalidObjectType), 1);
        assert_eq!(report.count(IssueCode::MissingRequiredProperty), 1);
    }
}
