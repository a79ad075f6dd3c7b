//! Whole-pipeline properties: build, validate and resolve cubes through the
//! public API only.

mod common;

use common::{base, build, build_with, ex, report_document, taxonomy_document, write_json};
use oimtax::builder::{Catalog, NoImports, TaxonomyBuilder};
use oimtax::cube::usable_cubes;
use oimtax::model::{ObjectKind, TaxonomyModel};
use oimtax::relationships::RelationshipSet;
use oimtax::validation::{validate_taxonomy, IssueCode, ValidateOptions};
use oimtax::TaxonomyError;
use serde_json::json;

#[test]
fn duplicate_names_keep_one_object_and_name_both() {
    let outcome = build(&taxonomy_document(json!({
        "name": "ex:T",
        "concepts": [
            {"name": "ex:Cash", "dataType": "xs:decimal", "periodType": "instant"},
            {"name": "ex:Cash", "dataType": "xs:string", "periodType": "duration"}
        ]
    })));

    assert_eq!(outcome.report.count(IssueCode::DuplicateObject), 1);
    let issue = outcome
        .report
        .issues
        .iter()
        .find(|i| i.code() == IssueCode::DuplicateObject)
        .unwrap();
    assert_eq!(issue.objects.len(), 2);

    let cash: Vec<_> = outcome
        .model
        .objects_of_kind(ObjectKind::Concept)
        .filter(|c| c.name() == Some(&ex("Cash")))
        .collect();
    assert_eq!(cash.len(), 1);
    assert_eq!(
        outcome.model.lookup(&ex("Cash")).map(|c| c.id()),
        Some(cash[0].id())
    );
}

#[test]
fn domain_cycle_traversal_terminates() {
    let outcome = build(&taxonomy_document(json!({
        "name": "ex:T",
        "members": [{"name": "ex:A"}, {"name": "ex:B"}],
        "domains": [{
            "name": "ex:Dom",
            "relationships": [
                {"source": "ex:A", "target": "ex:B"},
                {"source": "ex:B", "target": "ex:A"}
            ]
        }]
    })));
    let domain = outcome.model.lookup(&ex("Dom")).unwrap();
    let set = RelationshipSet::new(&outcome.model, domain);

    let steps = set.traverse(&ex("A"));
    let visited: Vec<_> = steps.iter().map(|s| (s.node.clone(), s.is_loop)).collect();
    assert_eq!(
        visited,
        vec![(ex("A"), false), (ex("B"), false), (ex("A"), true)]
    );
    assert_eq!(steps[2].depth, 2);
}

#[test]
fn profiles_and_import_objects_are_exclusive() {
    let dir = tempfile::tempdir().unwrap();
    write_json(
        &dir.path().join("base.json"),
        &taxonomy_document(json!({
            "name": "base:Base",
            "concepts": [
                {"name": "base:Assets", "dataType": "xs:decimal", "periodType": "instant"},
                {"name": "base:Revenue", "dataType": "xs:decimal", "periodType": "duration"}
            ],
            "exportProfiles": [{"name": "base:Balance", "exportObjects": ["base:Assets"]}]
        })),
    );
    let catalog = Catalog::from_dir(dir.path()).unwrap();
    assert_eq!(catalog.len(), 1);

    let outcome = build_with(
        &catalog,
        &taxonomy_document(json!({
            "name": "ex:T",
            "importedTaxonomies": [{
                "taxonomyName": "base:Base",
                "profiles": ["base:Balance"],
                "importObjects": ["base:Revenue"]
            }]
        })),
    );

    assert_eq!(outcome.report.count(IssueCode::InvalidImportTaxonomy), 1);
    assert!(outcome.model.lookup(&base("Assets")).is_some());
    assert!(outcome.model.lookup(&base("Revenue")).is_some());
}

#[test]
fn instant_constraint_with_start_date_is_one_diagnostic() {
    let outcome = build(&taxonomy_document(json!({
        "name": "ex:T",
        "cubes": [{
            "name": "ex:C",
            "cubeDimensions": [
                {"dimensionName": "xbrl:concept"},
                {"dimensionName": "xbrl:period", "periodConstraints": [
                    {"periodType": "instant", "startDate": {"value": "2023-01-01"}}
                ]}
            ]
        }]
    })));
    assert!(outcome.report.is_clean(), "{}", outcome.report);

    let report = validate_taxonomy(&outcome.model, &ValidateOptions::default());
    assert_eq!(report.count(IssueCode::InvalidPeriodRepresentation), 1);
    assert_eq!(report.issues.len(), 1, "{report}");
}

fn cube_model() -> TaxonomyModel {
    let outcome = build(&report_document(
        json!({
            "name": "ex:T",
            "concepts": [
                {"name": "ex:Sales", "dataType": "xs:decimal", "periodType": "duration"},
                {"name": "ex:Cash", "dataType": "xs:decimal", "periodType": "instant"}
            ],
            "cubes": [
                {"name": "ex:Any", "cubeDimensions": [{"dimensionName": "xbrl:concept"}]},
                {"name": "ex:Annual", "cubeDimensions": [
                    {"dimensionName": "xbrl:concept"},
                    {"dimensionName": "xbrl:period", "periodConstraints": [{"periodType": "duration", "timeSpan": "P1Y"}]}
                ]},
                {"name": "ex:Points", "cubeDimensions": [
                    {"dimensionName": "xbrl:concept"},
                    {"dimensionName": "xbrl:period", "periodConstraints": [{"periodType": "instant"}]}
                ]}
            ]
        }),
        json!({
            "year": {"value": "1", "dimensions": {"concept": "ex:Sales", "period": "2023-01-01/2023-12-31"}},
            "point": {"value": "2", "dimensions": {"concept": "ex:Cash", "period": "2023-12-31"}}
        }),
    ));
    outcome.model
}

#[test]
fn usable_cubes_needs_validation() {
    let model = cube_model();
    let fact = model.facts().next().unwrap();
    assert!(matches!(
        usable_cubes(fact, &model),
        Err(TaxonomyError::NotValidated)
    ));
}

#[test]
fn usable_cubes_is_deterministic() {
    let model = cube_model();
    validate_taxonomy(&model, &ValidateOptions::default());

    for fact in model.facts() {
        let first = usable_cubes(fact, &model).unwrap();
        let second = usable_cubes(fact, &model).unwrap();
        assert_eq!(first, second);
        let mut sorted = first.clone();
        sorted.sort();
        assert_eq!(first, sorted, "cubes come back in declaration order");
    }

    let year = model.facts().find(|f| f.label() == "year").unwrap();
    let names: Vec<_> = usable_cubes(year, &model)
        .unwrap()
        .into_iter()
        .map(|id| model.label_of(id).to_string())
        .collect();
    assert_eq!(names, vec!["ex:Any", "ex:Annual"]);
}

#[test]
fn revalidation_is_byte_identical() {
    let outcome = build(&taxonomy_document(json!({
        "name": "ex:T",
        "concepts": [
            {"name": "ex:A", "dataType": "ex:Nothing", "periodType": "sometimes"},
            {"name": "ex:B", "dataType": "xs:decimal", "periodType": "instant", "balance": "debit"}
        ],
        "networks": [{
            "name": "ex:N",
            "relationshipTypeName": "xbrl:parent-child",
            "relationships": [
                {"source": "ex:A", "target": "ex:B"},
                {"source": "ex:B", "target": "ex:A"},
                {"source": "ex:A", "target": "ex:B"}
            ]
        }],
        "labels": [
            {"relatedName": "ex:A", "language": "en", "value": "A"},
            {"relatedName": "ex:A", "language": "en", "value": "A again"},
            {"relatedName": "ex:Ghost", "language": "en", "value": "?"}
        ]
    })));

    let opts = ValidateOptions::default();
    let first = validate_taxonomy(&outcome.model, &opts);
    let second = validate_taxonomy(&outcome.model, &opts);

    assert!(!first.is_clean());
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
    assert_eq!(first.to_string(), second.to_string());
}

#[test]
fn later_extension_is_seen_by_revalidation() {
    let mut model = build(&taxonomy_document(json!({
        "name": "ex:T",
        "concepts": [
            {"name": "ex:A", "dataType": "xs:decimal", "periodType": "instant"},
            {"name": "ex:B", "dataType": "xs:decimal", "periodType": "instant"},
            {"name": "ex:C", "dataType": "xs:decimal", "periodType": "instant"}
        ],
        "networks": [{
            "name": "ex:N",
            "relationshipTypeName": "xbrl:parent-child",
            "relationships": [{"source": "ex:C", "target": "ex:A"}]
        }]
    })))
    .model;

    let opts = ValidateOptions::default();
    let first = validate_taxonomy(&model, &opts);
    assert_eq!(first.count(IssueCode::DuplicateRelationship), 0);
    let network = model.lookup(&ex("N")).unwrap();
    assert_eq!(RelationshipSet::new(&model, network).len(), 1);

    let (_, report) = TaxonomyBuilder::new(&NoImports)
        .build_into(
            &mut model,
            &taxonomy_document(json!({
                "name": "ex:Ext",
                "networks": [{
                    "extendTargetName": "ex:N",
                    "relationships": [
                        {"source": "ex:A", "target": "ex:B"},
                        {"source": "ex:A", "target": "ex:B"}
                    ]
                }]
            })),
            "ext.json",
        )
        .unwrap();
    assert!(report.is_clean(), "{report}");
    assert!(!model.is_validated());

    let second = validate_taxonomy(&model, &opts);
    let network = model.lookup(&ex("N")).unwrap();
    assert_eq!(RelationshipSet::new(&model, network).len(), 3);
    assert_eq!(second.count(IssueCode::DuplicateRelationship), 1);
}

#[test]
fn one_unknown_field_is_one_aggregate_diagnostic() {
    let outcome = build(&taxonomy_document(json!({
        "name": "ex:T",
        "concepts": [
            {"name": "ex:Cash", "dataType": "xs:decimal", "periodType": "instant", "colour": "green"}
        ]
    })));

    assert_eq!(outcome.report.count(IssueCode::UndeclaredElement), 1);
    assert_eq!(outcome.report.issues.len(), 1);
    let cash = outcome.model.lookup(&ex("Cash")).unwrap();
    assert_eq!(cash.kind(), ObjectKind::Concept);
    assert_eq!(cash.str("periodType"), Some("instant"));
}

#[test]
fn unsupported_document_type_is_the_only_hard_error() {
    let doc = json!({
        "documentInfo": {"documentType": "https://example.com/other"},
        "taxonomy": {"name": "ex:T"}
    });
    let result = TaxonomyBuilder::new(&NoImports).build(&doc, "x.json");
    assert!(matches!(
        result,
        Err(TaxonomyError::UnsupportedDocumentType { .. })
    ));
}
