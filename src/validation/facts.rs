//! Facts of report documents.
//!
//! Runs after the model has been marked validated, since cube membership
//! goes through [`usable_cubes`].

use super::{Checker, IssueKind};
use crate::cube::{fact_concept, fact_dimension, fact_period, usable_cubes, CoreDimension};
use crate::model::{ObjectKind, PeriodType, TaxonomyObject};

pub(super) fn validate(checker: &mut Checker<'_>) {
    let model = checker.model;
    let has_cubes = checker.objects(ObjectKind::Cube).next().is_some();
    for fact in model.facts() {
        validate_fact(checker, fact);
        if !has_cubes {
            continue;
        }
        if let Ok(cubes) = usable_cubes(fact, model) {
            if cubes.is_empty() {
                checker.issue(IssueKind::FactNotInCube, fact);
            }
        }
    }
}

fn validate_fact<'m>(checker: &mut Checker<'m>, fact: &'m TaxonomyObject) {
    let name = fact_concept(fact);
    let concept = name.and_then(|name| checker.model.lookup_kind(name, ObjectKind::Concept));
    let Some(concept) = concept else {
        checker.issue(
            IssueKind::MissingFactConcept {
                concept: name.cloned(),
            },
            fact,
        );
        return;
    };

    let found = match fact_dimension(fact, &CoreDimension::Period.qname()) {
        None => PeriodType::None,
        Some(value) => match fact_period(fact) {
            Some(period) => period.period_type(),
            None => {
                checker.issue(
                    IssueKind::InvalidFactPeriod {
                        value: value.to_string(),
                    },
                    fact,
                );
                return;
            }
        },
    };
    let (Some(expected), Some(concept_name)) = (
        concept.str("periodType").and_then(PeriodType::parse),
        concept.name(),
    ) else {
        return;
    };
    if expected != found {
        checker.issue(
            IssueKind::FactPeriodTypeMismatch {
                concept: concept_name.clone(),
                expected,
                found,
            },
            fact,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::document;
    use super::super::{validate_taxonomy, IssueCode, ValidateOptions};
    use crate::builder::{NoImports, TaxonomyBuilder};
    use serde_json::{json, Value};

    fn report(cubes: Value, facts: Value) -> super::super::ValidationReport {
        let mut doc = document(json!({
            "name": "ex:T",
            "concepts": [
                {"name": "ex:Sales", "dataType": "xs:decimal", "periodType": "duration"},
                {"name": "ex:Cash", "dataType": "xs:decimal", "periodType": "instant"}
            ],
            "cubes": cubes
        }));
        doc["documentInfo"]["documentType"] = json!("https://xbrl.org/2025/report");
        doc["facts"] = facts;
        let outcome = TaxonomyBuilder::new(&NoImports).build(&doc, "r.json").unwrap();
        validate_taxonomy(&outcome.model, &ValidateOptions::default())
    }

    #[test]
    fn test_fact_rules() {
        let report = report(
            json!([]),
            json!({
                "ok": {"value": "1", "dimensions": {"concept": "ex:Sales", "period": "2023-01-01/2023-12-31"}},
                "nope": {"value": "1", "dimensions": {"concept": "ex:Ghost", "period": "2023-12-31"}},
                "bad": {"value": "1", "dimensions": {"concept": "ex:Sales", "period": "last year"}},
                "wrong": {"value": "1", "dimensions": {"concept": "ex:Cash", "period": "2023-01-01/2023-12-31"}}
            }),
        );
        assert_eq!(report.count(IssueCode::MissingFactConcept), 1);
        assert_eq!(report.count(IssueCode::InvalidFactPeriod), 1);
        assert_eq!(report.count(IssueCode::FactPeriodTypeMismatch), 1);
        // No cubes, no membership warnings.
        assert_eq!(report.count(IssueCode::FactNotInAnyCube), 0);
    }

    #[test]
    fn test_fact_not_in_any_cube() {
        let report = report(
            json!([{
                "name": "ex:Annual",
                "cubeDimensions": [
                    {"dimensionName": "xbrl:concept"},
                    {"dimensionName": "xbrl:period", "periodConstraints": [{"periodType": "duration", "timeSpan": "P1Y"}]}
                ]
            }]),
            json!({
                "year": {"value": "1", "dimensions": {"concept": "ex:Sales", "period": "2023-01-01/2023-12-31"}},
                "quarter": {"value": "1", "dimensions": {"concept": "ex:Sales", "period": "2023-01-01/2023-03-31"}}
            }),
        );
        assert_eq!(report.count(IssueCode::FactNotInAnyCube), 1);
        assert!(report.is_ok(), "{report}");
    }

    #[test]
    fn test_facts_can_be_skipped() {
        let mut doc = document(json!({"name": "ex:T"}));
        doc["documentInfo"]["documentType"] = json!("https://xbrl.org/2025/report");
        doc["facts"] = json!({"f": {"dimensions": {"concept": "ex:Ghost"}}});
        let outcome = TaxonomyBuilder::new(&NoImports).build(&doc, "r.json").unwrap();
        let opts = ValidateOptions {
            check_facts: false,
            ..ValidateOptions::default()
        };
        assert!(validate_taxonomy(&outcome.model, &opts).is_clean());
    }
}
