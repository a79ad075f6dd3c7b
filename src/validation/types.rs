//! Concepts, data types, units and transforms.

use regex::Regex;

use super::{Checker, IssueKind};
use crate::model::{ObjectKind, QName, TaxonomyObject, XBRLI_NS};

const BALANCES: &[&str] = &["debit", "credit"];

pub(super) fn validate(checker: &mut Checker<'_>) {
    for concept in checker.objects(ObjectKind::Concept) {
        validate_concept(checker, concept);
    }
    for data_type in checker.objects(ObjectKind::DataType) {
        validate_data_type(checker, data_type);
    }
    for unit_type in checker.objects(ObjectKind::UnitType) {
        for property in ["dataTypeNumerator", "dataTypeDenominator", "dataTypeMultiplier"] {
            checker.reference(unit_type, property, &[ObjectKind::DataType]);
        }
    }
    for unit in checker.objects(ObjectKind::Unit) {
        checker.reference(unit, "dataType", &[ObjectKind::DataType]);
    }
    for transform in checker.objects(ObjectKind::Transform) {
        checker.reference(transform, "inputDataType", &[ObjectKind::DataType]);
        checker.reference(transform, "outputDataType", &[ObjectKind::DataType]);
    }
}

fn validate_concept<'m>(checker: &mut Checker<'m>, concept: &'m TaxonomyObject) {
    let data_type = checker.reference(concept, "dataType", &[ObjectKind::DataType]);
    checker.enumeration(concept, "periodType", crate::model::PeriodType::VALUES);
    checker.reference(concept, "enumerationDomain", &[ObjectKind::Domain]);

    // Balance only applies to monetary values.
    if checker.enumeration(concept, "balance", BALANCES).is_some() {
        if let Some(data_type) = data_type.and_then(TaxonomyObject::name) {
            let monetary = QName::new(XBRLI_NS, "monetaryItemType");
            if !checker.model.data_type_derives_from(data_type, &monetary) {
                checker.issue(
                    IssueKind::InvalidBalance {
                        data_type: data_type.clone(),
                    },
                    concept,
                );
            }
        }
    }
}

fn validate_data_type<'m>(checker: &mut Checker<'m>, data_type: &'m TaxonomyObject) {
    if checker
        .reference(data_type, "baseType", &[ObjectKind::DataType])
        .is_some()
        && checker.inherits_from_itself(data_type, "baseType")
    {
        if let Some(name) = data_type.name() {
            checker.issue(IssueKind::CyclicInheritance { name: name.clone() }, data_type);
        }
    }

    for reason in facet_problems(data_type) {
        checker.issue(IssueKind::InvalidDataTypeFacets { reason }, data_type);
    }
}

fn facet_problems(data_type: &TaxonomyObject) -> Vec<String> {
    let mut problems = Vec::new();
    let both = |a: &str, b: &str| data_type.has(a) && data_type.has(b);

    if both("minInclusive", "minExclusive") {
        problems.push("minInclusive and minExclusive cannot both be declared".to_string());
    }
    if both("maxInclusive", "maxExclusive") {
        problems.push("maxInclusive and maxExclusive cannot both be declared".to_string());
    }
    let lower = data_type
        .number("minInclusive")
        .map(|v| (v, true))
        .or_else(|| data_type.number("minExclusive").map(|v| (v, false)));
    let upper = data_type
        .number("maxInclusive")
        .map(|v| (v, true))
        .or_else(|| data_type.number("maxExclusive").map(|v| (v, false)));
    if let (Some((low, low_inclusive)), Some((high, high_inclusive))) = (lower, upper) {
        let empty = if low_inclusive && high_inclusive {
            low > high
        } else {
            low >= high
        };
        if empty {
            problems.push(format!("lower bound {low} is not below upper bound {high}"));
        }
    }

    if let (Some(fraction), Some(total)) = (
        data_type.integer("fractionDigits"),
        data_type.integer("totalDigits"),
    ) {
        if fraction > total {
            problems.push(format!("fractionDigits {fraction} exceeds totalDigits {total}"));
        }
    }
    for facet in ["totalDigits", "fractionDigits", "length", "minLength", "maxLength"] {
        if data_type.integer(facet).is_some_and(|v| v < 0) {
            problems.push(format!("{facet} must not be negative"));
        }
    }
    if let (Some(min), Some(max)) = (data_type.integer("minLength"), data_type.integer("maxLength")) {
        if min > max {
            problems.push(format!("minLength {min} exceeds maxLength {max}"));
        }
    }
    if data_type.has("length") && (data_type.has("minLength") || data_type.has("maxLength")) {
        problems.push("length cannot be combined with minLength or maxLength".to_string());
    }

    for pattern in data_type.strings("patterns") {
        if let Err(err) = Regex::new(&format!("^(?:{pattern})$")) {
            problems.push(format!("pattern '{pattern}' is invalid: {err}"));
        }
    }
    problems
}

#[cfg(test)]
mod tests {
    use super::super::tests::validate;
    use super::super::IssueCode;
    use serde_json::json;

    #[test]
    fn test_period_type_and_balance() {
        let (_, report) = validate(json!({
            "name": "ex:T",
            "concepts": [
                {"name": "ex:A", "dataType": "xs:decimal", "periodType": "always"},
                {"name": "ex:B", "dataType": "xs:string", "periodType": "instant", "balance": "debit"},
                {"name": "ex:C", "dataType": "xbrli:monetaryItemType", "periodType": "instant", "balance": "credit"},
                {"name": "ex:D", "dataType": "xbrli:monetaryItemType", "periodType": "instant", "balance": "left"}
            ]
        }));
        assert_eq!(report.count(IssueCode::InvalidEnumerationValue), 2);
        assert_eq!(report.count(IssueCode::InvalidBalance), 1);
    }

    #[test]
    fn test_data_type_cycle_and_facets() {
        let (_, report) = validate(json!({
            "name": "ex:T",
            "dataTypes": [
                {"name": "ex:Loop1", "baseType": "ex:Loop2"},
                {"name": "ex:Loop2", "baseType": "ex:Loop1"},
                {"name": "ex:Range", "baseType": "xs:decimal", "minInclusive": 10, "maxInclusive": 1},
                {"name": "ex:Digits", "baseType": "xs:decimal", "totalDigits": 2, "fractionDigits": 4},
                {"name": "ex:Pattern", "baseType": "xs:string", "patterns": ["[a-"]},
                {"name": "ex:Fine", "baseType": "xs:string", "minLength": 1, "maxLength": 3, "patterns": ["[a-z]+"]}
            ]
        }));
        assert_eq!(report.count(IssueCode::CyclicInheritance), 2);
        assert_eq!(report.count(IssueCode::InvalidDataTypeFacets), 3);
    }

    #[test]
    fn test_unit_data_type_reference() {
        let (_, report) = validate(json!({
            "name": "ex:T",
            "units": [{"name": "ex:widgets", "dataType": "ex:WidgetType"}]
        }));
        assert_eq!(report.count(IssueCode::UnresolvedReference), 1);
    }
}
