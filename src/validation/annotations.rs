//! Labels, references and their types.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::{Checker, IssueKind};
use crate::model::{ObjectKind, QName, TaxonomyObject};

static LANGUAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z]{1,8}(-[A-Za-z0-9]{1,8})*$").expect("language pattern is a valid regex")
});

pub(super) fn validate(checker: &mut Checker<'_>) {
    for label_type in checker.objects(ObjectKind::LabelType) {
        checker.object_types(label_type, "allowedObjects");
    }
    for reference_type in checker.objects(ObjectKind::ReferenceType) {
        checker.object_types(reference_type, "allowedObjects");
        checker.references(reference_type, "orderedProperties", &[ObjectKind::PropertyType]);
    }

    let mut first_label: HashMap<(QName, QName, String), &TaxonomyObject> = HashMap::new();
    for label in checker.objects(ObjectKind::Label) {
        validate_label(checker, label);

        let (Some(target), Some(label_type), Some(language)) = (
            label.qname("relatedName"),
            label.qname("labelType"),
            label.str("language"),
        ) else {
            continue;
        };
        let key = (target.clone(), label_type.clone(), language.to_ascii_lowercase());
        match first_label.get(&key) {
            Some(first) => checker.issue_all(
                IssueKind::DuplicateLabel {
                    target: target.clone(),
                    label_type: label_type.clone(),
                    language: language.to_string(),
                },
                [label, *first],
            ),
            None => {
                first_label.insert(key, label);
            }
        }
    }

    for reference in checker.objects(ObjectKind::Reference) {
        validate_reference(checker, reference);
    }
}

fn check_language(checker: &mut Checker<'_>, owner: &TaxonomyObject) {
    if let Some(language) = owner.str("language") {
        if !LANGUAGE_RE.is_match(language) {
            checker.issue(
                IssueKind::InvalidLanguage {
                    language: language.to_string(),
                },
                owner,
            );
        }
    }
}

/// Reports an annotation attached to an object its type does not allow.
fn check_target_allowed(
    checker: &mut Checker<'_>,
    annotation: &TaxonomyObject,
    annotation_type: Option<&TaxonomyObject>,
    name: &QName,
    target: &TaxonomyObject,
) {
    let Some(annotation_type) = annotation_type else {
        return;
    };
    let allowed = annotation_type.qnames("allowedObjects");
    if allowed.is_empty() || allowed.contains(&target.kind().type_qname()) {
        return;
    }
    if let Some(type_name) = annotation_type.name() {
        checker.issue(
            IssueKind::AnnotationTargetNotAllowed {
                target: name.clone(),
                annotation_type: type_name.clone(),
            },
            annotation,
        );
    }
}

fn validate_label<'m>(checker: &mut Checker<'m>, label: &'m TaxonomyObject) {
    let label_type = checker.reference(label, "labelType", &[ObjectKind::LabelType]);
    check_language(checker, label);

    let Some(name) = label.qname("relatedName") else {
        return;
    };
    match checker.model.lookup(name) {
        Some(target) => check_target_allowed(checker, label, label_type, name, target),
        // Object types (`xbrl:conceptObject`) may carry labels too.
        None if ObjectKind::from_type_qname(name).is_some() => {}
        None => checker.issue(IssueKind::UnresolvedLabelTarget { name: name.clone() }, label),
    }
}

fn validate_reference<'m>(checker: &mut Checker<'m>, reference: &'m TaxonomyObject) {
    let reference_type = checker.reference(reference, "referenceType", &[ObjectKind::ReferenceType]);
    check_language(checker, reference);

    for name in reference.qnames("relatedNames") {
        match checker.model.lookup(name) {
            Some(target) => check_target_allowed(checker, reference, reference_type, name, target),
            None if ObjectKind::from_type_qname(name).is_some() => {}
            None => checker.issue(IssueKind::UnresolvedReferenceTarget { name: name.clone() }, reference),
        }
    }

    let Some(reference_type) = reference_type else {
        return;
    };
    let ordered = reference_type.qnames("orderedProperties");
    let Some(type_name) = reference_type.name() else {
        return;
    };
    if ordered.is_empty() {
        return;
    }
    for id in reference.children("properties") {
        let property = checker.object(*id);
        let Some(property_name) = property.qname("property") else {
            continue;
        };
        if !ordered.contains(property_name) {
            checker.issue(
                IssueKind::ReferencePropertyNotAllowed {
                    property: property_name.clone(),
                    reference_type: type_name.clone(),
                },
                property,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::validate;
    use super::super::{IssueCode, Severity};
    use serde_json::json;

    #[test]
    fn test_label_rules() {
        let (_, report) = validate(json!({
            "name": "ex:T",
            "concepts": [{"name": "ex:Sales", "dataType": "xs:decimal", "periodType": "duration"}],
            "members": [{"name": "ex:North"}],
            "labels": [
                {"relatedName": "ex:Sales", "language": "en", "value": "Sales"},
                {"relatedName": "ex:Sales", "language": "en-GB", "value": "Turnover"},
                {"relatedName": "ex:Sales", "language": "english!", "value": "Sales"},
                {"relatedName": "ex:Ghost", "language": "en", "value": "Ghost"},
                {"relatedName": "ex:North", "labelType": "xbrl:periodEndLabel", "language": "en", "value": "North"},
                {"relatedName": "xbrl:conceptObject", "language": "en", "value": "Concept"}
            ]
        }));
        assert_eq!(report.count(IssueCode::InvalidLanguage), 1);
        assert_eq!(report.count(IssueCode::UnresolvedLabelTarget), 1);
        assert_eq!(report.count(IssueCode::InvalidAnnotationTarget), 1);
        assert_eq!(report.count(IssueCode::DuplicateLabel), 0);
    }

    #[test]
    fn test_duplicate_label_names_both() {
        let (_, report) = validate(json!({
            "name": "ex:T",
            "concepts": [{"name": "ex:Sales", "dataType": "xs:decimal", "periodType": "duration"}],
            "labels": [
                {"relatedName": "ex:Sales", "language": "en", "value": "Sales"},
                {"relatedName": "ex:Sales", "language": "de", "value": "Umsatz"},
                {"relatedName": "ex:Sales", "language": "en", "value": "Revenue"}
            ]
        }));
        assert_eq!(report.count(IssueCode::DuplicateLabel), 1);
        let issue = &report.issues[0];
        assert_eq!(issue.severity, Severity::Warning);
        assert_eq!(issue.objects.len(), 2);
        assert!(issue.objects[0].id > issue.objects[1].id);
    }

    #[test]
    fn test_reference_rules() {
        let (_, report) = validate(json!({
            "name": "ex:T",
            "concepts": [{"name": "ex:Sales", "dataType": "xs:decimal", "periodType": "duration"}],
            "propertyTypes": [{"name": "ex:page", "dataType": "xs:string"}],
            "references": [{
                "relatedNames": ["ex:Sales", "ex:Ghost"],
                "referenceType": "xbrl:authoritativeReference",
                "properties": [
                    {"property": "xbrl:publisher", "value": "IASB"},
                    {"property": "ex:page", "value": "12"}
                ]
            }]
        }));
        assert_eq!(report.count(IssueCode::UnresolvedReferenceTarget), 1);
        assert_eq!(report.count(IssueCode::InvalidReferenceProperty), 1);
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 1);
    }
}
