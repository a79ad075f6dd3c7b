//! Groups and export profiles.

use std::collections::HashMap;

use super::{Checker, IssueKind};
use crate::builder::selection_issues;
use crate::model::{ObjectKind, QName, TaxonomyObject};

pub(super) fn validate(checker: &mut Checker<'_>) {
    for content in checker.objects(ObjectKind::GroupContent) {
        checker.reference(content, "groupName", &[ObjectKind::Group]);
        checker.references(content, "relatedNames", &[]);
    }

    let mut first_profile: HashMap<&QName, &TaxonomyObject> = HashMap::new();
    for profile in checker.objects(ObjectKind::ExportProfile) {
        if let Some(name) = profile.name() {
            match first_profile.get(name) {
                Some(first) => checker.issue_all(
                    IssueKind::DuplicateExportProfile { name: name.clone() },
                    [profile, *first],
                ),
                None => {
                    first_profile.insert(name, profile);
                }
            }
        }
        validate_profile(checker, profile);
    }
}

fn validate_profile<'m>(checker: &mut Checker<'m>, profile: &'m TaxonomyObject) {
    checker.references(profile, "exportObjects", &[]);
    checker.object_types(profile, "exportObjectTypes");
    for selection in profile.children("selections") {
        for (kind, at) in selection_issues(checker.model, *selection) {
            let obj = checker.object(at);
            checker.issue(kind, obj);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::validate;
    use super::super::IssueCode;
    use serde_json::json;

    #[test]
    fn test_group_contents() {
        let (_, report) = validate(json!({
            "name": "ex:T",
            "groups": [{"name": "ex:G"}],
            "concepts": [{"name": "ex:A", "dataType": "xs:string", "periodType": "instant"}],
            "groupContents": [
                {"groupName": "ex:G", "relatedNames": ["ex:A"]},
                {"groupName": "ex:A", "relatedNames": ["ex:Nothing"]}
            ]
        }));
        assert_eq!(report.count(IssueCode::InvalidReferenceKind), 1);
        assert_eq!(report.count(IssueCode::UnresolvedReference), 1);
    }

    #[test]
    fn test_export_profiles() {
        let (_, report) = validate(json!({
            "name": "ex:T",
            "concepts": [{"name": "ex:A", "dataType": "xs:string", "periodType": "instant"}],
            "exportProfiles": [
                {
                    "name": "ex:Core",
                    "exportObjects": ["ex:A", "ex:Gone"],
                    "exportObjectTypes": ["xbrl:conceptObject", "xbrl:thingObject"]
                },
                {
                    "name": "ex:Core",
                    "selections": [{
                        "objectType": "xbrl:conceptObject",
                        "where": [
                            {"property": "periodType", "operator": "==", "value": "instant"},
                            {"property": "colour", "operator": "~", "value": "red"}
                        ]
                    }]
                }
            ]
        }));
        assert_eq!(report.count(IssueCode::DuplicateExportProfile), 1);
        assert_eq!(report.count(IssueCode::UnresolvedReference), 1);
        assert_eq!(report.count(IssueCode::InvalidObjectType), 1);
        assert_eq!(report.count(IssueCode::InvalidSelectionProperty), 1);
        assert_eq!(report.count(IssueCode::InvalidSelectionOperator), 1);
    }
}
