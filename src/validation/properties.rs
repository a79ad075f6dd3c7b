//! Property types and the property values attached to objects.

use serde_json::Value;

use super::{Checker, IssueKind};
use crate::model::{ObjectKind, TaxonomyObject};

pub(super) fn validate(checker: &mut Checker<'_>) {
    for property_type in checker.objects(ObjectKind::PropertyType) {
        checker.reference(property_type, "dataType", &[ObjectKind::DataType]);
        checker.reference(property_type, "enumerationDomain", &[ObjectKind::Domain]);
        checker.object_types(property_type, "allowedObjects");
    }
    for property in checker.objects(ObjectKind::Property) {
        validate_property(checker, property);
    }
}

fn validate_property<'m>(checker: &mut Checker<'m>, property: &'m TaxonomyObject) {
    let Some(property_type) = checker.reference(property, "property", &[ObjectKind::PropertyType]) else {
        return;
    };
    let Some(name) = property_type.name() else {
        return;
    };

    let allowed = property_type.qnames("allowedObjects");
    if let Some((owner, _)) = property.parent() {
        let owner = checker.object(owner).kind();
        if !allowed.is_empty() && !allowed.contains(&owner.type_qname()) {
            checker.issue(
                IssueKind::PropertyNotAllowed {
                    property: name.clone(),
                    owner,
                },
                property,
            );
        }
    }

    let (Some(data_type), Some(value)) = (property_type.qname("dataType"), property.any("value")) else {
        return;
    };
    let text = lexical_form(value);
    if !checker.model.lexical_conforms(data_type, &text) {
        checker.issue(
            IssueKind::InvalidPropertyValue {
                property: name.clone(),
                value: text,
                data_type: data_type.clone(),
            },
            property,
        );
    }
}

/// The text a JSON value stands for when checked against a data type.
fn lexical_form(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
