//! Table templates and data tables.

use std::collections::HashSet;

use super::{Checker, IssueKind};
use crate::model::{MapValue, ObjectKind, TaxonomyObject};

pub(super) fn validate(checker: &mut Checker<'_>) {
    for template in checker.objects(ObjectKind::TableTemplate) {
        validate_template(checker, template);
    }
    for table in checker.objects(ObjectKind::DataTable) {
        checker.reference(table, "cubeName", &[ObjectKind::Cube]);
        checker.reference(table, "tableTemplate", &[ObjectKind::TableTemplate]);
    }
}

fn validate_template<'m>(checker: &mut Checker<'m>, template: &'m TaxonomyObject) {
    let columns = template.strings("columns");
    let mut problems = Vec::new();

    if columns.is_empty() {
        problems.push("a table template needs at least one column".to_string());
    }
    let mut seen = HashSet::new();
    for column in columns {
        if !seen.insert(column.as_str()) {
            problems.push(format!("column '{column}' is declared more than once"));
        }
    }
    if let Some(row_id) = template.str("rowIdColumn") {
        if !seen.contains(row_id) {
            problems.push(format!("rowIdColumn '{row_id}' is not a column"));
        }
    }
    for (dimension, value) in template.qname_map("dimensions") {
        checker.check_reference(template, "dimensions", dimension, &[ObjectKind::Dimension]);
        // `$name` takes the dimension value from a column.
        if let MapValue::Text(text) = value {
            if let Some(column) = text.strip_prefix('$') {
                if !seen.contains(column) {
                    problems.push(format!("dimension {dimension} reads unknown column '{column}'"));
                }
            }
        }
    }

    for reason in problems {
        checker.issue(IssueKind::InvalidTableTemplate { reason }, template);
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::validate;
    use super::super::IssueCode;
    use serde_json::json;

    fn dimensions() -> serde_json::Value {
        json!([{"name": "ex:Region"}])
    }

    #[test]
    fn test_well_formed_table() {
        let (_, report) = validate(json!({
            "name": "ex:T",
            "dimensions": dimensions(),
            "cubes": [{"name": "ex:C", "cubeDimensions": [{"dimensionName": "xbrl:concept"}]}],
            "tableTemplates": [{
                "name": "ex:Template",
                "rowIdColumn": "id",
                "columns": ["id", "region", "amount"],
                "dimensions": {"ex:Region": "$region", "concept": "$amount"}
            }],
            "dataTables": [{"name": "ex:Table", "cubeName": "ex:C", "tableTemplate": "ex:Template"}]
        }));
        assert!(report.is_clean(), "{report}");
    }

    #[test]
    fn test_template_problems() {
        let (_, report) = validate(json!({
            "name": "ex:T",
            "dimensions": dimensions(),
            "tableTemplates": [{
                "name": "ex:Template",
                "rowIdColumn": "key",
                "columns": ["id", "id", "amount"],
                "dimensions": {"ex:Region": "$place", "ex:Missing": "$amount"}
            }],
            "dataTables": [{"name": "ex:Table", "cubeName": "ex:NoCube", "tableTemplate": "ex:Template"}]
        }));
        assert_eq!(report.count(IssueCode::InvalidTableTemplate), 3);
        assert_eq!(report.count(IssueCode::UnresolvedReference), 2);
    }
}
