//! Import selection: filtering an imported range down to the objects an
//! ImportTaxonomy asks for.
//!
//! Criteria come either from named export profiles of the imported taxonomy
//! or from the import's own `importObjects`, `importObjectTypes` and
//! `selections`, never both. Selected top-level objects are marked in a
//! bitset over the imported arena range; everything else at top level is
//! removed.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::ops::Range;

use serde_json::Value;
use tracing::debug;

use super::BuildContext;
use crate::model::{
    Namespaces, ObjectId, ObjectKind, PropertyValue, QName, TaxonomyModel, TaxonomyObject,
};
use crate::validation::IssueKind;

pub const OPERATORS: &[&str] = &[
    "==",
    "!=",
    "in",
    "not in",
    "contains",
    "not contains",
    "<",
    "<=",
    ">",
    ">=",
];

/// Selection criteria gathered from an import or its profiles. Each
/// selection keeps the namespace bindings of the document declaring it, so
/// its QName literals resolve the way its author wrote them.
#[derive(Default)]
struct Criteria<'n> {
    names: Vec<QName>,
    types: Vec<QName>,
    selections: Vec<(ObjectId, &'n Namespaces)>,
}

impl<'n> Criteria<'n> {
    fn extend_from(&mut self, obj: &TaxonomyObject, names: &str, types: &str, namespaces: &'n Namespaces) {
        self.names.extend(obj.qnames(names).iter().cloned());
        self.types.extend(obj.qnames(types).iter().cloned());
        self.selections
            .extend(obj.children("selections").iter().map(|id| (*id, namespaces)));
    }
}

/// A compiled selection statement: object kind plus AND-ed predicates.
struct Statement<'a> {
    kind: ObjectKind,
    predicates: Vec<(&'a str, &'a str, &'a Value)>,
}

/// Filters the objects in `range`, just loaded for `import`. `importing`
/// holds the bindings of the document declaring the import, `imported`
/// those of the document that was loaded.
pub(super) fn apply(
    ctx: &mut BuildContext<'_>,
    import: ObjectId,
    range: Range<usize>,
    importing: &Namespaces,
    imported: &Namespaces,
) {
    let import_obj = ctx.model.object(import);
    let profiles = import_obj.qnames("profiles").to_vec();
    let explicit = import_obj.has("importObjects")
        || import_obj.has("importObjectTypes")
        || !import_obj.children("selections").is_empty();
    let taxonomy = import_obj
        .qname("taxonomyName")
        .cloned()
        .unwrap_or_else(|| QName::xbrl("unknown"));

    if !profiles.is_empty() && explicit {
        ctx.issue_at(IssueKind::InvalidImportTaxonomy { taxonomy }, import);
        return;
    }

    let mut criteria = Criteria::default();
    if profiles.is_empty() {
        criteria.extend_from(ctx.model.object(import), "importObjects", "importObjectTypes", importing);
    } else {
        for profile in &profiles {
            let found = range
                .clone()
                .map(ObjectId::new)
                .map(|id| ctx.model.object(id))
                .find(|o| {
                    !o.is_removed() && o.kind() == ObjectKind::ExportProfile && o.name() == Some(profile)
                })
                .map(|o| o.id());
            match found {
                Some(id) => {
                    let obj = ctx.model.object(id);
                    criteria.extend_from(obj, "exportObjects", "exportObjectTypes", imported);
                }
                None => ctx.issue_at(
                    IssueKind::UnknownExportProfile {
                        profile: profile.clone(),
                    },
                    import,
                ),
            }
        }
    }
    let top_level = top_level_objects(ctx.model, &range);
    let mut selected = vec![false; range.len()];
    let slot = |id: ObjectId| id.index() - range.start;

    // Statements, OR-ed. Invalid statements are reported and skipped; a
    // selection list with no valid statement left is no criterion at all.
    let mut issues = Vec::new();
    let has_statements = {
        let model = &*ctx.model;
        let statements: Vec<(Statement<'_>, &Namespaces)> = criteria
            .selections
            .iter()
            .filter_map(|(selection, namespaces)| {
                compile(model, *selection, &mut issues).map(|statement| (statement, *namespaces))
            })
            .collect();
        for (statement, namespaces) in &statements {
            for id in &top_level {
                let obj = model.object(*id);
                if obj.kind() == statement.kind && statement.matches(obj, namespaces) {
                    selected[slot(*id)] = true;
                }
            }
        }
        !statements.is_empty()
    };
    for (kind, at) in issues {
        ctx.issue_at(kind, at);
    }
    if criteria.names.is_empty() && criteria.types.is_empty() && !has_statements {
        return;
    }

    // Explicit names.
    for name in &criteria.names {
        let hit = top_level
            .iter()
            .find(|id| ctx.model.object(**id).name() == Some(name));
        match hit {
            Some(id) => selected[slot(*id)] = true,
            None => ctx.issue_at(IssueKind::UnknownImportObject { name: name.clone() }, import),
        }
    }

    // Object types.
    let mut selected_types: HashSet<QName> = HashSet::new();
    for type_name in &criteria.types {
        match ObjectKind::from_type_qname(type_name) {
            Some(kind) => {
                selected_types.insert(type_name.clone());
                for id in &top_level {
                    if ctx.model.object(*id).kind() == kind {
                        selected[slot(*id)] = true;
                    }
                }
            }
            None => ctx.issue_at(
                IssueKind::UnknownObjectType {
                    name: type_name.clone(),
                },
                import,
            ),
        }
    }

    // Tags follow what they annotate.
    let survivors: HashSet<QName> = top_level
        .iter()
        .filter(|id| selected[slot(**id)])
        .filter_map(|id| ctx.model.object(*id).name().cloned())
        .collect();
    for id in &top_level {
        let obj = ctx.model.object(*id);
        if !obj.kind().is_tag() || selected[slot(*id)] {
            continue;
        }
        if obj
            .related_names()
            .iter()
            .any(|q| survivors.contains(*q) || selected_types.contains(*q))
        {
            selected[slot(*id)] = true;
        }
    }

    let mut removed = 0usize;
    for id in top_level {
        if !selected[slot(id)] {
            ctx.model.remove(id);
            removed += 1;
        }
    }
    debug!(%taxonomy, removed, "applied import selection");
}

/// Objects in the range that sit directly in a taxonomy's collections.
fn top_level_objects(model: &TaxonomyModel, range: &Range<usize>) -> Vec<ObjectId> {
    range
        .clone()
        .map(ObjectId::new)
        .filter(|id| {
            let obj = model.object(*id);
            if obj.is_removed() {
                return false;
            }
            match obj.parent() {
                Some((parent, property)) => {
                    model.object(parent).kind() == ObjectKind::Taxonomy
                        && property != "importedTaxonomies"
                }
                None => false,
            }
        })
        .collect()
}

/// Diagnostics for one selection statement, without applying it.
pub(crate) fn selection_issues(model: &TaxonomyModel, selection: ObjectId) -> Vec<(IssueKind, ObjectId)> {
    let mut issues = Vec::new();
    compile(model, selection, &mut issues);
    issues
}

fn compile<'m>(
    model: &'m TaxonomyModel,
    selection: ObjectId,
    issues: &mut Vec<(IssueKind, ObjectId)>,
) -> Option<Statement<'m>> {
    let obj = model.object(selection);
    let type_name = obj.qname("objectType")?;
    let Some(kind) = ObjectKind::from_type_qname(type_name) else {
        issues.push((
            IssueKind::UnknownObjectType {
                name: type_name.clone(),
            },
            selection,
        ));
        return None;
    };

    let mut predicates = Vec::new();
    let mut valid = true;
    for pred_id in obj.children("where") {
        let pred = model.object(*pred_id);
        let (Some(property), Some(operator), Some(value)) =
            (pred.str("property"), pred.str("operator"), pred.any("value"))
        else {
            valid = false;
            continue;
        };
        if kind.descriptor(property).is_none() {
            issues.push((
                IssueKind::InvalidSelectionProperty {
                    object_type: type_name.clone(),
                    property: property.to_string(),
                },
                *pred_id,
            ));
            valid = false;
        }
        if !OPERATORS.contains(&operator) {
            issues.push((
                IssueKind::InvalidSelectionOperator {
                    operator: operator.to_string(),
                },
                *pred_id,
            ));
            valid = false;
        }
        predicates.push((property, operator, value));
    }
    valid.then_some(Statement { kind, predicates })
}

/// A property value reduced to something predicates can compare.
#[derive(Clone, Debug, PartialEq)]
enum Operand {
    Text(String),
    Number(f64),
    Bool(bool),
    List(Vec<Operand>),
}

impl Operand {
    fn from_property(value: &PropertyValue) -> Option<Self> {
        Some(match value {
            PropertyValue::String(s) => Operand::Text(s.clone()),
            PropertyValue::Number(n) => Operand::Number(*n),
            PropertyValue::Integer(n) => Operand::Number(*n as f64),
            PropertyValue::Boolean(b) => Operand::Bool(*b),
            PropertyValue::Date(d) => Operand::Text(d.to_string()),
            PropertyValue::Duration(d) => Operand::Text(d.to_string()),
            PropertyValue::QName(q) => Operand::Text(q.clark()),
            PropertyValue::QNames(list) => {
                Operand::List(list.iter().map(|q| Operand::Text(q.clark())).collect())
            }
            PropertyValue::Strings(list) => {
                Operand::List(list.iter().cloned().map(Operand::Text).collect())
            }
            PropertyValue::Any(v) => return Operand::from_literal(v, None),
            PropertyValue::Object(_) | PropertyValue::Objects(_) | PropertyValue::QNameMap(_) => {
                return None
            }
        })
    }

    /// Converts a predicate literal. Strings that read as QNames are
    /// normalised to Clark notation so they compare equal to QName values.
    fn from_literal(value: &Value, namespaces: Option<&Namespaces>) -> Option<Self> {
        Some(match value {
            Value::String(s) => match namespaces.and_then(|ns| QName::parse_lenient(s, ns).ok()) {
                Some(q) => Operand::Text(q.clark()),
                None => Operand::Text(s.clone()),
            },
            Value::Number(n) => Operand::Number(n.as_f64()?),
            Value::Bool(b) => Operand::Bool(*b),
            Value::Array(items) => Operand::List(
                items
                    .iter()
                    .filter_map(|i| Operand::from_literal(i, namespaces))
                    .collect(),
            ),
            Value::Null | Value::Object(_) => return None,
        })
    }

    fn compare(&self, other: &Operand) -> Option<Ordering> {
        match (self, other) {
            (Operand::Number(a), Operand::Number(b)) => a.partial_cmp(b),
            (Operand::Text(a), Operand::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    fn contains(&self, needle: &Operand) -> bool {
        match (self, needle) {
            (Operand::List(items), _) => items.contains(needle),
            (Operand::Text(hay), Operand::Text(n)) => hay.contains(n.as_str()),
            _ => false,
        }
    }
}

fn evaluate(actual: Option<&Operand>, operator: &str, expected: &Operand) -> bool {
    let Some(actual) = actual else {
        // An absent property only satisfies negative operators.
        return matches!(operator, "!=" | "not in" | "not contains");
    };
    match operator {
        "==" => actual == expected,
        "!=" => actual != expected,
        "in" => expected.contains(actual),
        "not in" => !expected.contains(actual),
        "contains" => actual.contains(expected),
        "not contains" => !actual.contains(expected),
        "<" => actual.compare(expected) == Some(Ordering::Less),
        "<=" => matches!(actual.compare(expected), Some(Ordering::Less | Ordering::Equal)),
        ">" => actual.compare(expected) == Some(Ordering::Greater),
        ">=" => matches!(
            actual.compare(expected),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        _ => false,
    }
}

impl Statement<'_> {
    fn matches(&self, obj: &TaxonomyObject, namespaces: &Namespaces) -> bool {
        self.predicates.iter().all(|(property, operator, value)| {
            let Some(expected) = Operand::from_literal(value, Some(namespaces)) else {
                return false;
            };
            let actual = obj.get(property).and_then(Operand::from_property);
            evaluate(actual.as_ref(), operator, &expected)
        })
    }
}
