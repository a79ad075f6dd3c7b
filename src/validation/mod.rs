//! Taxonomy validation.
//!
//! Validation runs one pass per family of object kinds over a completed
//! [`TaxonomyModel`]. Passes only read the model (plus write-once caches)
//! and append to a private report, so their order does not matter and
//! re-running them yields identical results. Diagnostics are emitted in
//! arena order, never in hash order.
//!
//! A check whose prerequisite reference does not resolve is skipped: the
//! unresolved reference is reported once, by the rule that owns it.

mod annotations;
mod cubes;
mod facts;
mod graphs;
mod groups;
mod properties;
mod report;
mod tables;
mod types;

pub use report::{IssueCode, IssueKind, ObjectRef, Severity, ValidationIssue, ValidationReport};

use std::collections::HashSet;

use tracing::info;

use crate::model::{ObjectKind, QName, TaxonomyModel, TaxonomyObject};

/// Options for validation behavior.
#[derive(Clone, Debug)]
pub struct ValidateOptions {
    /// If true, treat warnings as errors.
    pub strict: bool,
    /// Check facts of report documents, including cube membership.
    pub check_facts: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            strict: false,
            check_facts: true,
        }
    }
}

/// Validates a taxonomy model and returns a report of all issues found.
///
/// The model is marked validated afterwards (whatever the outcome), which
/// is what [`usable_cubes`](crate::cube::usable_cubes) requires.
pub fn validate_taxonomy(model: &TaxonomyModel, opts: &ValidateOptions) -> ValidationReport {
    let mut checker = Checker::new(model);

    types::validate(&mut checker);
    graphs::validate(&mut checker);
    cubes::validate(&mut checker);
    annotations::validate(&mut checker);
    properties::validate(&mut checker);
    tables::validate(&mut checker);
    groups::validate(&mut checker);

    model.mark_validated();
    if opts.check_facts {
        facts::validate(&mut checker);
    }

    let report = checker.report;
    info!(
        errors = report.error_count(),
        warnings = report.warning_count(),
        strict = opts.strict,
        "validated taxonomy"
    );
    report
}

/// Shared state of the validation passes.
pub(crate) struct Checker<'m> {
    model: &'m TaxonomyModel,
    report: ValidationReport,
}

impl<'m> Checker<'m> {
    fn new(model: &'m TaxonomyModel) -> Self {
        Self {
            model,
            report: ValidationReport::new(),
        }
    }

    fn issue(&mut self, kind: IssueKind, obj: &TaxonomyObject) {
        self.report.add(ValidationIssue::at(kind, obj));
    }

    fn issue_all<'a>(&mut self, kind: IssueKind, objs: impl IntoIterator<Item = &'a TaxonomyObject>) {
        self.report.add(ValidationIssue::at_all(kind, objs));
    }

    fn objects(&self, kind: ObjectKind) -> impl Iterator<Item = &'m TaxonomyObject> {
        self.model.objects_of_kind(kind)
    }

    fn object(&self, id: crate::model::ObjectId) -> &'m TaxonomyObject {
        self.model.object(id)
    }

    /// Resolves `name` and checks the target kind. Reports
    /// `unresolvedReference` or `invalidReferenceKind` on `owner` and
    /// returns the target only when both checks pass.
    fn check_reference(
        &mut self,
        owner: &TaxonomyObject,
        property: &'static str,
        name: &QName,
        expected: &[ObjectKind],
    ) -> Option<&'m TaxonomyObject> {
        let Some(target) = self.model.lookup(name) else {
            self.issue(
                IssueKind::UnresolvedReference {
                    property,
                    name: name.clone(),
                },
                owner,
            );
            return None;
        };
        if !expected.is_empty() && !expected.contains(&target.kind()) {
            self.issue(
                IssueKind::WrongReferenceKind {
                    property,
                    name: name.clone(),
                    expected: expected
                        .iter()
                        .map(|k| k.name())
                        .collect::<Vec<_>>()
                        .join(" or "),
                    found: target.kind(),
                },
                owner,
            );
            return None;
        }
        Some(target)
    }

    /// [`check_reference`](Self::check_reference) on a single-QName property.
    fn reference(
        &mut self,
        owner: &'m TaxonomyObject,
        property: &'static str,
        expected: &[ObjectKind],
    ) -> Option<&'m TaxonomyObject> {
        let name = owner.qname(property)?;
        self.check_reference(owner, property, name, expected)
    }

    /// Checks every name of a QName-list property.
    fn references(&mut self, owner: &'m TaxonomyObject, property: &'static str, expected: &[ObjectKind]) {
        for name in owner.qnames(property) {
            self.check_reference(owner, property, name, expected);
        }
    }

    /// Checks a string property against a closed set of values. Returns the
    /// value when it is allowed.
    fn enumeration(
        &mut self,
        owner: &'m TaxonomyObject,
        property: &'static str,
        allowed: &'static [&'static str],
    ) -> Option<&'m str> {
        let value = owner.str(property)?;
        if allowed.contains(&value) {
            return Some(value);
        }
        self.issue(
            IssueKind::InvalidEnumeration {
                property,
                value: value.to_string(),
                allowed,
            },
            owner,
        );
        None
    }

    /// Checks that every name of a list property is an object type QName
    /// such as `xbrl:conceptObject`.
    fn object_types(&mut self, owner: &TaxonomyObject, property: &'static str) {
        for name in owner.qnames(property) {
            if ObjectKind::from_type_qname(name).is_none() {
                self.issue(IssueKind::UnknownObjectType { name: name.clone() }, owner);
            }
        }
    }

    /// Whether following `property` (a base-type link) from `obj` through
    /// objects of the same kind leads back to `obj`.
    fn inherits_from_itself(&self, obj: &TaxonomyObject, property: &str) -> bool {
        let Some(name) = obj.name() else {
            return false;
        };
        let mut seen = HashSet::new();
        let mut current = obj.qname(property);
        while let Some(q) = current {
            if q == name {
                return true;
            }
            if !seen.insert(q) {
                return false;
            }
            current = self
                .model
                .lookup_kind(q, obj.kind())
                .and_then(|base| base.qname(property));
        }
        false
    }

    /// Reports `invalidNameOrExtendTarget` unless exactly one of `name` and
    /// `extendTargetName` is present.
    fn name_or_extend_target(&mut self, owner: &TaxonomyObject) -> bool {
        if owner.has("name") == owner.has("extendTargetName") {
            self.issue(IssueKind::NameOrExtendTarget, owner);
            return false;
        }
        true
    }
}

/// The object an extension points at, or the object itself.
pub(crate) fn extension_base<'m>(model: &'m TaxonomyModel, obj: &'m TaxonomyObject) -> &'m TaxonomyObject {
    obj.qname("extendTargetName")
        .and_then(|target| model.lookup_kind(target, obj.kind()))
        .unwrap_or(obj)
}
