//! Validation report types for structured diagnostics.
//!
//! Every diagnostic is an [`IssueKind`] carrying a typed payload. The stable
//! code, severity, message template and substitution arguments are all
//! derived from the kind, so the set of diagnostics is closed and
//! machine-checkable.

use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::model::{ObjectId, ObjectKind, PeriodType, QName, TaxonomyObject};

/// The result of building or validating a taxonomy.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    /// All issues found, in the order they were detected.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Creates a new empty report.
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Adds an issue to the report.
    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Appends every issue from `other`.
    pub fn merge(&mut self, other: ValidationReport) {
        self.issues.extend(other.issues);
    }

    /// Returns the number of errors in the report.
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    /// Returns the number of warnings in the report.
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    /// Number of issues carrying `code`.
    pub fn count(&self, code: IssueCode) -> usize {
        self.issues.iter().filter(|i| i.code() == code).count()
    }

    /// Returns true if any issue carries `code`.
    pub fn has(&self, code: IssueCode) -> bool {
        self.issues.iter().any(|i| i.code() == code)
    }

    /// Returns true if there are no errors.
    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }

    /// Returns true if there are no issues at all.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns true if validation passed in strict mode (no errors or warnings).
    pub fn is_ok_strict(&self) -> bool {
        self.issues.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return writeln!(f, "Validation passed: no issues found");
        }

        writeln!(
            f,
            "Validation completed with {} error(s) and {} warning(s):",
            self.error_count(),
            self.warning_count()
        )?;
        writeln!(f)?;

        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }

        Ok(())
    }
}

/// Identity of an object named by a diagnostic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ObjectRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ObjectKind>,
    pub label: String,
}

impl ObjectRef {
    pub fn of(obj: &TaxonomyObject) -> Self {
        Self {
            id: Some(obj.id()),
            kind: Some(obj.kind()),
            label: obj.label().to_string(),
        }
    }

    /// A reference to something that is not an arena object (a document).
    pub fn location(label: impl Into<String>) -> Self {
        Self {
            id: None,
            kind: None,
            label: label.into(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            Some(kind) => write!(f, "{} {}", kind, self.label),
            None => f.write_str(&self.label),
        }
    }
}

/// A single diagnostic (error or warning).
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationIssue {
    /// The severity of the issue.
    pub severity: Severity,

    /// What went wrong, with its typed payload.
    pub kind: IssueKind,

    /// The offending objects, most specific first.
    pub objects: Vec<ObjectRef>,
}

impl ValidationIssue {
    /// Creates an issue; severity follows from the kind's code.
    pub fn new(kind: IssueKind, objects: Vec<ObjectRef>) -> Self {
        Self {
            severity: kind.code().severity(),
            kind,
            objects,
        }
    }

    /// An issue about a single object.
    pub fn at(kind: IssueKind, obj: &TaxonomyObject) -> Self {
        Self::new(kind, vec![ObjectRef::of(obj)])
    }

    /// An issue about several objects.
    pub fn at_all<'a>(kind: IssueKind, objs: impl IntoIterator<Item = &'a TaxonomyObject>) -> Self {
        Self::new(kind, objs.into_iter().map(ObjectRef::of).collect())
    }

    pub fn code(&self) -> IssueCode {
        self.kind.code()
    }

    pub fn template(&self) -> &'static str {
        self.kind.code().template()
    }

    pub fn args(&self) -> Vec<(&'static str, String)> {
        self.kind.args()
    }

    /// The template with its arguments substituted.
    pub fn message(&self) -> String {
        let mut message = self.template().to_string();
        for (key, value) in self.args() {
            message = message.replace(&format!("{{{key}}}"), &value);
        }
        message
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN ",
        };
        write!(f, "[{}] {}", severity, self.code().as_str())?;
        if let Some(first) = self.objects.first() {
            write!(f, " in {}", first)?;
        }
        write!(f, ": {}", self.message())
    }
}

impl Serialize for ValidationIssue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let args: serde_json::Map<String, serde_json::Value> = self
            .args()
            .into_iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v)))
            .collect();
        let mut state = serializer.serialize_struct("ValidationIssue", 6)?;
        state.serialize_field("code", self.code().as_str())?;
        state.serialize_field("severity", &self.severity)?;
        state.serialize_field("message", &self.message())?;
        state.serialize_field("template", self.template())?;
        state.serialize_field("args", &args)?;
        state.serialize_field("objects", &self.objects)?;
        state.end()
    }
}

/// The severity of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Likely author error that does not invalidate the taxonomy.
    Warning,
    /// The taxonomy violates a structural or semantic rule.
    Error,
}

/// Every diagnostic the loader and validator can produce.
#[derive(Clone, Debug, PartialEq)]
pub enum IssueKind {
    // Build: values and identity
    UnboundPrefix {
        property: &'static str,
        value: String,
        prefix: String,
    },
    InvalidQName {
        property: &'static str,
        value: String,
    },
    InvalidValue {
        property: &'static str,
        value: String,
        expected: &'static str,
    },
    MissingRequiredProperty {
        property: &'static str,
    },
    /// Input fields that no descriptor declares, aggregated over one load.
    UndeclaredElements {
        elements: Vec<String>,
    },
    DuplicateObject {
        name: QName,
    },

    // Build: imports and selection
    UnresolvableImport {
        taxonomy: QName,
    },
    InvalidImportDocument {
        location: String,
        reason: String,
    },
    InvalidImportTaxonomy {
        taxonomy: QName,
    },
    UnknownImportObject {
        name: QName,
    },
    UnknownExportProfile {
        profile: QName,
    },
    UnknownObjectType {
        name: QName,
    },
    InvalidSelectionProperty {
        object_type: QName,
        property: String,
    },
    InvalidSelectionOperator {
        operator: String,
    },
    RelationshipToRoot {
        source: QName,
        target: QName,
    },

    // Referential integrity and enumerations
    UnresolvedReference {
        property: &'static str,
        name: QName,
    },
    WrongReferenceKind {
        property: &'static str,
        name: QName,
        expected: String,
        found: ObjectKind,
    },
    InvalidEnumeration {
        property: &'static str,
        value: String,
        allowed: &'static [&'static str],
    },

    // Uniqueness and exclusivity
    NameOrExtendTarget,
    DuplicateRelationship {
        source: QName,
        target: QName,
        order: Option<String>,
    },
    DuplicateLabel {
        target: QName,
        label_type: QName,
        language: String,
    },
    DuplicateExportProfile {
        name: QName,
    },
    DuplicateCubeDimension {
        dimension: QName,
    },

    // Domains and networks
    DomainRootNotSource {
        root: QName,
    },
    MultipleDomainRoots {
        roots: Vec<QName>,
    },
    DomainRootAsTarget {
        root: QName,
    },
    DomainCycle {
        node: QName,
    },
    RelationshipCycle {
        node: QName,
        policy: String,
    },
    InvalidRelationshipEndpoint {
        end: &'static str,
        name: QName,
        relationship_type: QName,
    },
    InvalidLinkProperty {
        property: String,
        relationship_type: QName,
    },
    MissingLinkProperty {
        property: String,
        relationship_type: QName,
    },

    // Cubes and cube types
    CubeTypeInheritance {
        cube_type: QName,
        base: QName,
    },
    CyclicInheritance {
        name: QName,
    },
    InvalidAllowedCubeDimension {
        reason: &'static str,
    },
    DimensionNotAllowed {
        dimension: QName,
        cube_type: QName,
    },
    RequiredDimensionMissing {
        dimension: String,
        cube_type: QName,
    },
    RequiredRelationshipMissing {
        relationship_type: QName,
        cube_type: QName,
    },
    MissingConceptDimension {
        cube: QName,
    },
    TypedDimensionDomain {
        dimension: QName,
        property: &'static str,
    },
    ExplicitDimensionTypedProperty {
        dimension: QName,
        property: &'static str,
    },
    PeriodConstraintNotAllowed {
        dimension: QName,
    },
    InvalidPeriodRepresentation {
        period_type: String,
        reason: &'static str,
    },
    InvalidPeriodFormat {
        value: String,
        reason: String,
    },
    InvalidDateResolution {
        reason: &'static str,
    },

    // Concepts, types and properties
    InvalidBalance {
        data_type: QName,
    },
    InvalidDataTypeFacets {
        reason: String,
    },
    InvalidPropertyValue {
        property: QName,
        value: String,
        data_type: QName,
    },
    PropertyNotAllowed {
        property: QName,
        owner: ObjectKind,
    },

    // Labels and references
    InvalidLanguage {
        language: String,
    },
    AnnotationTargetNotAllowed {
        target: QName,
        annotation_type: QName,
    },
    UnresolvedLabelTarget {
        name: QName,
    },
    UnresolvedReferenceTarget {
        name: QName,
    },
    ReferencePropertyNotAllowed {
        property: QName,
        reference_type: QName,
    },

    // Tables
    InvalidTableTemplate {
        reason: String,
    },

    // Facts
    InvalidFactPeriod {
        value: String,
    },
    FactPeriodTypeMismatch {
        concept: QName,
        expected: PeriodType,
        found: PeriodType,
    },
    MissingFactConcept {
        concept: Option<QName>,
    },
    FactNotInCube,
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl IssueKind {
    pub fn code(&self) -> IssueCode {
        use IssueCode as C;
        match self {
            IssueKind::UnboundPrefix { .. } => C::UnboundPrefix,
            IssueKind::InvalidQName { .. } => C::InvalidQName,
            IssueKind::InvalidValue { .. } => C::InvalidValue,
            IssueKind::MissingRequiredProperty { .. } => C::MissingRequiredProperty,
            IssueKind::UndeclaredElements { .. } => C::UndeclaredElement,
            IssueKind::DuplicateObject { .. } => C::DuplicateObject,
            IssueKind::UnresolvableImport { .. } => C::UnresolvableImport,
            IssueKind::InvalidImportDocument { .. } => C::InvalidImportDocument,
            IssueKind::InvalidImportTaxonomy { .. } => C::InvalidImportTaxonomy,
            IssueKind::UnknownImportObject { .. } => C::InvalidImportObject,
            IssueKind::UnknownExportProfile { .. } => C::UnknownExportProfile,
            IssueKind::UnknownObjectType { .. } => C::InvalidObjectType,
            IssueKind::InvalidSelectionProperty { .. } => C::InvalidSelectionProperty,
            IssueKind::InvalidSelectionOperator { .. } => C::InvalidSelectionOperator,
            IssueKind::RelationshipToRoot { .. } => C::RelationshipToRoot,
            IssueKind::UnresolvedReference { .. } => C::UnresolvedReference,
            IssueKind::WrongReferenceKind { .. } => C::InvalidReferenceKind,
            IssueKind::InvalidEnumeration { .. } => C::InvalidEnumerationValue,
            IssueKind::NameOrExtendTarget => C::InvalidNameOrExtendTarget,
            IssueKind::DuplicateRelationship { .. } => C::DuplicateRelationship,
            IssueKind::DuplicateLabel { .. } => C::DuplicateLabel,
            IssueKind::DuplicateExportProfile { .. } => C::DuplicateExportProfile,
            IssueKind::DuplicateCubeDimension { .. } => C::DuplicateCubeDimension,
            IssueKind::DomainRootNotSource { .. } => C::DomainRootNotSource,
            IssueKind::MultipleDomainRoots { .. } => C::MultipleDomainRoots,
            IssueKind::DomainRootAsTarget { .. } => C::DomainRootAsTarget,
            IssueKind::DomainCycle { .. } => C::DomainCycle,
            IssueKind::RelationshipCycle { .. } => C::RelationshipCycle,
            IssueKind::InvalidRelationshipEndpoint { .. } => C::InvalidRelationshipEndpoint,
            IssueKind::InvalidLinkProperty { .. } => C::InvalidLinkProperty,
            IssueKind::MissingLinkProperty { .. } => C::MissingLinkProperty,
            IssueKind::CubeTypeInheritance { .. } => C::InvalidCubeTypeInheritance,
            IssueKind::CyclicInheritance { .. } => C::CyclicInheritance,
            IssueKind::InvalidAllowedCubeDimension { .. } => C::InvalidAllowedCubeDimension,
            IssueKind::DimensionNotAllowed { .. } => C::DimensionNotAllowed,
            IssueKind::RequiredDimensionMissing { .. } => C::RequiredCubeDimensionMissing,
            IssueKind::RequiredRelationshipMissing { .. } => C::RequiredCubeRelationshipMissing,
            IssueKind::MissingConceptDimension { .. } => C::MissingConceptDimension,
            IssueKind::TypedDimensionDomain { .. } => C::TypedDimensionDomain,
            IssueKind::ExplicitDimensionTypedProperty { .. } => C::ExplicitDimensionTypedProperty,
            IssueKind::PeriodConstraintNotAllowed { .. } => C::InvalidPeriodConstraint,
            IssueKind::InvalidPeriodRepresentation { .. } => C::InvalidPeriodRepresentation,
            IssueKind::InvalidPeriodFormat { .. } => C::InvalidPeriodFormat,
            IssueKind::InvalidDateResolution { .. } => C::InvalidDateResolution,
            IssueKind::InvalidBalance { .. } => C::InvalidBalance,
            IssueKind::InvalidDataTypeFacets { .. } => C::InvalidDataTypeFacets,
            IssueKind::InvalidPropertyValue { .. } => C::InvalidPropertyValue,
            IssueKind::PropertyNotAllowed { .. } => C::PropertyNotAllowed,
            IssueKind::InvalidLanguage { .. } => C::InvalidLanguage,
            IssueKind::AnnotationTargetNotAllowed { .. } => C::InvalidAnnotationTarget,
            IssueKind::UnresolvedLabelTarget { .. } => C::UnresolvedLabelTarget,
            IssueKind::UnresolvedReferenceTarget { .. } => C::UnresolvedReferenceTarget,
            IssueKind::ReferencePropertyNotAllowed { .. } => C::InvalidReferenceProperty,
            IssueKind::InvalidTableTemplate { .. } => C::InvalidTableTemplate,
            IssueKind::InvalidFactPeriod { .. } => C::InvalidFactPeriod,
            IssueKind::FactPeriodTypeMismatch { .. } => C::FactPeriodTypeMismatch,
            IssueKind::MissingFactConcept { .. } => C::MissingFactConcept,
            IssueKind::FactNotInCube => C::FactNotInAnyCube,
        }
    }

    /// Substitution arguments for the code's message template, in a fixed
    /// order so rendered messages are deterministic.
    pub fn args(&self) -> Vec<(&'static str, String)> {
        match self {
            IssueKind::UnboundPrefix {
                property,
                value,
                prefix,
            } => vec![
                ("property", property.to_string()),
                ("value", value.clone()),
                ("prefix", prefix.clone()),
            ],
            IssueKind::InvalidQName { property, value } => {
                vec![("property", property.to_string()), ("value", value.clone())]
            }
            IssueKind::InvalidValue {
                property,
                value,
                expected,
            } => vec![
                ("property", property.to_string()),
                ("value", value.clone()),
                ("expected", expected.to_string()),
            ],
            IssueKind::MissingRequiredProperty { property } => {
                vec![("property", property.to_string())]
            }
            IssueKind::UndeclaredElements { elements } => vec![
                ("count", elements.len().to_string()),
                ("elements", elements.join(", ")),
            ],
            IssueKind::DuplicateObject { name } => vec![("name", name.to_string())],
            IssueKind::UnresolvableImport { taxonomy } => vec![("taxonomy", taxonomy.to_string())],
            IssueKind::InvalidImportDocument { location, reason } => {
                vec![("location", location.clone()), ("reason", reason.clone())]
            }
            IssueKind::InvalidImportTaxonomy { taxonomy } => {
                vec![("taxonomy", taxonomy.to_string())]
            }
            IssueKind::UnknownImportObject { name } => vec![("name", name.to_string())],
            IssueKind::UnknownExportProfile { profile } => vec![("profile", profile.to_string())],
            IssueKind::UnknownObjectType { name } => vec![("name", name.to_string())],
            IssueKind::InvalidSelectionProperty {
                object_type,
                property,
            } => vec![
                ("objectType", object_type.to_string()),
                ("property", property.clone()),
            ],
            IssueKind::InvalidSelectionOperator { operator } => {
                vec![("operator", operator.clone())]
            }
            IssueKind::RelationshipToRoot { source, target } => vec![
                ("source", source.to_string()),
                ("target", target.to_string()),
            ],
            IssueKind::UnresolvedReference { property, name } => vec![
                ("property", property.to_string()),
                ("name", name.to_string()),
            ],
            IssueKind::WrongReferenceKind {
                property,
                name,
                expected,
                found,
            } => vec![
                ("property", property.to_string()),
                ("name", name.to_string()),
                ("expected", expected.clone()),
                ("found", found.to_string()),
            ],
            IssueKind::InvalidEnumeration {
                property,
                value,
                allowed,
            } => vec![
                ("property", property.to_string()),
                ("value", value.clone()),
                ("allowed", allowed.join(", ")),
            ],
            IssueKind::NameOrExtendTarget => Vec::new(),
            IssueKind::DuplicateRelationship {
                source,
                target,
                order,
            } => vec![
                ("source", source.to_string()),
                ("target", target.to_string()),
                ("order", order.clone().unwrap_or_else(|| "none".to_string())),
            ],
            IssueKind::DuplicateLabel {
                target,
                label_type,
                language,
            } => vec![
                ("target", target.to_string()),
                ("labelType", label_type.to_string()),
                ("language", language.clone()),
            ],
            IssueKind::DuplicateExportProfile { name } => vec![("name", name.to_string())],
            IssueKind::DuplicateCubeDimension { dimension } => {
                vec![("dimension", dimension.to_string())]
            }
            IssueKind::DomainRootNotSource { root } => vec![("root", root.to_string())],
            IssueKind::MultipleDomainRoots { roots } => vec![("roots", join(roots))],
            IssueKind::DomainRootAsTarget { root } => vec![("root", root.to_string())],
            IssueKind::DomainCycle { node } => vec![("node", node.to_string())],
            IssueKind::RelationshipCycle { node, policy } => {
                vec![("node", node.to_string()), ("policy", policy.clone())]
            }
            IssueKind::InvalidRelationshipEndpoint {
                end,
                name,
                relationship_type,
            } => vec![
                ("end", end.to_string()),
                ("name", name.to_string()),
                ("relationshipType", relationship_type.to_string()),
            ],
            IssueKind::InvalidLinkProperty {
                property,
                relationship_type,
            }
            | IssueKind::MissingLinkProperty {
                property,
                relationship_type,
            } => vec![
                ("property", property.clone()),
                ("relationshipType", relationship_type.to_string()),
            ],
            IssueKind::CubeTypeInheritance { cube_type, base } => vec![
                ("cubeType", cube_type.to_string()),
                ("base", base.to_string()),
            ],
            IssueKind::CyclicInheritance { name } => vec![("name", name.to_string())],
            IssueKind::InvalidAllowedCubeDimension { reason }
            | IssueKind::InvalidDateResolution { reason } => {
                vec![("reason", reason.to_string())]
            }
            IssueKind::DimensionNotAllowed {
                dimension,
                cube_type,
            } => vec![
                ("dimension", dimension.to_string()),
                ("cubeType", cube_type.to_string()),
            ],
            IssueKind::RequiredDimensionMissing {
                dimension,
                cube_type,
            } => vec![
                ("dimension", dimension.clone()),
                ("cubeType", cube_type.to_string()),
            ],
            IssueKind::RequiredRelationshipMissing {
                relationship_type,
                cube_type,
            } => vec![
                ("relationshipType", relationship_type.to_string()),
                ("cubeType", cube_type.to_string()),
            ],
            IssueKind::MissingConceptDimension { cube } => vec![("cube", cube.to_string())],
            IssueKind::PeriodConstraintNotAllowed { dimension } => {
                vec![("dimension", dimension.to_string())]
            }
            IssueKind::TypedDimensionDomain {
                dimension,
                property,
            }
            | IssueKind::ExplicitDimensionTypedProperty {
                dimension,
                property,
            } => vec![
                ("dimension", dimension.to_string()),
                ("property", property.to_string()),
            ],
            IssueKind::InvalidPeriodRepresentation {
                period_type,
                reason,
            } => vec![
                ("periodType", period_type.clone()),
                ("reason", reason.to_string()),
            ],
            IssueKind::InvalidPeriodFormat { value, reason } => {
                vec![("value", value.clone()), ("reason", reason.clone())]
            }
            IssueKind::InvalidBalance { data_type } => vec![("dataType", data_type.to_string())],
            IssueKind::InvalidDataTypeFacets { reason }
            | IssueKind::InvalidTableTemplate { reason } => vec![("reason", reason.clone())],
            IssueKind::InvalidPropertyValue {
                property,
                value,
                data_type,
            } => vec![
                ("property", property.to_string()),
                ("value", value.clone()),
                ("dataType", data_type.to_string()),
            ],
            IssueKind::PropertyNotAllowed { property, owner } => vec![
                ("property", property.to_string()),
                ("owner", owner.to_string()),
            ],
            IssueKind::InvalidLanguage { language } => vec![("language", language.clone())],
            IssueKind::AnnotationTargetNotAllowed {
                target,
                annotation_type,
            } => vec![
                ("target", target.to_string()),
                ("type", annotation_type.to_string()),
            ],
            IssueKind::UnresolvedLabelTarget { name }
            | IssueKind::UnresolvedReferenceTarget { name } => vec![("name", name.to_string())],
            IssueKind::ReferencePropertyNotAllowed {
                property,
                reference_type,
            } => vec![
                ("property", property.to_string()),
                ("referenceType", reference_type.to_string()),
            ],
            IssueKind::InvalidFactPeriod { value } => vec![("value", value.clone())],
            IssueKind::FactPeriodTypeMismatch {
                concept,
                expected,
                found,
            } => vec![
                ("concept", concept.to_string()),
                ("expected", expected.to_string()),
                ("found", found.to_string()),
            ],
            IssueKind::MissingFactConcept { concept } => vec![(
                "concept",
                concept
                    .as_ref()
                    .map(|q| q.to_string())
                    .unwrap_or_else(|| "none".to_string()),
            )],
            IssueKind::FactNotInCube => Vec::new(),
        }
    }
}

/// A stable code identifying the type of diagnostic.
///
/// These codes can be used for filtering, ignoring specific issues,
/// or programmatic handling of validation results.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IssueCode {
    // Build issues
    /// A QName uses a prefix the document does not bind.
    UnboundPrefix,
    /// A QName value is syntactically malformed.
    InvalidQName,
    /// A scalar value has the wrong type or lexical form.
    InvalidValue,
    /// A required property is absent.
    MissingRequiredProperty,
    /// Input contained fields no object kind declares.
    UndeclaredElement,
    /// Two objects share a registry key.
    DuplicateObject,
    UnresolvableImport,
    InvalidImportDocument,
    /// `profiles` was combined with explicit import criteria.
    InvalidImportTaxonomy,
    InvalidImportObject,
    UnknownExportProfile,
    InvalidObjectType,
    InvalidSelectionProperty,
    InvalidSelectionOperator,
    /// An edge targeted the owning domain or network's root.
    RelationshipToRoot,

    // Validation issues
    UnresolvedReference,
    InvalidReferenceKind,
    InvalidEnumerationValue,
    InvalidNameOrExtendTarget,
    DuplicateRelationship,
    DuplicateLabel,
    DuplicateExportProfile,
    DuplicateCubeDimension,
    DomainRootNotSource,
    MultipleDomainRoots,
    DomainRootAsTarget,
    DomainCycle,
    RelationshipCycle,
    InvalidRelationshipEndpoint,
    InvalidLinkProperty,
    MissingLinkProperty,
    InvalidCubeTypeInheritance,
    CyclicInheritance,
    InvalidAllowedCubeDimension,
    DimensionNotAllowed,
    RequiredCubeDimensionMissing,
    RequiredCubeRelationshipMissing,
    MissingConceptDimension,
    TypedDimensionDomain,
    ExplicitDimensionTypedProperty,
    InvalidPeriodConstraint,
    InvalidPeriodRepresentation,
    InvalidPeriodFormat,
    InvalidDateResolution,
    InvalidBalance,
    InvalidDataTypeFacets,
    InvalidPropertyValue,
    PropertyNotAllowed,
    InvalidLanguage,
    InvalidAnnotationTarget,
    /// A label's related name resolves to nothing.
    UnresolvedLabelTarget,
    /// A reference's related name resolves to nothing (warning only).
    UnresolvedReferenceTarget,
    InvalidReferenceProperty,
    InvalidTableTemplate,
    InvalidFactPeriod,
    FactPeriodTypeMismatch,
    MissingFactConcept,
    /// No cube accepts the fact.
    FactNotInAnyCube,
}

impl IssueCode {
    /// The stable identifier, e.g. `oimte:duplicateObject`.
    pub fn as_str(&self) -> &'static str {
        use IssueCode as C;
        match self {
            C::UnboundPrefix => "oimte:unboundPrefix",
            C::InvalidQName => "oimte:invalidQName",
            C::InvalidValue => "oimte:invalidValue",
            C::MissingRequiredProperty => "oimte:missingRequiredProperty",
            C::UndeclaredElement => "oimte:undeclaredElement",
            C::DuplicateObject => "oimte:duplicateObject",
            C::UnresolvableImport => "oimte:unresolvableImport",
            C::InvalidImportDocument => "oimte:invalidImportDocument",
            C::InvalidImportTaxonomy => "oimte:invalidImportTaxonomy",
            C::InvalidImportObject => "oimte:invalidImportObject",
            C::UnknownExportProfile => "oimte:unknownExportProfile",
            C::InvalidObjectType => "oimte:invalidObjectType",
            C::InvalidSelectionProperty => "oimte:invalidSelectionProperty",
            C::InvalidSelectionOperator => "oimte:invalidSelectionOperator",
            C::RelationshipToRoot => "oimte:relationshipToRoot",
            C::UnresolvedReference => "oimte:unresolvedReference",
            C::InvalidReferenceKind => "oimte:invalidReferenceKind",
            C::InvalidEnumerationValue => "oimte:invalidEnumerationValue",
            C::InvalidNameOrExtendTarget => "oimte:invalidNameOrExtendTarget",
            C::DuplicateRelationship => "oimte:duplicateRelationship",
            C::DuplicateLabel => "oimtw:duplicateLabel",
            C::DuplicateExportProfile => "oimte:duplicateExportProfile",
            C::DuplicateCubeDimension => "oimte:duplicateCubeDimension",
            C::DomainRootNotSource => "oimte:domainRootNotSource",
            C::MultipleDomainRoots => "oimte:multipleDomainRoots",
            C::DomainRootAsTarget => "oimte:domainRootAsTarget",
            C::DomainCycle => "oimte:domainCycle",
            C::RelationshipCycle => "oimte:relationshipCycle",
            C::InvalidRelationshipEndpoint => "oimte:invalidRelationshipEndpoint",
            C::InvalidLinkProperty => "oimte:invalidLinkProperty",
            C::MissingLinkProperty => "oimte:missingLinkProperty",
            C::InvalidCubeTypeInheritance => "oimte:invalidCubeTypeInheritance",
            C::CyclicInheritance => "oimte:cyclicInheritance",
            C::InvalidAllowedCubeDimension => "oimte:invalidAllowedCubeDimension",
            C::DimensionNotAllowed => "oimte:dimensionNotAllowed",
            C::RequiredCubeDimensionMissing => "oimte:requiredCubeDimensionMissing",
            C::RequiredCubeRelationshipMissing => "oimte:requiredCubeRelationshipMissing",
            C::MissingConceptDimension => "oimte:missingConceptDimension",
            C::TypedDimensionDomain => "oimte:typedDimensionDomain",
            C::ExplicitDimensionTypedProperty => "oimte:explicitDimensionTypedProperty",
            C::InvalidPeriodConstraint => "oimte:invalidPeriodConstraint",
            C::InvalidPeriodRepresentation => "oimte:invalidPeriodRepresentation",
            C::InvalidPeriodFormat => "oimte:invalidPeriodFormat",
            C::InvalidDateResolution => "oimte:invalidDateResolution",
            C::InvalidBalance => "oimte:invalidBalance",
            C::InvalidDataTypeFacets => "oimte:invalidDataTypeFacets",
            C::InvalidPropertyValue => "oimte:invalidPropertyValue",
            C::PropertyNotAllowed => "oimte:propertyNotAllowed",
            C::InvalidLanguage => "oimte:invalidLanguage",
            C::InvalidAnnotationTarget => "oimte:invalidAnnotationTarget",
            C::UnresolvedLabelTarget => "oimte:unresolvedRelatedName",
            C::UnresolvedReferenceTarget => "oimtw:unresolvedRelatedName",
            C::InvalidReferenceProperty => "oimte:invalidReferenceProperty",
            C::InvalidTableTemplate => "oimte:invalidTableTemplate",
            C::InvalidFactPeriod => "oimte:invalidFactPeriod",
            C::FactPeriodTypeMismatch => "oimte:factPeriodTypeMismatch",
            C::MissingFactConcept => "oimte:missingFactConcept",
            C::FactNotInAnyCube => "oimtw:factNotInAnyCube",
        }
    }

    pub fn severity(&self) -> Severity {
        if self.as_str().starts_with("oimtw:") {
            Severity::Warning
        } else {
            Severity::Error
        }
    }

    /// Message template; `{name}` placeholders are filled from the issue's args.
    pub fn template(&self) -> &'static str {
        use IssueCode as C;
        match self {
            C::UnboundPrefix => "{property} value '{value}' uses unbound prefix '{prefix}'",
            C::InvalidQName => "{property} value '{value}' is not a valid QName",
            C::InvalidValue => "{property} value '{value}' is not a valid {expected}",
            C::MissingRequiredProperty => "required property {property} is missing",
            C::UndeclaredElement => "{count} undeclared element(s) ignored: {elements}",
            C::DuplicateObject => "{name} is already defined",
            C::UnresolvableImport => "no location is known for imported taxonomy {taxonomy}",
            C::InvalidImportDocument => "imported document {location} could not be loaded: {reason}",
            C::InvalidImportTaxonomy => {
                "import of {taxonomy} combines profiles with importObjects, importObjectTypes or selections"
            }
            C::InvalidImportObject => "imported object {name} is not defined by the imported taxonomy",
            C::UnknownExportProfile => "export profile {profile} is not defined by the imported taxonomy",
            C::InvalidObjectType => "{name} is not an object type",
            C::InvalidSelectionProperty => "{property} is not a property of {objectType}",
            C::InvalidSelectionOperator => "'{operator}' is not a selection operator",
            C::RelationshipToRoot => "relationship {source} -> {target} targets the root and was dropped",
            C::UnresolvedReference => "{property} {name} does not resolve to an object",
            C::InvalidReferenceKind => "{property} {name} is a {found}, expected {expected}",
            C::InvalidEnumerationValue => "{property} value '{value}' is not one of: {allowed}",
            C::InvalidNameOrExtendTarget => "exactly one of name and extendTargetName must be present",
            C::DuplicateRelationship => "relationship {source} -> {target} (order {order}) is duplicated",
            C::DuplicateLabel => "{target} has more than one {labelType} label for language {language}",
            C::DuplicateExportProfile => "export profile {name} is defined more than once",
            C::DuplicateCubeDimension => "dimension {dimension} appears more than once in the cube",
            C::DomainRootNotSource => "domain root {root} is not the source of any relationship",
            C::MultipleDomainRoots => "domain has more than one root: {roots}",
            C::DomainRootAsTarget => "domain root {root} is the target of a relationship",
            C::DomainCycle => "domain relationships form a cycle through {node}",
            C::RelationshipCycle => "relationships form a cycle through {node} but cycles are '{policy}'",
            C::InvalidRelationshipEndpoint => {
                "{end} {name} is not an allowed object type for {relationshipType}"
            }
            C::InvalidLinkProperty => "link property {property} is not allowed for {relationshipType}",
            C::MissingLinkProperty => "link property {property} is required for {relationshipType}",
            C::InvalidCubeTypeInheritance => {
                "{cubeType} re-declares allowedCubeDimensions already fixed by base type {base}"
            }
            C::CyclicInheritance => "{name} inherits from itself",
            C::InvalidAllowedCubeDimension => "allowed cube dimension is invalid: {reason}",
            C::DimensionNotAllowed => "dimension {dimension} is not permitted by cube type {cubeType}",
            C::RequiredCubeDimensionMissing => "cube type {cubeType} requires dimension {dimension}",
            C::RequiredCubeRelationshipMissing => {
                "cube type {cubeType} requires a network with {relationshipType} relationships"
            }
            C::MissingConceptDimension => "cube {cube} has no concept dimension",
            C::TypedDimensionDomain => "typed dimension {dimension} must not declare {property}",
            C::ExplicitDimensionTypedProperty => {
                "explicit dimension {dimension} must not declare {property}"
            }
            C::InvalidPeriodConstraint => {
                "period constraints are only allowed on the period dimension, not {dimension}"
            }
            C::InvalidPeriodRepresentation => "{periodType} period constraint is invalid: {reason}",
            C::InvalidPeriodFormat => "period format '{value}' is invalid: {reason}",
            C::InvalidDateResolution => "date resolution is invalid: {reason}",
            C::InvalidBalance => "balance requires a monetary data type, found {dataType}",
            C::InvalidDataTypeFacets => "data type facets are inconsistent: {reason}",
            C::InvalidPropertyValue => "property {property} value '{value}' is not a valid {dataType}",
            C::PropertyNotAllowed => "property {property} is not allowed on a {owner}",
            C::InvalidLanguage => "'{language}' is not a valid language tag",
            C::InvalidAnnotationTarget => "{type} cannot be attached to {target}",
            C::UnresolvedLabelTarget => "label target {name} does not resolve to an object",
            C::UnresolvedReferenceTarget => "reference target {name} does not resolve to an object",
            C::InvalidReferenceProperty => {
                "property {property} is not listed by reference type {referenceType}"
            }
            C::InvalidTableTemplate => "table template is invalid: {reason}",
            C::InvalidFactPeriod => "fact period '{value}' is not a valid period",
            C::FactPeriodTypeMismatch => {
                "concept {concept} requires a {expected} period but the fact has a {found} period"
            }
            C::MissingFactConcept => "fact concept {concept} is missing or not a concept",
            C::FactNotInAnyCube => "no cube accepts the fact",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_follows_code_prefix() {
        assert_eq!(IssueCode::DuplicateLabel.severity(), Severity::Warning);
        assert_eq!(IssueCode::UnresolvedReferenceTarget.severity(), Severity::Warning);
        assert_eq!(IssueCode::DuplicateObject.severity(), Severity::Error);
    }

    #[test]
    fn test_message_substitutes_args() {
        let issue = ValidationIssue::new(
            IssueKind::DuplicateObject {
                name: QName::new("urn:ex", "A").with_prefix("ex"),
            },
            vec![ObjectRef::location("doc.json")],
        );
        assert_eq!(issue.message(), "ex:A is already defined");
        assert_eq!(issue.severity, Severity::Error);
        assert_eq!(
            issue.to_string(),
            "[ERROR] oimte:duplicateObject in doc.json: ex:A is already defined"
        );
    }

    #[test]
    fn test_report_counts() {
        let mut report = ValidationReport::new();
        assert!(report.is_clean());
        report.add(ValidationIssue::new(IssueKind::FactNotInCube, Vec::new()));
        assert!(report.is_ok());
        assert!(!report.is_ok_strict());
        report.add(ValidationIssue::new(
            IssueKind::MissingRequiredProperty { property: "name" },
            Vec::new(),
        ));
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 1);
        assert_eq!(report.count(IssueCode::FactNotInAnyCube), 1);
    }

    #[test]
    fn test_issue_serializes_stable_code() {
        let issue = ValidationIssue::new(
            IssueKind::InvalidSelectionOperator {
                operator: "~".into(),
            },
            Vec::new(),
        );
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["code"], "oimte:invalidSelectionOperator");
        assert_eq!(json["severity"], "error");
        assert_eq!(json["args"]["operator"], "~");
    }
}
