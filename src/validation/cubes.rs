//! Cubes, cube types and period constraints.

use std::collections::HashSet;

use super::{extension_base, Checker, IssueKind};
use crate::cube::{
    allowed_entry_matches, is_date_literal, resolve_cube_dimension, CoreDimension, CubeTypeProfile,
    DimensionKind,
};
use crate::model::{ObjectKind, PeriodFormat, PeriodType, QName, TaxonomyObject};
use crate::relationships::{edge_source, edge_target, RelationshipSet};

const SORT_ORDERS: &[&str] = &["asc", "desc"];
const DIMENSION_TYPES: &[&str] = &["typed", "explicit"];
const DATE_RESOLUTIONS: &[&str] = &["monthDay", "endDate", "startDate", "onOrAfter", "onOrBefore"];

pub(super) fn validate(checker: &mut Checker<'_>) {
    for cube_type in checker.objects(ObjectKind::CubeType) {
        validate_cube_type(checker, cube_type);
    }
    for entry in checker.objects(ObjectKind::AllowedCubeDimension) {
        validate_allowed_dimension(checker, entry);
    }
    for pattern in checker.objects(ObjectKind::RequiredCubeRelationship) {
        checker.reference(pattern, "relationshipTypeName", &[ObjectKind::RelationshipType]);
        checker.reference(pattern, "source", &[]);
        checker.reference(pattern, "target", &[]);
    }
    for cube in checker.objects(ObjectKind::Cube) {
        validate_cube(checker, cube);
    }
    for constraint in checker.objects(ObjectKind::PeriodConstraint) {
        validate_period_constraint(checker, constraint);
    }
    for resolution in checker.objects(ObjectKind::DateResolution) {
        validate_date_resolution(checker, resolution);
    }
}

fn validate_cube<'m>(checker: &mut Checker<'m>, cube: &'m TaxonomyObject) {
    let cube_type = checker.reference(cube, "cubeType", &[ObjectKind::CubeType]);
    checker.references(cube, "cubeNetworks", &[ObjectKind::Network]);
    checker.references(cube, "excludeCubes", &[ObjectKind::Cube]);

    let profile = cube_type
        .and_then(TaxonomyObject::name)
        .and_then(|name| CubeTypeProfile::resolve(checker.model, name));

    let mut seen = HashSet::new();
    let mut has_concept = false;
    let mut resolved_dimensions = Vec::new();
    for id in cube.children("cubeDimensions") {
        let cube_dimension = checker.object(*id);
        let Some(name) = cube_dimension.qname("dimensionName") else {
            continue;
        };
        if !seen.insert(name.without_anchor()) {
            checker.issue(
                IssueKind::DuplicateCubeDimension {
                    dimension: name.clone(),
                },
                cube_dimension,
            );
        }
        let dimension = checker.reference(cube_dimension, "dimensionName", &[ObjectKind::Dimension]);
        checker.reference(cube_dimension, "domainName", &[ObjectKind::Domain]);
        checker.reference(cube_dimension, "domainDataType", &[ObjectKind::DataType]);
        checker.enumeration(cube_dimension, "typedSort", SORT_ORDERS);
        checker.enumeration(cube_dimension, "domainSort", SORT_ORDERS);

        let resolved = resolve_cube_dimension(checker.model, cube_dimension);
        match resolved.kind {
            DimensionKind::Core(CoreDimension::Concept) => has_concept = true,
            DimensionKind::Typed => {
                for property in ["domainName", "domainSort"] {
                    if cube_dimension.has(property) {
                        checker.issue(
                            IssueKind::TypedDimensionDomain {
                                dimension: name.clone(),
                                property,
                            },
                            cube_dimension,
                        );
                    }
                }
            }
            DimensionKind::Explicit if cube_dimension.has("typedSort") => {
                checker.issue(
                    IssueKind::ExplicitDimensionTypedProperty {
                        dimension: name.clone(),
                        property: "typedSort",
                    },
                    cube_dimension,
                );
            }
            _ => {}
        }
        if resolved.kind != DimensionKind::Core(CoreDimension::Period)
            && !cube_dimension.children("periodConstraints").is_empty()
        {
            checker.issue(
                IssueKind::PeriodConstraintNotAllowed {
                    dimension: name.clone(),
                },
                cube_dimension,
            );
        }

        if dimension.is_none() {
            continue;
        }
        if let Some(profile) = &profile {
            if !profile.allows_kind(resolved.kind) || !profile.admits(checker.model, resolved) {
                checker.issue(
                    IssueKind::DimensionNotAllowed {
                        dimension: name.clone(),
                        cube_type: profile.name.clone(),
                    },
                    cube_dimension,
                );
            }
        }
        resolved_dimensions.push(resolved);
    }

    if !has_concept {
        if let Some(name) = cube.name() {
            checker.issue(IssueKind::MissingConceptDimension { cube: name.clone() }, cube);
        }
    }

    let Some(profile) = profile else { return };
    for entry in profile.allowed_dimensions.iter().flatten() {
        let entry = checker.object(*entry);
        if entry.boolean("required") != Some(true) {
            continue;
        }
        let present = resolved_dimensions
            .iter()
            .any(|dimension| allowed_entry_matches(checker.model, entry, dimension));
        if !present {
            checker.issue(
                IssueKind::RequiredDimensionMissing {
                    dimension: describe_allowed_entry(entry),
                    cube_type: profile.name.clone(),
                },
                cube,
            );
        }
    }
    for pattern in &profile.required_relationships {
        let pattern = checker.object(*pattern);
        let Some(relationship_type) = pattern.qname("relationshipTypeName") else {
            continue;
        };
        if !networks_satisfy(checker, cube, pattern, relationship_type) {
            checker.issue(
                IssueKind::RequiredRelationshipMissing {
                    relationship_type: relationship_type.clone(),
                    cube_type: profile.name.clone(),
                },
                cube,
            );
        }
    }
}

fn describe_allowed_entry(entry: &TaxonomyObject) -> String {
    if let Some(name) = entry.qname("dimensionName") {
        return name.to_string();
    }
    match (entry.str("dimensionType"), entry.qname("dimensionDataType")) {
        (Some(kind), Some(data_type)) => format!("{kind} dimension of type {data_type}"),
        (Some(kind), None) => format!("{kind} dimension"),
        (None, Some(data_type)) => format!("dimension of type {data_type}"),
        (None, None) => "dimension".to_string(),
    }
}

/// Whether a network attached to `cube` holds relationships of the
/// required type (and endpoints, when the pattern names them).
fn networks_satisfy(
    checker: &Checker<'_>,
    cube: &TaxonomyObject,
    pattern: &TaxonomyObject,
    relationship_type: &QName,
) -> bool {
    let model = checker.model;
    cube.qnames("cubeNetworks")
        .iter()
        .filter_map(|name| model.lookup_kind(name, ObjectKind::Network))
        .filter(|network| {
            extension_base(model, network).qname("relationshipTypeName") == Some(relationship_type)
        })
        .any(|network| {
            let set = RelationshipSet::new(model, network);
            let source = pattern.qname("source");
            let target = pattern.qname("target");
            if source.is_none() && target.is_none() {
                return !set.is_empty();
            }
            let found = set.relationships().any(|rel| {
                source.map_or(true, |s| edge_source(rel) == Some(s))
                    && target.map_or(true, |t| edge_target(rel) == Some(t))
            });
            found
        })
}

fn validate_cube_type<'m>(checker: &mut Checker<'m>, cube_type: &'m TaxonomyObject) {
    let base = checker.reference(cube_type, "baseCubeType", &[ObjectKind::CubeType]);
    let Some(name) = cube_type.name() else { return };
    if checker.inherits_from_itself(cube_type, "baseCubeType") {
        checker.issue(IssueKind::CyclicInheritance { name: name.clone() }, cube_type);
        return;
    }

    let Some(base_name) = base.and_then(TaxonomyObject::name) else {
        return;
    };
    let Some(inherited) = CubeTypeProfile::resolve(checker.model, base_name) else {
        return;
    };
    let redeclares_dimensions =
        cube_type.has("allowedCubeDimensions") && inherited.allowed_dimensions.is_some();
    let reenables = [
        ("periodDimension", inherited.period),
        ("entityDimension", inherited.entity),
        ("unitDimension", inherited.unit),
        ("taxonomyDefinedDimension", inherited.taxonomy_defined),
    ]
    .into_iter()
    .any(|(flag, base_allows)| !base_allows && cube_type.boolean(flag) == Some(true));
    if redeclares_dimensions || reenables {
        checker.issue(
            IssueKind::CubeTypeInheritance {
                cube_type: name.clone(),
                base: base_name.clone(),
            },
            cube_type,
        );
    }
}

fn validate_allowed_dimension<'m>(checker: &mut Checker<'m>, entry: &'m TaxonomyObject) {
    let by_name = entry.has("dimensionName");
    let by_type = entry.has("dimensionType") || entry.has("dimensionDataType");
    let reason = if by_name && by_type {
        Some("dimensionName cannot be combined with dimensionType or dimensionDataType")
    } else if !by_name && !by_type {
        Some("one of dimensionName, dimensionType or dimensionDataType is required")
    } else if entry.str("dimensionType") == Some("explicit") && entry.has("dimensionDataType") {
        Some("an explicit dimension has no data type")
    } else {
        None
    };
    if let Some(reason) = reason {
        checker.issue(IssueKind::InvalidAllowedCubeDimension { reason }, entry);
    }
    checker.enumeration(entry, "dimensionType", DIMENSION_TYPES);
    checker.reference(entry, "dimensionName", &[ObjectKind::Dimension]);
    checker.reference(entry, "dimensionDataType", &[ObjectKind::DataType]);
}

fn validate_period_constraint<'m>(checker: &mut Checker<'m>, constraint: &'m TaxonomyObject) {
    let period_type = checker
        .enumeration(constraint, "periodType", PeriodType::VALUES)
        .and_then(PeriodType::parse);

    if let Some(period_type) = period_type {
        if let Some(reason) = representation_problem(constraint, period_type) {
            checker.issue(
                IssueKind::InvalidPeriodRepresentation {
                    period_type: period_type.to_string(),
                    reason,
                },
                constraint,
            );
        }
    }

    let Some(text) = constraint.str("periodFormat") else {
        return;
    };
    let reason = match PeriodFormat::parse(text) {
        Err(err) => Some(err.to_string()),
        Ok(format) if format.anchor().is_some() && period_type != Some(PeriodType::Instant) => {
            Some("@start and @end only apply to instant periods".to_string())
        }
        Ok(_) => None,
    };
    if let Some(reason) = reason {
        checker.issue(
            IssueKind::InvalidPeriodFormat {
                value: text.to_string(),
                reason,
            },
            constraint,
        );
    }
}

/// The first exclusivity rule `constraint` breaks, if any.
fn representation_problem(constraint: &TaxonomyObject, period_type: PeriodType) -> Option<&'static str> {
    let has = |property: &str| constraint.has(property);
    let has_resolution = DATE_RESOLUTIONS.iter().any(|p| has(*p));

    match period_type {
        PeriodType::None if has("timeSpan") || has("periodFormat") || has_resolution => {
            Some("a period type of none takes no further constraints")
        }
        PeriodType::None => None,
        PeriodType::Instant if has("timeSpan") => Some("an instant has no timeSpan"),
        PeriodType::Instant if has("startDate") => Some("an instant has no startDate"),
        _ if has("timeSpan") && has("periodFormat") => Some("timeSpan and periodFormat are exclusive"),
        _ if has("timeSpan") && has("endDate") && has("startDate") => {
            Some("timeSpan excludes endDate and startDate together")
        }
        _ if has("periodFormat") && has_resolution => {
            Some("periodFormat cannot be combined with date resolutions")
        }
        _ => None,
    }
}

fn validate_date_resolution<'m>(checker: &mut Checker<'m>, resolution: &'m TaxonomyObject) {
    let sources = ["value", "conceptName", "context"]
        .iter()
        .filter(|p| resolution.has(**p))
        .count();
    if sources != 1 {
        checker.issue(
            IssueKind::InvalidDateResolution {
                reason: "exactly one of value, conceptName or context is required",
            },
            resolution,
        );
    }
    if let Some(value) = resolution.str("value") {
        if !is_date_literal(value) {
            checker.issue(
                IssueKind::InvalidDateResolution {
                    reason: "value is not a date, dateTime or --MM-DD",
                },
                resolution,
            );
        }
    }
    checker.reference(resolution, "conceptName", &[ObjectKind::Concept]);
    checker.reference(resolution, "context", &[ObjectKind::Concept]);
}
