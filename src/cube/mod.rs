//! Cube and dimension resolution.
//!
//! Interprets a Cube's dimension list against the core dimensions, the
//! taxonomy-defined dimensions and their domains, and decides which cubes a
//! fact can be reported in.

mod period;

pub use period::{constraint_matches, fact_period, period_format, resolve_date, resolve_month_day};
pub(crate) use period::is_date_literal;

use std::collections::HashSet;

use serde::Serialize;

use crate::error::TaxonomyError;
use crate::model::{MapValue, ObjectId, ObjectKind, QName, TaxonomyModel, TaxonomyObject, XBRL_NS};
use crate::relationships::{edge_target, RelationshipSet};

/// The built-in fact axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CoreDimension {
    Concept,
    Entity,
    Period,
    Unit,
    Language,
}

impl CoreDimension {
    pub const ALL: &'static [CoreDimension] = &[
        CoreDimension::Concept,
        CoreDimension::Entity,
        CoreDimension::Period,
        CoreDimension::Unit,
        CoreDimension::Language,
    ];

    pub fn local_name(&self) -> &'static str {
        match self {
            CoreDimension::Concept => "concept",
            CoreDimension::Entity => "entity",
            CoreDimension::Period => "period",
            CoreDimension::Unit => "unit",
            CoreDimension::Language => "language",
        }
    }

    pub fn qname(&self) -> QName {
        QName::xbrl(self.local_name())
    }

    pub fn from_qname(name: &QName) -> Option<Self> {
        if name.namespace() != XBRL_NS {
            return None;
        }
        Self::ALL
            .iter()
            .copied()
            .find(|core| core.local_name() == name.local_name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionKind {
    Core(CoreDimension),
    Typed,
    Explicit,
}

impl DimensionKind {
    /// The `dimensionType` spelling used by allowed-cube-dimension entries.
    pub fn type_name(&self) -> &'static str {
        match self {
            DimensionKind::Core(_) => "core",
            DimensionKind::Typed => "typed",
            DimensionKind::Explicit => "explicit",
        }
    }
}

/// A cube dimension with its domain worked out.
#[derive(Clone, Debug)]
pub struct ResolvedDimension {
    pub name: QName,
    pub kind: DimensionKind,
    /// Value type of a typed dimension.
    pub data_type: Option<QName>,
    /// Permitted values, or `None` when the dimension is unconstrained.
    pub members: Option<Vec<QName>>,
}

impl ResolvedDimension {
    pub fn is_typed(&self) -> bool {
        self.kind == DimensionKind::Typed
    }

    pub fn allows(&self, value: &QName) -> bool {
        match &self.members {
            Some(members) => members.contains(value),
            None => true,
        }
    }
}

/// Resolves a CubeDimension object. The result is memoized on the object.
pub fn resolve_cube_dimension<'m>(
    model: &'m TaxonomyModel,
    cube_dimension: &'m TaxonomyObject,
) -> &'m ResolvedDimension {
    cube_dimension
        .cache
        .dimension
        .get_or_init(|| compute_dimension(model, cube_dimension))
}

fn compute_dimension(model: &TaxonomyModel, cube_dimension: &TaxonomyObject) -> ResolvedDimension {
    let name = cube_dimension
        .qname("dimensionName")
        .map(QName::without_anchor)
        .unwrap_or_else(|| QName::xbrl("unknown"));
    let members = cube_dimension
        .qname("domainName")
        .and_then(|domain| model.lookup_kind(domain, ObjectKind::Domain))
        .map(|domain| domain_members(model, domain));

    if let Some(core) = CoreDimension::from_qname(&name) {
        return ResolvedDimension {
            name,
            kind: DimensionKind::Core(core),
            data_type: None,
            members,
        };
    }

    let data_type = cube_dimension
        .qname("domainDataType")
        .cloned()
        .or_else(|| typed_domain_data_type(model, &name));
    match data_type {
        Some(data_type) => ResolvedDimension {
            name,
            kind: DimensionKind::Typed,
            data_type: Some(data_type),
            members: None,
        },
        None => ResolvedDimension {
            name,
            kind: DimensionKind::Explicit,
            data_type: None,
            members,
        },
    }
}

/// The data type of a dimension whose domain root only allows data types.
pub fn typed_domain_data_type(model: &TaxonomyModel, dimension: &QName) -> Option<QName> {
    let root = model
        .lookup_kind(dimension, ObjectKind::Dimension)?
        .qname("domainRoot")?;
    let items = model
        .lookup_kind(root, ObjectKind::DomainRoot)?
        .qnames("allowedDomainItems");
    let all_types = !items.is_empty()
        && items
            .iter()
            .all(|item| model.lookup_kind(item, ObjectKind::DataType).is_some());
    all_types.then(|| items[0].clone())
}

/// Usable targets of a domain's relationships, extensions included, in
/// first-appearance order.
pub fn domain_members(model: &TaxonomyModel, domain: &TaxonomyObject) -> Vec<QName> {
    let set = RelationshipSet::new(model, domain);
    let mut seen = HashSet::new();
    let members = set
        .relationships()
        .filter(|rel| rel.boolean("usable") != Some(false))
        .filter_map(edge_target)
        .map(QName::without_anchor)
        .filter(|target| seen.insert(target.clone()))
        .collect();
    members
}

/// Effective permissions of a cube type after inheritance.
#[derive(Clone, Debug)]
pub struct CubeTypeProfile {
    pub name: QName,
    pub period: bool,
    pub entity: bool,
    pub unit: bool,
    pub taxonomy_defined: bool,
    /// Allowed-dimension entries of the nearest type that declares any.
    pub allowed_dimensions: Option<Vec<ObjectId>>,
    /// Required relationship patterns of every type in the chain.
    pub required_relationships: Vec<ObjectId>,
    /// Types visited, starting with `name`.
    pub chain: Vec<QName>,
    /// The `baseCubeType` chain loops back on itself.
    pub cyclic: bool,
}

impl CubeTypeProfile {
    /// Walks `baseCubeType` from `cube_type`. Returns `None` if the type
    /// itself does not resolve; unresolvable bases end the chain.
    pub fn resolve(model: &TaxonomyModel, cube_type: &QName) -> Option<Self> {
        let first = model.lookup_kind(cube_type, ObjectKind::CubeType)?;

        let mut chain_objects = Vec::new();
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut cyclic = false;
        let mut current = Some(first);
        while let Some(obj) = current {
            let Some(name) = obj.name() else { break };
            if !seen.insert(name.clone()) {
                cyclic = true;
                break;
            }
            chain.push(name.clone());
            chain_objects.push(obj);
            current = obj
                .qname("baseCubeType")
                .and_then(|base| model.lookup_kind(base, ObjectKind::CubeType));
        }

        let flag = |property: &str| {
            chain_objects
                .iter()
                .find_map(|obj| obj.boolean(property))
                .unwrap_or(true)
        };
        let allowed_dimensions = chain_objects
            .iter()
            .find(|obj| obj.has("allowedCubeDimensions"))
            .map(|obj| obj.children("allowedCubeDimensions").to_vec());
        let required_relationships = chain_objects
            .iter()
            .flat_map(|obj| obj.children("requiredCubeRelationships").iter().copied())
            .collect();

        Some(Self {
            name: cube_type.without_anchor(),
            period: flag("periodDimension"),
            entity: flag("entityDimension"),
            unit: flag("unitDimension"),
            taxonomy_defined: flag("taxonomyDefinedDimension"),
            allowed_dimensions,
            required_relationships,
            chain,
            cyclic,
        })
    }

    /// Whether the cube type permits a dimension of this kind at all.
    pub fn allows_kind(&self, kind: DimensionKind) -> bool {
        match kind {
            DimensionKind::Core(CoreDimension::Period) => self.period,
            DimensionKind::Core(CoreDimension::Entity) => self.entity,
            DimensionKind::Core(CoreDimension::Unit) => self.unit,
            DimensionKind::Core(_) => true,
            DimensionKind::Typed | DimensionKind::Explicit => self.taxonomy_defined,
        }
    }

    /// Whether an allowed-dimension list admits `dimension`. Core
    /// dimensions are governed by the boolean flags only.
    pub fn admits(&self, model: &TaxonomyModel, dimension: &ResolvedDimension) -> bool {
        if matches!(dimension.kind, DimensionKind::Core(_)) {
            return true;
        }
        match &self.allowed_dimensions {
            Some(entries) => entries
                .iter()
                .any(|entry| allowed_entry_matches(model, model.object(*entry), dimension)),
            None => true,
        }
    }
}

/// Whether one AllowedCubeDimension entry describes `dimension`, either by
/// name or by type and data type.
pub fn allowed_entry_matches(
    model: &TaxonomyModel,
    entry: &TaxonomyObject,
    dimension: &ResolvedDimension,
) -> bool {
    if let Some(name) = entry.qname("dimensionName") {
        return *name == dimension.name;
    }
    if let Some(kind) = entry.str("dimensionType") {
        if kind != dimension.kind.type_name() {
            return false;
        }
    }
    match (entry.qname("dimensionDataType"), &dimension.data_type) {
        (Some(required), Some(actual)) => model.data_type_derives_from(actual, required),
        (Some(_), None) => false,
        (None, _) => true,
    }
}

/// Value of a core dimension on a fact.
pub fn fact_dimension<'f>(fact: &'f TaxonomyObject, name: &QName) -> Option<&'f MapValue> {
    fact.qname_map("dimensions")
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value)
}

pub fn fact_concept(fact: &TaxonomyObject) -> Option<&QName> {
    fact_dimension(fact, &CoreDimension::Concept.qname()).and_then(MapValue::as_qname)
}

/// Cubes that can hold `fact`, in cube declaration order.
///
/// # Errors
/// [`TaxonomyError::NotValidated`] unless the model has been validated,
/// [`TaxonomyError::NotAFact`] if `fact` is not a Fact object.
pub fn usable_cubes(fact: &TaxonomyObject, model: &TaxonomyModel) -> Result<Vec<ObjectId>, TaxonomyError> {
    if !model.is_validated() {
        return Err(TaxonomyError::NotValidated);
    }
    if fact.kind() != ObjectKind::Fact {
        return Err(TaxonomyError::NotAFact(fact.label().to_string()));
    }
    Ok(model
        .objects_of_kind(ObjectKind::Cube)
        .filter(|cube| cube_accepts(model, cube, fact))
        .map(TaxonomyObject::id)
        .collect())
}

/// Whether no cube dimension of `cube` rejects `fact`.
pub fn cube_accepts(model: &TaxonomyModel, cube: &TaxonomyObject, fact: &TaxonomyObject) -> bool {
    cube.children("cubeDimensions").iter().all(|id| {
        let cube_dimension = model.object(*id);
        dimension_accepts(model, cube_dimension, fact)
    })
}

fn dimension_accepts(model: &TaxonomyModel, cube_dimension: &TaxonomyObject, fact: &TaxonomyObject) -> bool {
    let resolved = resolve_cube_dimension(model, cube_dimension);
    let value = fact_dimension(fact, &resolved.name);
    let allow_domain_facts = cube_dimension.boolean("allowDomainFacts").unwrap_or(false);

    match resolved.kind {
        DimensionKind::Core(CoreDimension::Period) => {
            let constraints = cube_dimension.children("periodConstraints");
            if constraints.is_empty() {
                return true;
            }
            let period = fact_period(fact);
            constraints
                .iter()
                .any(|c| constraint_matches(model, model.object(*c), fact, period))
        }
        DimensionKind::Core(_) => match value {
            None => true,
            Some(MapValue::QName(q)) => resolved.allows(q),
            Some(MapValue::Text(_)) => resolved.members.is_none(),
        },
        DimensionKind::Typed => match value {
            None => allow_domain_facts,
            Some(value) => match &resolved.data_type {
                Some(data_type) => model.lexical_conforms(data_type, &value.to_string()),
                None => true,
            },
        },
        DimensionKind::Explicit => match value {
            None => allow_domain_facts,
            Some(MapValue::QName(q)) => resolved.allows(q),
            Some(MapValue::Text(_)) => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{NoImports, TaxonomyBuilder};
    use crate::validation::{validate_taxonomy, ValidateOptions};
    use serde_json::{json, Value};

    fn report_doc(taxonomy: Value, facts: Value) -> Value {
        json!({
            "documentInfo": {
                "documentType": "https://xbrl.org/2025/report",
                "namespaces": {
                    "ex": "http://example.com/ex",
                    "xbrl": "https://xbrl.org/2025",
                    "xs": "http://www.w3.org/2001/XMLSchema"
                }
            },
            "taxonomy": taxonomy,
            "facts": facts
        })
    }

    fn ex(local: &str) -> QName {
        QName::new("http://example.com/ex", local)
    }

    fn taxonomy() -> Value {
        json!({
            "name": "ex:T",
            "concepts": [
                {"name": "ex:Sales", "dataType": "xs:decimal", "periodType": "duration"},
                {"name": "ex:Cash", "dataType": "xs:decimal", "periodType": "instant"}
            ],
            "members": [{"name": "ex:North"}, {"name": "ex:South"}],
            "domainRoots": [
                {"name": "ex:RegionRoot"},
                {"name": "ex:CountRoot", "allowedDomainItems": ["xs:integer"]}
            ],
            "dimensions": [
                {"name": "ex:Region", "domainRoot": "ex:RegionRoot"},
                {"name": "ex:Count", "domainRoot": "ex:CountRoot"}
            ],
            "domains": [{
                "name": "ex:RegionDomain",
                "root": "ex:RegionRoot",
                "relationships": [
                    {"source": "ex:RegionRoot", "target": "ex:North"},
                    {"source": "ex:RegionRoot", "target": "ex:South", "usable": false}
                ]
            }],
            "cubes": [
                {
                    "name": "ex:ByRegion",
                    "cubeDimensions": [
                        {"dimensionName": "xbrl:concept"},
                        {"dimensionName": "ex:Region", "domainName": "ex:RegionDomain"},
                        {"dimensionName": "xbrl:period", "periodConstraints": [{"periodType": "duration"}]}
                    ]
                },
                {
                    "name": "ex:Totals",
                    "cubeDimensions": [
                        {"dimensionName": "xbrl:concept"},
                        {"dimensionName": "ex:Region", "domainName": "ex:RegionDomain", "allowDomainFacts": true}
                    ]
                },
                {
                    "name": "ex:Counts",
                    "cubeDimensions": [
                        {"dimensionName": "xbrl:concept"},
                        {"dimensionName": "ex:Count"}
                    ]
                }
            ]
        })
    }

    fn validated(facts: Value) -> TaxonomyModel {
        let outcome = TaxonomyBuilder::new(&NoImports)
            .build(&report_doc(taxonomy(), facts), "r.json")
            .unwrap();
        validate_taxonomy(&outcome.model, &ValidateOptions::default());
        outcome.model
    }

    fn cube_names(model: &TaxonomyModel, fact_id: &str) -> Vec<String> {
        let fact = model.facts().find(|f| f.str("id") == Some(fact_id)).unwrap();
        usable_cubes(fact, model)
            .unwrap()
            .into_iter()
            .map(|id| model.label_of(id).to_string())
            .collect()
    }

    #[test]
    fn test_resolves_typed_and_explicit_dimensions() {
        let model = validated(json!({}));
        let cube = model.lookup(&ex("ByRegion")).unwrap();
        let region = model.object(cube.children("cubeDimensions")[1]);
        let resolved = resolve_cube_dimension(&model, region);
        assert_eq!(resolved.kind, DimensionKind::Explicit);
        // Unusable members are not valid values.
        assert_eq!(resolved.members.as_deref(), Some(&[ex("North")][..]));

        let counts = model.lookup(&ex("Counts")).unwrap();
        let count = model.object(counts.children("cubeDimensions")[1]);
        let resolved = resolve_cube_dimension(&model, count);
        assert!(resolved.is_typed());
        assert_eq!(resolved.data_type.as_ref().map(QName::local_name), Some("integer"));

        let concept = model.object(cube.children("cubeDimensions")[0]);
        assert_eq!(
            resolve_cube_dimension(&model, concept).kind,
            DimensionKind::Core(CoreDimension::Concept)
        );
    }

    #[test]
    fn test_usable_cubes_filters_and_keeps_order() {
        let model = validated(json!({
            "north": {"value": "10", "dimensions": {"concept": "ex:Sales", "ex:Region": "ex:North", "period": "2023-01-01/2023-12-31"}},
            "south": {"value": "10", "dimensions": {"concept": "ex:Sales", "ex:Region": "ex:South", "period": "2023-01-01/2023-12-31"}},
            "total": {"value": "20", "dimensions": {"concept": "ex:Sales", "period": "2023-01-01/2023-12-31"}},
            "count": {"value": "3", "dimensions": {"concept": "ex:Cash", "ex:Count": "7", "period": "2023-12-31"}},
            "badcount": {"value": "3", "dimensions": {"concept": "ex:Cash", "ex:Count": "seven", "period": "2023-12-31"}}
        }));
        assert_eq!(cube_names(&model, "north"), vec!["ex:ByRegion", "ex:Totals"]);
        assert!(cube_names(&model, "south").is_empty());
        assert_eq!(cube_names(&model, "total"), vec!["ex:Totals"]);
        // Totals admits facts without a region.
        assert_eq!(cube_names(&model, "count"), vec!["ex:Totals", "ex:Counts"]);
        assert_eq!(cube_names(&model, "badcount"), vec!["ex:Totals"]);
    }

    #[test]
    fn test_usable_cubes_is_deterministic() {
        let model = validated(json!({
            "north": {"value": "10", "dimensions": {"concept": "ex:Sales", "ex:Region": "ex:North", "period": "2023-01-01/2023-12-31"}}
        }));
        assert_eq!(cube_names(&model, "north"), cube_names(&model, "north"));
    }

    #[test]
    fn test_usable_cubes_requires_validation() {
        let outcome = TaxonomyBuilder::new(&NoImports)
            .build(
                &report_doc(taxonomy(), json!({"f": {"dimensions": {"concept": "ex:Sales"}}})),
                "r.json",
            )
            .unwrap();
        let fact = outcome.model.facts().next().unwrap();
        assert!(matches!(
            usable_cubes(fact, &outcome.model),
            Err(TaxonomyError::NotValidated)
        ));
    }

    #[test]
    fn test_cube_type_profile_inherits_and_survives_cycles() {
        let outcome = TaxonomyBuilder::new(&NoImports)
            .build(
                &report_doc(
                    json!({
                        "name": "ex:T",
                        "cubeTypes": [
                            {"name": "ex:Base", "unitDimension": false},
                            {"name": "ex:Child", "baseCubeType": "ex:Base", "periodDimension": false},
                            {"name": "ex:LoopA", "baseCubeType": "ex:LoopB"},
                            {"name": "ex:LoopB", "baseCubeType": "ex:LoopA"}
                        ]
                    }),
                    json!({}),
                ),
                "r.json",
            )
            .unwrap();
        let model = outcome.model;

        let child = CubeTypeProfile::resolve(&model, &ex("Child")).unwrap();
        assert!(!child.unit);
        assert!(!child.period);
        assert!(child.entity);
        assert_eq!(child.chain, vec![ex("Child"), ex("Base")]);
        assert!(!child.cyclic);

        let looped = CubeTypeProfile::resolve(&model, &ex("LoopA")).unwrap();
        assert!(looped.cyclic);
        assert_eq!(looped.chain.len(), 2);

        let reference = CubeTypeProfile::resolve(&model, &QName::xbrl("referenceCube")).unwrap();
        assert!(!reference.allows_kind(DimensionKind::Core(CoreDimension::Period)));
        assert!(reference.allows_kind(DimensionKind::Core(CoreDimension::Concept)));
    }
}
