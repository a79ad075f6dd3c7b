//! Object kinds and their declared property shapes.
//!
//! Every kind of taxonomy object is described by an ordered list of
//! [`PropertyDescriptor`]s. The builder walks these tables to turn a generic
//! document tree into typed objects, so adding a property to a kind is a
//! one-line change here.

use std::fmt;

use serde::Serialize;

use super::qname::{QName, XBRL_NS};

/// The closed set of object kinds a taxonomy document can contain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ObjectKind {
    Taxonomy,
    ImportTaxonomy,
    Selection,
    SelectionPredicate,
    Abstract,
    Concept,
    Cube,
    CubeDimension,
    PeriodConstraint,
    DateResolution,
    CubeType,
    AllowedCubeDimension,
    RequiredCubeRelationship,
    Dimension,
    Domain,
    DomainRoot,
    Member,
    Entity,
    Group,
    GroupContent,
    ExportProfile,
    Label,
    LabelType,
    Network,
    Relationship,
    RelationshipType,
    Property,
    PropertyType,
    Reference,
    ReferenceType,
    TableTemplate,
    DataTable,
    Transform,
    Unit,
    UnitType,
    DataType,
    Fact,
}

/// How a property's raw value is interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Number,
    Integer,
    Boolean,
    Date,
    Duration,
    /// A QName whose local part must be an NCName.
    QName,
    /// A QName whose local part may be any non-whitespace text.
    SQName,
    QNames,
    SQNames,
    Strings,
    /// A single owned nested object.
    Object(ObjectKind),
    /// An ordered collection of owned nested objects.
    Objects(ObjectKind),
    /// An ordered mapping keyed by QName (fact dimensions, table dimensions).
    QNameMap,
    /// Arbitrary JSON kept as-is.
    Any,
}

/// Default applied when an optional property is absent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DefaultValue {
    Bool(bool),
    Str(&'static str),
    /// A name in the `xbrl` vocabulary namespace.
    XbrlName(&'static str),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Requirement {
    Required,
    Optional,
    Default(DefaultValue),
}

/// One declared property of an object kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PropertyDescriptor {
    pub name: &'static str,
    pub kind: ValueKind,
    pub requirement: Requirement,
    /// Identity-bearing: a malformed value rejects the whole object.
    pub identity: bool,
}

const fn required(name: &'static str, kind: ValueKind) -> PropertyDescriptor {
    PropertyDescriptor {
        name,
        kind,
        requirement: Requirement::Required,
        identity: false,
    }
}

const fn optional(name: &'static str, kind: ValueKind) -> PropertyDescriptor {
    PropertyDescriptor {
        name,
        kind,
        requirement: Requirement::Optional,
        identity: false,
    }
}

const fn defaulted(name: &'static str, kind: ValueKind, default: DefaultValue) -> PropertyDescriptor {
    PropertyDescriptor {
        name,
        kind,
        requirement: Requirement::Default(default),
        identity: false,
    }
}

const fn name_of(kind: ValueKind, requirement: Requirement) -> PropertyDescriptor {
    PropertyDescriptor {
        name: "name",
        kind,
        requirement,
        identity: true,
    }
}

const NAME: PropertyDescriptor = name_of(ValueKind::QName, Requirement::Required);
const PROPERTIES: PropertyDescriptor = optional("properties", ValueKind::Objects(ObjectKind::Property));

use ValueKind as V;

const TAXONOMY: &[PropertyDescriptor] = &[
    NAME,
    optional("frameworkName", V::String),
    optional("version", V::String),
    defaulted("resolved", V::Boolean, DefaultValue::Bool(false)),
    optional("importedTaxonomies", V::Objects(ObjectKind::ImportTaxonomy)),
    optional("dataTypes", V::Objects(ObjectKind::DataType)),
    optional("unitTypes", V::Objects(ObjectKind::UnitType)),
    optional("units", V::Objects(ObjectKind::Unit)),
    optional("propertyTypes", V::Objects(ObjectKind::PropertyType)),
    optional("labelTypes", V::Objects(ObjectKind::LabelType)),
    optional("referenceTypes", V::Objects(ObjectKind::ReferenceType)),
    optional("relationshipTypes", V::Objects(ObjectKind::RelationshipType)),
    optional("cubeTypes", V::Objects(ObjectKind::CubeType)),
    optional("abstracts", V::Objects(ObjectKind::Abstract)),
    optional("concepts", V::Objects(ObjectKind::Concept)),
    optional("members", V::Objects(ObjectKind::Member)),
    optional("domainRoots", V::Objects(ObjectKind::DomainRoot)),
    optional("domains", V::Objects(ObjectKind::Domain)),
    optional("dimensions", V::Objects(ObjectKind::Dimension)),
    optional("entities", V::Objects(ObjectKind::Entity)),
    optional("groups", V::Objects(ObjectKind::Group)),
    optional("groupContents", V::Objects(ObjectKind::GroupContent)),
    optional("networks", V::Objects(ObjectKind::Network)),
    optional("cubes", V::Objects(ObjectKind::Cube)),
    optional("tableTemplates", V::Objects(ObjectKind::TableTemplate)),
    optional("dataTables", V::Objects(ObjectKind::DataTable)),
    optional("transforms", V::Objects(ObjectKind::Transform)),
    optional("exportProfiles", V::Objects(ObjectKind::ExportProfile)),
    optional("labels", V::Objects(ObjectKind::Label)),
    optional("references", V::Objects(ObjectKind::Reference)),
    PROPERTIES,
];

const IMPORT_TAXONOMY: &[PropertyDescriptor] = &[
    required("taxonomyName", V::QName),
    optional("profiles", V::QNames),
    optional("importObjects", V::SQNames),
    optional("importObjectTypes", V::QNames),
    optional("selections", V::Objects(ObjectKind::Selection)),
];

const SELECTION: &[PropertyDescriptor] = &[
    required("objectType", V::QName),
    optional("where", V::Objects(ObjectKind::SelectionPredicate)),
];

const SELECTION_PREDICATE: &[PropertyDescriptor] = &[
    required("property", V::String),
    required("operator", V::String),
    required("value", V::Any),
];

const ABSTRACT: &[PropertyDescriptor] = &[NAME, PROPERTIES];

const CONCEPT: &[PropertyDescriptor] = &[
    NAME,
    required("dataType", V::QName),
    required("periodType", V::String),
    optional("balance", V::String),
    defaulted("nillable", V::Boolean, DefaultValue::Bool(true)),
    optional("enumerationDomain", V::QName),
    PROPERTIES,
];

const CUBE: &[PropertyDescriptor] = &[
    NAME,
    defaulted("cubeType", V::QName, DefaultValue::XbrlName("reportCube")),
    optional("cubeDimensions", V::Objects(ObjectKind::CubeDimension)),
    optional("cubeNetworks", V::QNames),
    optional("excludeCubes", V::QNames),
    defaulted("cubeComplete", V::Boolean, DefaultValue::Bool(false)),
    PROPERTIES,
];

const CUBE_DIMENSION: &[PropertyDescriptor] = &[
    required("dimensionName", V::QName),
    optional("domainName", V::QName),
    optional("domainSort", V::String),
    optional("domainDataType", V::QName),
    optional("typedSort", V::String),
    defaulted("allowDomainFacts", V::Boolean, DefaultValue::Bool(false)),
    optional("periodConstraints", V::Objects(ObjectKind::PeriodConstraint)),
];

const PERIOD_CONSTRAINT: &[PropertyDescriptor] = &[
    required("periodType", V::String),
    optional("timeSpan", V::Duration),
    optional("periodFormat", V::String),
    optional("monthDay", V::Object(ObjectKind::DateResolution)),
    optional("endDate", V::Object(ObjectKind::DateResolution)),
    optional("startDate", V::Object(ObjectKind::DateResolution)),
    optional("onOrAfter", V::Object(ObjectKind::DateResolution)),
    optional("onOrBefore", V::Object(ObjectKind::DateResolution)),
];

const DATE_RESOLUTION: &[PropertyDescriptor] = &[
    optional("value", V::String),
    optional("conceptName", V::QName),
    optional("context", V::QName),
    optional("timeShift", V::Duration),
];

const CUBE_TYPE: &[PropertyDescriptor] = &[
    NAME,
    optional("baseCubeType", V::QName),
    optional("periodDimension", V::Boolean),
    optional("entityDimension", V::Boolean),
    optional("unitDimension", V::Boolean),
    optional("taxonomyDefinedDimension", V::Boolean),
    optional("allowedCubeDimensions", V::Objects(ObjectKind::AllowedCubeDimension)),
    optional(
        "requiredCubeRelationships",
        V::Objects(ObjectKind::RequiredCubeRelationship),
    ),
    PROPERTIES,
];

const ALLOWED_CUBE_DIMENSION: &[PropertyDescriptor] = &[
    optional("dimensionName", V::QName),
    optional("dimensionType", V::String),
    optional("dimensionDataType", V::QName),
    defaulted("required", V::Boolean, DefaultValue::Bool(false)),
];

const REQUIRED_CUBE_RELATIONSHIP: &[PropertyDescriptor] = &[
    required("relationshipTypeName", V::QName),
    optional("source", V::QName),
    optional("target", V::QName),
];

const DIMENSION: &[PropertyDescriptor] = &[
    NAME,
    optional("domainRoot", V::QName),
    optional("cubeTypes", V::QNames),
    PROPERTIES,
];

const DOMAIN: &[PropertyDescriptor] = &[
    name_of(V::QName, Requirement::Optional),
    optional("extendTargetName", V::QName),
    optional("root", V::QName),
    optional("relationships", V::Objects(ObjectKind::Relationship)),
    PROPERTIES,
];

const DOMAIN_ROOT: &[PropertyDescriptor] = &[
    NAME,
    optional("allowedDomainItems", V::QNames),
    PROPERTIES,
];

const MEMBER: &[PropertyDescriptor] = &[NAME, PROPERTIES];

const ENTITY: &[PropertyDescriptor] = &[name_of(V::SQName, Requirement::Required), PROPERTIES];

const GROUP: &[PropertyDescriptor] = &[NAME, PROPERTIES];

const GROUP_CONTENT: &[PropertyDescriptor] = &[
    required("groupName", V::QName),
    required("relatedNames", V::SQNames),
];

const EXPORT_PROFILE: &[PropertyDescriptor] = &[
    NAME,
    optional("exportObjects", V::SQNames),
    optional("exportObjectTypes", V::QNames),
    optional("selections", V::Objects(ObjectKind::Selection)),
];

const LABEL: &[PropertyDescriptor] = &[
    required("relatedName", V::SQName),
    defaulted("labelType", V::QName, DefaultValue::XbrlName("label")),
    required("language", V::String),
    required("value", V::String),
];

const LABEL_TYPE: &[PropertyDescriptor] = &[
    NAME,
    optional("allowedObjects", V::QNames),
    PROPERTIES,
];

const NETWORK: &[PropertyDescriptor] = &[
    name_of(V::QName, Requirement::Optional),
    optional("extendTargetName", V::QName),
    optional("relationshipTypeName", V::QName),
    optional("roots", V::SQNames),
    optional("relationships", V::Objects(ObjectKind::Relationship)),
    PROPERTIES,
];

const RELATIONSHIP: &[PropertyDescriptor] = &[
    required("source", V::SQName),
    required("target", V::SQName),
    optional("order", V::Number),
    optional("weight", V::Number),
    optional("preferredLabel", V::QName),
    defaulted("usable", V::Boolean, DefaultValue::Bool(true)),
    PROPERTIES,
];

const RELATIONSHIP_TYPE: &[PropertyDescriptor] = &[
    NAME,
    defaulted("cycles", V::String, DefaultValue::Str("any")),
    optional("allowedLinkProperties", V::Strings),
    optional("requiredLinkProperties", V::Strings),
    optional("sourceObjects", V::QNames),
    optional("targetObjects", V::QNames),
    PROPERTIES,
];

const PROPERTY: &[PropertyDescriptor] = &[
    required("property", V::QName),
    required("value", V::Any),
];

const PROPERTY_TYPE: &[PropertyDescriptor] = &[
    NAME,
    required("dataType", V::QName),
    optional("enumerationDomain", V::QName),
    defaulted("immutable", V::Boolean, DefaultValue::Bool(true)),
    optional("allowedObjects", V::QNames),
];

const REFERENCE: &[PropertyDescriptor] = &[
    optional("name", V::QName),
    required("relatedNames", V::SQNames),
    required("referenceType", V::QName),
    optional("language", V::String),
    PROPERTIES,
];

const REFERENCE_TYPE: &[PropertyDescriptor] = &[
    NAME,
    optional("allowedObjects", V::QNames),
    optional("orderedProperties", V::QNames),
];

const TABLE_TEMPLATE: &[PropertyDescriptor] = &[
    NAME,
    optional("rowIdColumn", V::String),
    required("columns", V::Strings),
    optional("dimensions", V::QNameMap),
];

const DATA_TABLE: &[PropertyDescriptor] = &[
    NAME,
    required("cubeName", V::QName),
    required("tableTemplate", V::QName),
];

const TRANSFORM: &[PropertyDescriptor] = &[
    NAME,
    required("inputDataType", V::QName),
    required("outputDataType", V::QName),
];

const UNIT: &[PropertyDescriptor] = &[
    name_of(V::SQName, Requirement::Required),
    optional("dataType", V::QName),
];

const UNIT_TYPE: &[PropertyDescriptor] = &[
    NAME,
    required("dataTypeNumerator", V::QName),
    optional("dataTypeDenominator", V::QName),
    optional("dataTypeMultiplier", V::QName),
];

const DATA_TYPE: &[PropertyDescriptor] = &[
    NAME,
    optional("baseType", V::QName),
    optional("enumeration", V::Strings),
    optional("minInclusive", V::Number),
    optional("maxInclusive", V::Number),
    optional("minExclusive", V::Number),
    optional("maxExclusive", V::Number),
    optional("totalDigits", V::Integer),
    optional("fractionDigits", V::Integer),
    optional("length", V::Integer),
    optional("minLength", V::Integer),
    optional("maxLength", V::Integer),
    optional("patterns", V::Strings),
];

const FACT: &[PropertyDescriptor] = &[
    PropertyDescriptor {
        name: "id",
        kind: V::String,
        requirement: Requirement::Required,
        identity: true,
    },
    optional("value", V::Any),
    optional("decimals", V::Any),
    required("dimensions", V::QNameMap),
];

impl ObjectKind {
    pub const ALL: &'static [ObjectKind] = &[
        ObjectKind::Taxonomy,
        ObjectKind::ImportTaxonomy,
        ObjectKind::Selection,
        ObjectKind::SelectionPredicate,
        ObjectKind::Abstract,
        ObjectKind::Concept,
        ObjectKind::Cube,
        ObjectKind::CubeDimension,
        ObjectKind::PeriodConstraint,
        ObjectKind::DateResolution,
        ObjectKind::CubeType,
        ObjectKind::AllowedCubeDimension,
        ObjectKind::RequiredCubeRelationship,
        ObjectKind::Dimension,
        ObjectKind::Domain,
        ObjectKind::DomainRoot,
        ObjectKind::Member,
        ObjectKind::Entity,
        ObjectKind::Group,
        ObjectKind::GroupContent,
        ObjectKind::ExportProfile,
        ObjectKind::Label,
        ObjectKind::LabelType,
        ObjectKind::Network,
        ObjectKind::Relationship,
        ObjectKind::RelationshipType,
        ObjectKind::Property,
        ObjectKind::PropertyType,
        ObjectKind::Reference,
        ObjectKind::ReferenceType,
        ObjectKind::TableTemplate,
        ObjectKind::DataTable,
        ObjectKind::Transform,
        ObjectKind::Unit,
        ObjectKind::UnitType,
        ObjectKind::DataType,
        ObjectKind::Fact,
    ];

    /// The camelCase kind name used in object-type QNames and messages.
    pub fn name(&self) -> &'static str {
        match self {
            ObjectKind::Taxonomy => "taxonomy",
            ObjectKind::ImportTaxonomy => "importTaxonomy",
            ObjectKind::Selection => "selection",
            ObjectKind::SelectionPredicate => "selectionPredicate",
            ObjectKind::Abstract => "abstract",
            ObjectKind::Concept => "concept",
            ObjectKind::Cube => "cube",
            ObjectKind::CubeDimension => "cubeDimension",
            ObjectKind::PeriodConstraint => "periodConstraint",
            ObjectKind::DateResolution => "dateResolution",
            ObjectKind::CubeType => "cubeType",
            ObjectKind::AllowedCubeDimension => "allowedCubeDimension",
            ObjectKind::RequiredCubeRelationship => "requiredCubeRelationship",
            ObjectKind::Dimension => "dimension",
            ObjectKind::Domain => "domain",
            ObjectKind::DomainRoot => "domainRoot",
            ObjectKind::Member => "member",
            ObjectKind::Entity => "entity",
            ObjectKind::Group => "group",
            ObjectKind::GroupContent => "groupContent",
            ObjectKind::ExportProfile => "exportProfile",
            ObjectKind::Label => "label",
            ObjectKind::LabelType => "labelType",
            ObjectKind::Network => "network",
            ObjectKind::Relationship => "relationship",
            ObjectKind::RelationshipType => "relationshipType",
            ObjectKind::Property => "property",
            ObjectKind::PropertyType => "propertyType",
            ObjectKind::Reference => "reference",
            ObjectKind::ReferenceType => "referenceType",
            ObjectKind::TableTemplate => "tableTemplate",
            ObjectKind::DataTable => "dataTable",
            ObjectKind::Transform => "transform",
            ObjectKind::Unit => "unit",
            ObjectKind::UnitType => "unitType",
            ObjectKind::DataType => "dataType",
            ObjectKind::Fact => "fact",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }

    /// The object-type QName, e.g. `xbrl:conceptObject`.
    pub fn type_qname(&self) -> QName {
        QName::xbrl(format!("{}Object", self.name()))
    }

    /// Inverse of [`type_qname`](Self::type_qname).
    pub fn from_type_qname(name: &QName) -> Option<Self> {
        if name.namespace() != XBRL_NS {
            return None;
        }
        name.local_name()
            .strip_suffix("Object")
            .and_then(Self::from_name)
    }

    /// The declared properties of this kind, in document order.
    pub fn descriptors(&self) -> &'static [PropertyDescriptor] {
        match self {
            ObjectKind::Taxonomy => TAXONOMY,
            ObjectKind::ImportTaxonomy => IMPORT_TAXONOMY,
            ObjectKind::Selection => SELECTION,
            ObjectKind::SelectionPredicate => SELECTION_PREDICATE,
            ObjectKind::Abstract => ABSTRACT,
            ObjectKind::Concept => CONCEPT,
            ObjectKind::Cube => CUBE,
            ObjectKind::CubeDimension => CUBE_DIMENSION,
            ObjectKind::PeriodConstraint => PERIOD_CONSTRAINT,
            ObjectKind::DateResolution => DATE_RESOLUTION,
            ObjectKind::CubeType => CUBE_TYPE,
            ObjectKind::AllowedCubeDimension => ALLOWED_CUBE_DIMENSION,
            ObjectKind::RequiredCubeRelationship => REQUIRED_CUBE_RELATIONSHIP,
            ObjectKind::Dimension => DIMENSION,
            ObjectKind::Domain => DOMAIN,
            ObjectKind::DomainRoot => DOMAIN_ROOT,
            ObjectKind::Member => MEMBER,
            ObjectKind::Entity => ENTITY,
            ObjectKind::Group => GROUP,
            ObjectKind::GroupContent => GROUP_CONTENT,
            ObjectKind::ExportProfile => EXPORT_PROFILE,
            ObjectKind::Label => LABEL,
            ObjectKind::LabelType => LABEL_TYPE,
            ObjectKind::Network => NETWORK,
            ObjectKind::Relationship => RELATIONSHIP,
            ObjectKind::RelationshipType => RELATIONSHIP_TYPE,
            ObjectKind::Property => PROPERTY,
            ObjectKind::PropertyType => PROPERTY_TYPE,
            ObjectKind::Reference => REFERENCE,
            ObjectKind::ReferenceType => REFERENCE_TYPE,
            ObjectKind::TableTemplate => TABLE_TEMPLATE,
            ObjectKind::DataTable => DATA_TABLE,
            ObjectKind::Transform => TRANSFORM,
            ObjectKind::Unit => UNIT,
            ObjectKind::UnitType => UNIT_TYPE,
            ObjectKind::DataType => DATA_TYPE,
            ObjectKind::Fact => FACT,
        }
    }

    pub fn descriptor(&self, property: &str) -> Option<&'static PropertyDescriptor> {
        self.descriptors().iter().find(|d| d.name == property)
    }

    /// The identity-bearing property, if the kind has one.
    pub fn identity(&self) -> Option<&'static PropertyDescriptor> {
        self.descriptors().iter().find(|d| d.identity)
    }

    /// Whether objects of this kind occupy the single-object registry.
    pub fn is_named(&self) -> bool {
        matches!(
            self,
            ObjectKind::Taxonomy
                | ObjectKind::Abstract
                | ObjectKind::Concept
                | ObjectKind::Cube
                | ObjectKind::CubeType
                | ObjectKind::DataType
                | ObjectKind::Dimension
                | ObjectKind::Domain
                | ObjectKind::DomainRoot
                | ObjectKind::Entity
                | ObjectKind::Group
                | ObjectKind::LabelType
                | ObjectKind::Member
                | ObjectKind::Network
                | ObjectKind::PropertyType
                | ObjectKind::ReferenceType
                | ObjectKind::RelationshipType
                | ObjectKind::TableTemplate
                | ObjectKind::DataTable
                | ObjectKind::Transform
                | ObjectKind::Unit
                | ObjectKind::UnitType
        )
    }

    /// The property holding the names a tag object annotates.
    pub fn related_names_property(&self) -> Option<&'static str> {
        match self {
            ObjectKind::Label => Some("relatedName"),
            ObjectKind::Reference => Some("relatedNames"),
            _ => None,
        }
    }

    /// Whether objects of this kind live in the tag index.
    pub fn is_tag(&self) -> bool {
        self.related_names_property().is_some()
    }

    /// Whether the kind owns a relationship collection.
    pub fn has_relationships(&self) -> bool {
        matches!(self, ObjectKind::Domain | ObjectKind::Network)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
