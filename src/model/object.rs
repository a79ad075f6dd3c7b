//! Typed taxonomy objects held in the model arena.

use std::sync::OnceLock;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use super::duration::XsdDuration;
use super::ids::ObjectId;
use super::kind::ObjectKind;
use super::period::{FactPeriod, PeriodFormat};
use super::qname::QName;
use crate::cube::ResolvedDimension;
use crate::relationships::RelationshipIndex;

/// The value side of a QName-keyed mapping.
///
/// Fact dimension values are QNames for explicit members, entities and units,
/// but free text for periods, languages and typed dimension values.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MapValue {
    QName(QName),
    Text(String),
}

impl MapValue {
    pub fn as_qname(&self) -> Option<&QName> {
        match self {
            MapValue::QName(q) => Some(q),
            MapValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MapValue::Text(s) => Some(s),
            MapValue::QName(_) => None,
        }
    }
}

impl std::fmt::Display for MapValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapValue::QName(q) => write!(f, "{q}"),
            MapValue::Text(s) => f.write_str(s),
        }
    }
}

/// A converted property value.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    String(String),
    Number(f64),
    Integer(i64),
    Boolean(bool),
    Date(NaiveDate),
    Duration(XsdDuration),
    QName(QName),
    QNames(Vec<QName>),
    Strings(Vec<String>),
    Object(ObjectId),
    Objects(Vec<ObjectId>),
    QNameMap(Vec<(QName, MapValue)>),
    Any(Value),
}

/// Write-once caches filled lazily by the relationship utility and the cube
/// resolver. Recomputing any of them yields the same value.
#[derive(Debug, Default)]
pub struct ObjectCache {
    pub(crate) relationships: OnceLock<RelationshipIndex>,
    pub(crate) fact_period: OnceLock<Option<FactPeriod>>,
    pub(crate) period_format: OnceLock<Option<PeriodFormat>>,
    pub(crate) dimension: OnceLock<ResolvedDimension>,
}

/// One object of the taxonomy graph.
#[derive(Debug)]
pub struct TaxonomyObject {
    pub(crate) id: ObjectId,
    pub(crate) kind: ObjectKind,
    pub(crate) parent: Option<(ObjectId, &'static str)>,
    pub(crate) label: String,
    pub(crate) properties: Vec<(&'static str, PropertyValue)>,
    pub(crate) removed: bool,
    pub(crate) cache: ObjectCache,
}

impl TaxonomyObject {
    pub(crate) fn new(
        id: ObjectId,
        kind: ObjectKind,
        parent: Option<(ObjectId, &'static str)>,
        label: String,
    ) -> Self {
        Self {
            id,
            kind,
            parent,
            label,
            properties: Vec::new(),
            removed: false,
            cache: ObjectCache::default(),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// The owning object and the collection property this object sits in.
    pub fn parent(&self) -> Option<(ObjectId, &'static str)> {
        self.parent
    }

    /// Display identity used in diagnostics: the object's name, or its
    /// position under the parent for unnamed objects.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// Converted properties in declared order.
    pub fn properties(&self) -> impl Iterator<Item = (&'static str, &PropertyValue)> {
        self.properties.iter().map(|(name, value)| (*name, value))
    }

    pub fn get(&self, property: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|(name, _)| *name == property)
            .map(|(_, value)| value)
    }

    pub fn has(&self, property: &str) -> bool {
        self.get(property).is_some()
    }

    /// The `name` property, for named kinds.
    pub fn name(&self) -> Option<&QName> {
        self.qname("name")
    }

    pub fn str(&self, property: &str) -> Option<&str> {
        match self.get(property)? {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn qname(&self, property: &str) -> Option<&QName> {
        match self.get(property)? {
            PropertyValue::QName(q) => Some(q),
            _ => None,
        }
    }

    pub fn qnames(&self, property: &str) -> &[QName] {
        match self.get(property) {
            Some(PropertyValue::QNames(list)) => list,
            _ => &[],
        }
    }

    pub fn strings(&self, property: &str) -> &[String] {
        match self.get(property) {
            Some(PropertyValue::Strings(list)) => list,
            _ => &[],
        }
    }

    pub fn boolean(&self, property: &str) -> Option<bool> {
        match self.get(property)? {
            PropertyValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn number(&self, property: &str) -> Option<f64> {
        match self.get(property)? {
            PropertyValue::Number(n) => Some(*n),
            PropertyValue::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn integer(&self, property: &str) -> Option<i64> {
        match self.get(property)? {
            PropertyValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn duration(&self, property: &str) -> Option<&XsdDuration> {
        match self.get(property)? {
            PropertyValue::Duration(d) => Some(d),
            _ => None,
        }
    }

    pub fn child(&self, property: &str) -> Option<ObjectId> {
        match self.get(property)? {
            PropertyValue::Object(id) => Some(*id),
            _ => None,
        }
    }

    pub fn children(&self, property: &str) -> &[ObjectId] {
        match self.get(property) {
            Some(PropertyValue::Objects(ids)) => ids,
            _ => &[],
        }
    }

    pub fn qname_map(&self, property: &str) -> &[(QName, MapValue)] {
        match self.get(property) {
            Some(PropertyValue::QNameMap(entries)) => entries,
            _ => &[],
        }
    }

    pub fn any(&self, property: &str) -> Option<&Value> {
        match self.get(property)? {
            PropertyValue::Any(v) => Some(v),
            _ => None,
        }
    }

    /// Every owned child id, across all nested-object properties.
    pub fn owned(&self) -> Vec<ObjectId> {
        let mut ids = Vec::new();
        for (_, value) in &self.properties {
            match value {
                PropertyValue::Object(id) => ids.push(*id),
                PropertyValue::Objects(list) => ids.extend(list.iter().copied()),
                _ => {}
            }
        }
        ids
    }

    /// Names this object annotates, for tag kinds.
    pub fn related_names(&self) -> Vec<&QName> {
        match self.kind.related_names_property() {
            Some(prop) => match self.get(prop) {
                Some(PropertyValue::QName(q)) => vec![q],
                Some(PropertyValue::QNames(list)) => list.iter().collect(),
                _ => Vec::new(),
            },
            None => Vec::new(),
        }
    }

    pub(crate) fn detach_child(&mut self, property: &str, child: ObjectId) {
        let Some(pos) = self.properties.iter().position(|(n, _)| *n == property) else {
            return;
        };
        match &mut self.properties[pos].1 {
            PropertyValue::Objects(ids) => ids.retain(|id| *id != child),
            PropertyValue::Object(id) if *id == child => {
                self.properties.remove(pos);
            }
            _ => {}
        }
    }
}
