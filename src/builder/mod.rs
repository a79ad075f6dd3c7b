//! Descriptor-driven construction of the taxonomy graph.
//!
//! One generic routine, [`TaxonomyBuilder::build_fragment`], turns a node of
//! the input tree into an object of a given [`ObjectKind`] by walking that
//! kind's property descriptors. Document loading, import following and
//! import selection are layered on top of it.
//!
//! Data problems never abort a build: they are collected into the returned
//! [`ValidationReport`] and the best possible graph is returned. The only
//! hard failure is a top-level document whose type is not a taxonomy or
//! report document.

mod imports;
mod selection;

pub use imports::{document_namespaces, taxonomy_namespace, Catalog, ImportResolver, NoImports};
pub use selection::OPERATORS;
pub(crate) use selection::selection_issues;

use std::collections::BTreeSet;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::TaxonomyError;
use crate::model::{
    parse_date, DefaultValue, MapValue, Namespaces, ObjectId, ObjectKind, PropertyValue, QName,
    QNameError, Requirement, TaxonomyModel, ValueKind, XsdDuration, CORE_TAXONOMY,
    REPORT_DOCUMENT_TYPE, TAXONOMY_DOCUMENT_TYPE, XBRL_NS,
};
use crate::validation::{IssueKind, ObjectRef, ValidationIssue, ValidationReport};

/// Options controlling how documents are loaded.
#[derive(Clone, Debug)]
pub struct LoadOptions {
    /// Follow `importedTaxonomies` through the [`ImportResolver`].
    pub follow_imports: bool,
    /// Load the built-in core vocabulary before the first user document.
    pub load_core: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            follow_imports: true,
            load_core: true,
        }
    }
}

/// Result of loading a document into a fresh model.
#[derive(Debug)]
pub struct BuildOutcome {
    pub model: TaxonomyModel,
    /// The root Taxonomy object of the loaded document, if it could be built.
    pub root: Option<ObjectId>,
    /// Structural diagnostics found while building.
    pub report: ValidationReport,
}

/// Builds taxonomy models from generic input trees.
pub struct TaxonomyBuilder<'a> {
    resolver: &'a dyn ImportResolver,
    options: LoadOptions,
}

/// State threaded through one load, including every recursive import.
struct BuildContext<'m> {
    model: &'m mut TaxonomyModel,
    report: ValidationReport,
    undeclared: BTreeSet<String>,
}

impl BuildContext<'_> {
    fn issue_at(&mut self, kind: IssueKind, id: ObjectId) {
        let obj = ObjectRef::of(self.model.object(id));
        self.report.add(ValidationIssue::new(kind, vec![obj]));
    }

    fn issue_near(&mut self, kind: IssueKind, label: &str) {
        self.report
            .add(ValidationIssue::new(kind, vec![ObjectRef::location(label)]));
    }
}

/// Where an object sits, for parent links and positional labels.
#[derive(Clone, Copy)]
struct Position<'p> {
    parent: Option<(ObjectId, &'static str)>,
    index: Option<usize>,
    fallback: &'p str,
}

impl<'a> TaxonomyBuilder<'a> {
    pub fn new(resolver: &'a dyn ImportResolver) -> Self {
        Self {
            resolver,
            options: LoadOptions::default(),
        }
    }

    pub fn with_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    /// Loads `document` into a fresh model (core vocabulary first).
    ///
    /// # Errors
    /// Returns [`TaxonomyError::UnsupportedDocumentType`] if the document is
    /// not a taxonomy or report document. Nothing is built in that case.
    pub fn build(&self, document: &Value, location: &str) -> Result<BuildOutcome, TaxonomyError> {
        let mut model = TaxonomyModel::new();
        let (root, report) = self.build_into(&mut model, document, location)?;
        Ok(BuildOutcome {
            model,
            root,
            report,
        })
    }

    /// Loads `document` into an existing model. The core vocabulary is loaded
    /// only if the model does not have it yet.
    pub fn build_into(
        &self,
        model: &mut TaxonomyModel,
        document: &Value,
        location: &str,
    ) -> Result<(Option<ObjectId>, ValidationReport), TaxonomyError> {
        check_document_type(document)?;

        let mut ctx = BuildContext {
            model,
            report: ValidationReport::new(),
            undeclared: BTreeSet::new(),
        };

        if self.options.load_core && !ctx.model.is_core_loaded() {
            self.load_core(&mut ctx)?;
        }

        let before = ctx.model.len();
        let root = self.load_document(&mut ctx, document, location);
        flush_undeclared(&mut ctx, location);
        ctx.model.invalidate();

        info!(
            location,
            objects = ctx.model.len() - before,
            issues = ctx.report.issues.len(),
            "loaded taxonomy document"
        );
        Ok((root, ctx.report))
    }

    /// Builds one object of `kind` from `node` and installs it in `model`.
    ///
    /// This is the generic descriptor-driven routine every document load is
    /// made of; it is exposed for callers that assemble models piecewise.
    pub fn build_fragment(
        &self,
        model: &mut TaxonomyModel,
        node: &Value,
        kind: ObjectKind,
        namespaces: &Namespaces,
    ) -> (Option<ObjectId>, ValidationReport) {
        let mut ctx = BuildContext {
            model,
            report: ValidationReport::new(),
            undeclared: BTreeSet::new(),
        };
        ctx.model.merge_namespaces(namespaces);
        let position = Position {
            parent: None,
            index: None,
            fallback: kind.name(),
        };
        let id = self.build_object(&mut ctx, node, kind, position, namespaces);
        if kind == ObjectKind::Taxonomy {
            if let Some(id) = id {
                ctx.model.push_taxonomy(id);
            }
        }
        flush_undeclared(&mut ctx, kind.name());
        ctx.model.invalidate();
        (id, ctx.report)
    }

    fn load_core(&self, ctx: &mut BuildContext<'_>) -> Result<(), TaxonomyError> {
        let core: Value = serde_json::from_str(CORE_TAXONOMY).map_err(TaxonomyError::CoreTaxonomy)?;
        for (_, namespace) in document_namespaces(&core).iter() {
            ctx.model.mark_loaded(namespace);
        }
        let root = self.load_document(ctx, &core, "core");
        ctx.model.set_core_loaded(root);
        debug!(objects = ctx.model.len(), "loaded core taxonomy");
        Ok(())
    }

    /// Loads one document: its taxonomy (following imports depth-first) and
    /// any facts. The document type must already have been checked by the
    /// caller for top-level documents.
    fn load_document(
        &self,
        ctx: &mut BuildContext<'_>,
        document: &Value,
        location: &str,
    ) -> Option<ObjectId> {
        let namespaces = document_namespaces(document);
        ctx.model.merge_namespaces(&namespaces);

        let Some(top) = document.as_object() else {
            ctx.issue_near(
                IssueKind::InvalidValue {
                    property: "document",
                    value: short(document),
                    expected: "object",
                },
                location,
            );
            return None;
        };
        for key in top.keys() {
            if !matches!(key.as_str(), "documentInfo" | "taxonomy" | "facts") {
                ctx.undeclared.insert(format!("document.{key}"));
            }
        }

        let root = match top.get("taxonomy") {
            Some(taxonomy) => {
                // Mark the namespace before building so imports of it (cycles,
                // diamonds) are recognised as already loaded.
                if let Some(namespace) = taxonomy_namespace(document) {
                    ctx.model.mark_loaded(&namespace);
                }
                let position = Position {
                    parent: None,
                    index: None,
                    fallback: location,
                };
                let root = self.build_object(ctx, taxonomy, ObjectKind::Taxonomy, position, &namespaces);
                if let Some(id) = root {
                    ctx.model.push_taxonomy(id);
                }
                root
            }
            None => {
                ctx.issue_near(
                    IssueKind::MissingRequiredProperty {
                        property: "taxonomy",
                    },
                    location,
                );
                None
            }
        };

        if let Some(facts) = top.get("facts") {
            self.load_facts(ctx, facts, location, &namespaces);
        }
        root
    }

    fn load_facts(
        &self,
        ctx: &mut BuildContext<'_>,
        facts: &Value,
        location: &str,
        namespaces: &Namespaces,
    ) {
        let Some(facts) = facts.as_object() else {
            ctx.issue_near(
                IssueKind::InvalidValue {
                    property: "facts",
                    value: short(facts),
                    expected: "mapping of fact id to fact",
                },
                location,
            );
            return;
        };
        for (fact_id, fact) in facts {
            let node = match fact {
                Value::Object(map) => {
                    let mut map = map.clone();
                    map.entry("id").or_insert_with(|| Value::String(fact_id.clone()));
                    Value::Object(map)
                }
                other => other.clone(),
            };
            let position = Position {
                parent: None,
                index: None,
                fallback: fact_id,
            };
            if let Some(id) = self.build_object(ctx, &node, ObjectKind::Fact, position, namespaces) {
                ctx.model.push_fact(id);
            }
        }
    }

    /// The generic descriptor-driven constructor.
    fn build_object(
        &self,
        ctx: &mut BuildContext<'_>,
        node: &Value,
        kind: ObjectKind,
        position: Position<'_>,
        namespaces: &Namespaces,
    ) -> Option<ObjectId> {
        let positional = positional_label(ctx.model, position);

        let Some(fields) = node.as_object() else {
            ctx.issue_near(
                IssueKind::InvalidValue {
                    property: position.parent.map(|(_, p)| p).unwrap_or("object"),
                    value: short(node),
                    expected: kind.name(),
                },
                &positional,
            );
            return None;
        };

        // Identity first: a malformed identity rejects the whole object.
        let mut identity = None;
        if let Some(descriptor) = kind.identity() {
            if let Some(raw) = fields.get(descriptor.name).filter(|v| !v.is_null()) {
                match convert_scalar(descriptor.kind, descriptor.name, raw, namespaces) {
                    Ok(value) => identity = Some(value),
                    Err(issue) => {
                        ctx.issue_near(issue, &positional);
                        debug!(kind = %kind, at = %positional, "rejected object with malformed identity");
                        return None;
                    }
                }
            }
        }

        let label = match &identity {
            Some(PropertyValue::QName(q)) => q.to_string(),
            Some(PropertyValue::String(s)) => s.clone(),
            _ => positional,
        };
        let id = ctx.model.allocate(kind, position.parent, label);

        let mut properties = Vec::with_capacity(kind.descriptors().len());
        for descriptor in kind.descriptors() {
            if descriptor.identity {
                if let Some(value) = identity.take() {
                    properties.push((descriptor.name, value));
                    continue;
                }
            }

            let raw = fields.get(descriptor.name).filter(|v| !v.is_null());
            let Some(raw) = raw else {
                match descriptor.requirement {
                    Requirement::Required => ctx.issue_at(
                        IssueKind::MissingRequiredProperty {
                            property: descriptor.name,
                        },
                        id,
                    ),
                    Requirement::Default(default) => {
                        properties.push((descriptor.name, default_value(default)));
                    }
                    Requirement::Optional => {}
                }
                continue;
            };

            match descriptor.kind {
                ValueKind::Object(child_kind) => {
                    let child = Position {
                        parent: Some((id, descriptor.name)),
                        index: None,
                        fallback: descriptor.name,
                    };
                    if let Some(child_id) = self.build_object(ctx, raw, child_kind, child, namespaces) {
                        properties.push((descriptor.name, PropertyValue::Object(child_id)));
                    }
                }
                ValueKind::Objects(child_kind) => {
                    let Some(items) = raw.as_array() else {
                        ctx.issue_at(
                            IssueKind::InvalidValue {
                                property: descriptor.name,
                                value: short(raw),
                                expected: "list of objects",
                            },
                            id,
                        );
                        continue;
                    };
                    let mut ids = Vec::with_capacity(items.len());
                    for (index, item) in items.iter().enumerate() {
                        let child = Position {
                            parent: Some((id, descriptor.name)),
                            index: Some(index),
                            fallback: descriptor.name,
                        };
                        if let Some(child_id) = self.build_object(ctx, item, child_kind, child, namespaces) {
                            ids.push(child_id);
                        }
                    }
                    properties.push((descriptor.name, PropertyValue::Objects(ids)));
                }
                scalar => match convert_scalar(scalar, descriptor.name, raw, namespaces) {
                    Ok(value) => properties.push((descriptor.name, value)),
                    Err(issue) => ctx.issue_at(issue, id),
                },
            }
        }

        for key in fields.keys() {
            if kind.descriptor(key).is_none() {
                ctx.undeclared.insert(format!("{}.{}", kind.name(), key));
            }
        }

        if kind.has_relationships() {
            drop_edges_to_root(ctx, id, &mut properties);
        }
        ctx.model.set_properties(id, properties);

        if kind.is_named() {
            if let Some(name) = ctx.model.object(id).name().cloned() {
                if let Err(existing) = ctx.model.register_named(name.without_anchor(), id) {
                    let objects = vec![
                        ObjectRef::of(ctx.model.object(id)),
                        ObjectRef::of(ctx.model.object(existing)),
                    ];
                    ctx.report
                        .add(ValidationIssue::new(IssueKind::DuplicateObject { name }, objects));
                    ctx.model.remove(id);
                    return None;
                }
            }
        }
        if kind.is_tag() {
            let names: Vec<QName> = ctx
                .model
                .object(id)
                .related_names()
                .into_iter()
                .map(QName::without_anchor)
                .collect();
            for name in names {
                ctx.model.register_tag(name, id);
            }
        }

        if kind == ObjectKind::ImportTaxonomy {
            self.follow_import(ctx, id, namespaces);
        }
        Some(id)
    }

    /// Loads the taxonomy named by an ImportTaxonomy object, then applies
    /// its selection criteria to the imported range.
    fn follow_import(&self, ctx: &mut BuildContext<'_>, import: ObjectId, namespaces: &Namespaces) {
        let Some(taxonomy) = ctx.model.object(import).qname("taxonomyName").cloned() else {
            return;
        };
        let namespace = taxonomy.namespace().to_string();
        if ctx.model.is_loaded(&namespace) {
            debug!(%taxonomy, "import already loaded");
            return;
        }
        if !self.options.follow_imports {
            debug!(%taxonomy, "import following disabled");
            return;
        }
        ctx.model.mark_loaded(&namespace);

        let Some(location) = self.resolver.locate(&namespace) else {
            warn!(%taxonomy, "no location known for imported taxonomy");
            ctx.issue_at(IssueKind::UnresolvableImport { taxonomy }, import);
            return;
        };
        let document = match self.resolver.fetch(&location) {
            Ok(document) => document,
            Err(err) => {
                warn!(%taxonomy, %location, error = %err, "imported taxonomy could not be fetched");
                ctx.issue_at(
                    IssueKind::InvalidImportDocument {
                        location,
                        reason: err.to_string(),
                    },
                    import,
                );
                return;
            }
        };
        if let Err(err) = check_document_type(&document) {
            ctx.issue_at(
                IssueKind::InvalidImportDocument {
                    location,
                    reason: err.to_string(),
                },
                import,
            );
            return;
        }

        debug!(%taxonomy, %location, "following import");
        let start = ctx.model.len();
        self.load_document(ctx, &document, &location);
        let end = ctx.model.len();
        let imported = document_namespaces(&document);
        selection::apply(ctx, import, start..end, namespaces, &imported);
    }
}

/// Rejects documents that are neither taxonomy nor report documents.
fn check_document_type(document: &Value) -> Result<(), TaxonomyError> {
    let found = document
        .pointer("/documentInfo/documentType")
        .and_then(Value::as_str);
    match found {
        Some(TAXONOMY_DOCUMENT_TYPE) | Some(REPORT_DOCUMENT_TYPE) => Ok(()),
        Some(other) => Err(TaxonomyError::UnsupportedDocumentType {
            found: other.to_string(),
        }),
        None => Err(TaxonomyError::UnsupportedDocumentType {
            found: "<missing>".to_string(),
        }),
    }
}

fn flush_undeclared(ctx: &mut BuildContext<'_>, location: &str) {
    if ctx.undeclared.is_empty() {
        return;
    }
    let elements: Vec<String> = std::mem::take(&mut ctx.undeclared).into_iter().collect();
    debug!(count = elements.len(), "undeclared elements ignored");
    ctx.issue_near(IssueKind::UndeclaredElements { elements }, location);
}

fn positional_label(model: &TaxonomyModel, position: Position<'_>) -> String {
    match (position.parent, position.index) {
        (Some((parent, property)), Some(index)) => {
            format!("{}/{}[{}]", model.label_of(parent), property, index)
        }
        (Some((parent, property)), None) => format!("{}/{}", model.label_of(parent), property),
        (None, _) => position.fallback.to_string(),
    }
}

/// Removes relationships whose target is one of the owner's declared roots.
fn drop_edges_to_root(
    ctx: &mut BuildContext<'_>,
    owner: ObjectId,
    properties: &mut [(&'static str, PropertyValue)],
) {
    let mut roots: Vec<QName> = Vec::new();
    for (name, value) in properties.iter() {
        match (*name, value) {
            ("root", PropertyValue::QName(q)) => roots.push(q.clone()),
            ("roots", PropertyValue::QNames(list)) => roots.extend(list.iter().cloned()),
            _ => {}
        }
    }
    if roots.is_empty() {
        return;
    }

    let mut dropped = Vec::new();
    for (name, value) in properties.iter_mut() {
        if *name != "relationships" {
            continue;
        }
        if let PropertyValue::Objects(ids) = value {
            ids.retain(|rel| {
                let rel_obj = ctx.model.object(*rel);
                match (rel_obj.qname("source"), rel_obj.qname("target")) {
                    (Some(source), Some(target)) if roots.contains(target) => {
                        dropped.push((*rel, source.clone(), target.clone()));
                        false
                    }
                    _ => true,
                }
            });
        }
    }
    for (rel, source, target) in dropped {
        ctx.issue_at(IssueKind::RelationshipToRoot { source, target }, owner);
        ctx.model.remove(rel);
    }
}

fn default_value(default: DefaultValue) -> PropertyValue {
    match default {
        DefaultValue::Bool(b) => PropertyValue::Boolean(b),
        DefaultValue::Str(s) => PropertyValue::String(s.to_string()),
        DefaultValue::XbrlName(local) => PropertyValue::QName(QName::xbrl(local)),
    }
}

/// Compact rendering of a raw value for diagnostics.
fn short(value: &Value) -> String {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if text.chars().count() > 60 {
        let cut: String = text.chars().take(57).collect();
        format!("{cut}...")
    } else {
        text
    }
}

fn qname_issue(property: &'static str, err: QNameError) -> IssueKind {
    match err {
        QNameError::UnboundPrefix { value, prefix } => IssueKind::UnboundPrefix {
            property,
            value,
            prefix,
        },
        QNameError::Invalid(value) | QNameError::InvalidSuffix { value } => {
            IssueKind::InvalidQName { property, value }
        }
    }
}

fn parse_qname(
    property: &'static str,
    raw: &Value,
    namespaces: &Namespaces,
    lenient: bool,
) -> Result<QName, IssueKind> {
    let text = raw.as_str().ok_or_else(|| IssueKind::InvalidQName {
        property,
        value: short(raw),
    })?;
    let parsed = if lenient {
        QName::parse_lenient(text, namespaces)
    } else {
        QName::parse(text, namespaces)
    };
    parsed.map_err(|err| qname_issue(property, err))
}

/// Converts a scalar (non-object) property value.
fn convert_scalar(
    kind: ValueKind,
    property: &'static str,
    raw: &Value,
    namespaces: &Namespaces,
) -> Result<PropertyValue, IssueKind> {
    let invalid = |expected: &'static str| IssueKind::InvalidValue {
        property,
        value: short(raw),
        expected,
    };

    match kind {
        ValueKind::String => raw
            .as_str()
            .map(|s| PropertyValue::String(s.to_string()))
            .ok_or_else(|| invalid("string")),
        ValueKind::Number => raw
            .as_f64()
            .map(PropertyValue::Number)
            .ok_or_else(|| invalid("number")),
        ValueKind::Integer => raw
            .as_i64()
            .or_else(|| raw.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .map(PropertyValue::Integer)
            .ok_or_else(|| invalid("integer")),
        ValueKind::Boolean => raw
            .as_bool()
            .map(PropertyValue::Boolean)
            .ok_or_else(|| invalid("boolean")),
        ValueKind::Date => raw
            .as_str()
            .and_then(parse_date)
            .map(PropertyValue::Date)
            .ok_or_else(|| invalid("date")),
        ValueKind::Duration => raw
            .as_str()
            .and_then(XsdDuration::parse)
            .map(PropertyValue::Duration)
            .ok_or_else(|| invalid("duration")),
        ValueKind::QName => parse_qname(property, raw, namespaces, false).map(PropertyValue::QName),
        ValueKind::SQName => parse_qname(property, raw, namespaces, true).map(PropertyValue::QName),
        ValueKind::QNames | ValueKind::SQNames => {
            let items = raw.as_array().ok_or_else(|| invalid("list of QNames"))?;
            let lenient = kind == ValueKind::SQNames;
            items
                .iter()
                .map(|item| parse_qname(property, item, namespaces, lenient))
                .collect::<Result<Vec<_>, _>>()
                .map(PropertyValue::QNames)
        }
        ValueKind::Strings => {
            let items = raw.as_array().ok_or_else(|| invalid("list of strings"))?;
            items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(PropertyValue::Strings)
                .ok_or_else(|| invalid("list of strings"))
        }
        ValueKind::QNameMap => {
            let map = raw.as_object().ok_or_else(|| invalid("mapping"))?;
            convert_qname_map(property, map, namespaces).map(PropertyValue::QNameMap)
        }
        ValueKind::Any => Ok(PropertyValue::Any(raw.clone())),
        ValueKind::Object(_) | ValueKind::Objects(_) => Err(invalid("scalar")),
    }
}

/// Keys without a prefix name core dimensions in the `xbrl` namespace.
fn convert_qname_map(
    property: &'static str,
    map: &Map<String, Value>,
    namespaces: &Namespaces,
) -> Result<Vec<(QName, MapValue)>, IssueKind> {
    let mut entries = Vec::with_capacity(map.len());
    for (key, value) in map {
        let name = if key.contains(':') {
            QName::parse(key, namespaces).map_err(|err| qname_issue(property, err))?
        } else {
            QName::new(XBRL_NS, key.clone()).with_prefix("xbrl")
        };
        let value = match value {
            Value::String(text) => match QName::parse_lenient(text, namespaces) {
                Ok(q) => MapValue::QName(q),
                Err(_) => MapValue::Text(text.clone()),
            },
            Value::Null => MapValue::Text(String::new()),
            other => MapValue::Text(other.to_string()),
        };
        entries.push((name, value));
    }
    Ok(entries)
}
