//! The taxonomy model: object arena plus the two global indices.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use super::ids::ObjectId;
use super::kind::ObjectKind;
use super::object::{ObjectCache, PropertyValue, TaxonomyObject};
use super::period::parse_date;
use super::qname::{Namespaces, QName, XS_NS};

/// A fully built taxonomy (DTS): every object loaded from the user document,
/// its imports and the built-in core vocabulary.
#[derive(Debug, Default)]
pub struct TaxonomyModel {
    objects: Vec<TaxonomyObject>,
    named: HashMap<QName, ObjectId>,
    tags: HashMap<QName, Vec<ObjectId>>,
    taxonomies: Vec<ObjectId>,
    facts: Vec<ObjectId>,
    loaded: HashSet<String>,
    namespaces: Namespaces,
    core_loaded: bool,
    core_root: Option<ObjectId>,
    validated: AtomicBool,
}

impl TaxonomyModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ObjectId) -> Option<&TaxonomyObject> {
        self.objects.get(id.index()).filter(|o| !o.removed)
    }

    /// Returns the object for an id handed out by this model.
    ///
    /// # Panics
    /// Panics if `id` did not come from this model.
    pub fn object(&self, id: ObjectId) -> &TaxonomyObject {
        &self.objects[id.index()]
    }

    /// Looks a name up in the named-object registry. Context suffixes are
    /// ignored.
    pub fn lookup(&self, name: &QName) -> Option<&TaxonomyObject> {
        self.named.get(name).map(|id| self.object(*id))
    }

    /// Like [`lookup`](Self::lookup) but only returns objects of `kind`.
    pub fn lookup_kind(&self, name: &QName, kind: ObjectKind) -> Option<&TaxonomyObject> {
        self.lookup(name).filter(|o| o.kind == kind)
    }

    /// Tag objects (labels, references) annotating `name`, in load order.
    pub fn tagged(&self, name: &QName) -> impl Iterator<Item = &TaxonomyObject> {
        self.tags
            .get(name)
            .into_iter()
            .flatten()
            .map(|id| self.object(*id))
    }

    /// All live objects in arena (document) order.
    pub fn objects(&self) -> impl Iterator<Item = &TaxonomyObject> {
        self.objects.iter().filter(|o| !o.removed)
    }

    pub fn objects_of_kind(&self, kind: ObjectKind) -> impl Iterator<Item = &TaxonomyObject> {
        self.objects().filter(move |o| o.kind == kind)
    }

    /// Root taxonomy objects, in load order.
    pub fn taxonomies(&self) -> impl Iterator<Item = &TaxonomyObject> {
        self.taxonomies.iter().filter_map(|id| self.get(*id))
    }

    /// Facts from report documents, in document order.
    pub fn facts(&self) -> impl Iterator<Item = &TaxonomyObject> {
        self.facts.iter().filter_map(|id| self.get(*id))
    }

    /// Number of arena slots, including tombstoned objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn registry_len(&self) -> usize {
        self.named.len()
    }

    pub fn tag_index_len(&self) -> usize {
        self.tags.len()
    }

    /// Prefix bindings collected from every loaded document.
    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    pub fn is_loaded(&self, namespace: &str) -> bool {
        self.loaded.contains(namespace)
    }

    /// Marks a namespace loaded; returns false if it already was.
    pub fn mark_loaded(&mut self, namespace: &str) -> bool {
        self.loaded.insert(namespace.to_string())
    }

    pub fn is_core_loaded(&self) -> bool {
        self.core_loaded
    }

    pub(crate) fn set_core_loaded(&mut self, root: Option<ObjectId>) {
        self.core_loaded = true;
        self.core_root = root;
    }

    /// Root Taxonomy object of the built-in core vocabulary, if loaded.
    pub fn core_taxonomy(&self) -> Option<ObjectId> {
        self.core_root
    }

    pub fn is_validated(&self) -> bool {
        self.validated.load(Ordering::Acquire)
    }

    pub(crate) fn mark_validated(&self) {
        self.validated.store(true, Ordering::Release);
    }

    /// Forgets the validated state and every memoized relationship index,
    /// dimension resolution and fact period. Called after the model changes
    /// shape, since an extension or a removal alters what those caches hold.
    pub(crate) fn invalidate(&mut self) {
        self.validated.store(false, Ordering::Release);
        for obj in &mut self.objects {
            obj.cache = ObjectCache::default();
        }
    }

    pub(crate) fn merge_namespaces(&mut self, namespaces: &Namespaces) {
        self.namespaces.merge(namespaces);
    }

    pub(crate) fn allocate(
        &mut self,
        kind: ObjectKind,
        parent: Option<(ObjectId, &'static str)>,
        label: String,
    ) -> ObjectId {
        let id = ObjectId::new(self.objects.len());
        self.objects.push(TaxonomyObject::new(id, kind, parent, label));
        // Mutation invalidates any earlier validation.
        self.validated.store(false, Ordering::Release);
        id
    }

    pub(crate) fn set_properties(&mut self, id: ObjectId, properties: Vec<(&'static str, PropertyValue)>) {
        self.objects[id.index()].properties = properties;
    }

    pub(crate) fn push_taxonomy(&mut self, id: ObjectId) {
        self.taxonomies.push(id);
    }

    pub(crate) fn push_fact(&mut self, id: ObjectId) {
        self.facts.push(id);
    }

    /// Installs `id` under `name`. Returns the id already registered if the
    /// key is taken; the registry is left unchanged in that case.
    pub(crate) fn register_named(&mut self, name: QName, id: ObjectId) -> Result<(), ObjectId> {
        match self.named.get(&name) {
            Some(existing) => Err(*existing),
            None => {
                self.named.insert(name, id);
                Ok(())
            }
        }
    }

    pub(crate) fn register_tag(&mut self, name: QName, id: ObjectId) {
        let entry = self.tags.entry(name).or_default();
        if !entry.contains(&id) {
            entry.push(id);
        }
    }

    /// Tombstones an object and everything it owns, drops it from both
    /// indices and detaches it from its parent's collection.
    pub(crate) fn remove(&mut self, id: ObjectId) {
        let mut stack = vec![id];
        let mut removed = HashSet::new();
        while let Some(next) = stack.pop() {
            let obj = &mut self.objects[next.index()];
            if obj.removed {
                continue;
            }
            obj.removed = true;
            removed.insert(next);
            stack.extend(obj.owned());
        }

        self.named.retain(|_, v| !removed.contains(v));
        for ids in self.tags.values_mut() {
            ids.retain(|v| !removed.contains(v));
        }
        self.tags.retain(|_, ids| !ids.is_empty());
        self.facts.retain(|v| !removed.contains(v));

        if let Some((parent, property)) = self.objects[id.index()].parent {
            self.objects[parent.index()].detach_child(property, id);
        }
        self.invalidate();
    }

    /// Whether data type `name` is `base` or derives from it through
    /// `baseType`. Cycles end the walk.
    pub fn data_type_derives_from(&self, name: &QName, base: &QName) -> bool {
        let mut seen = HashSet::new();
        let mut current = Some(name);
        while let Some(q) = current {
            if q == base {
                return true;
            }
            if !seen.insert(q) {
                return false;
            }
            current = self
                .lookup_kind(q, ObjectKind::DataType)
                .and_then(|dt| dt.qname("baseType"));
        }
        false
    }

    /// Whether `text` is a valid lexical value of `data_type`. Only the
    /// boolean, numeric and date families are checked; any other type
    /// accepts every string.
    pub fn lexical_conforms(&self, data_type: &QName, text: &str) -> bool {
        let xs = |local: &str| QName::new(XS_NS, local);
        let text = text.trim();
        if self.data_type_derives_from(data_type, &xs("boolean")) {
            matches!(text, "true" | "false" | "1" | "0")
        } else if self.data_type_derives_from(data_type, &xs("integer")) {
            text.parse::<i64>().is_ok()
        } else if self.data_type_derives_from(data_type, &xs("decimal"))
            || self.data_type_derives_from(data_type, &xs("float"))
            || self.data_type_derives_from(data_type, &xs("double"))
        {
            !text.is_empty()
                && !text.contains(['e', 'E'])
                && text.parse::<f64>().is_ok_and(f64::is_finite)
        } else if self.data_type_derives_from(data_type, &xs("date")) {
            parse_date(text).is_some()
        } else {
            true
        }
    }

    /// Display identity of an object.
    pub fn label_of(&self, id: ObjectId) -> &str {
        &self.objects[id.index()].label
    }
}
