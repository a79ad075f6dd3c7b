//! Namespace to document resolution for taxonomy imports.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::TaxonomyError;
use crate::model::io::{read_document, DocumentFormat};
use crate::model::{Namespaces, QName};

/// Supplies imported taxonomies to the builder.
///
/// The builder never performs I/O itself: it asks for the location of a
/// namespace and then for the materialized document at that location.
pub trait ImportResolver {
    /// Location of the taxonomy defining `namespace`, or `None` if unknown.
    fn locate(&self, namespace: &str) -> Option<String>;

    /// The parsed document at `location`.
    fn fetch(&self, location: &str) -> Result<Value, TaxonomyError>;
}

/// Resolver that knows no taxonomies. Every import is reported unresolvable.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoImports;

impl ImportResolver for NoImports {
    fn locate(&self, _namespace: &str) -> Option<String> {
        None
    }

    fn fetch(&self, location: &str) -> Result<Value, TaxonomyError> {
        Err(TaxonomyError::MissingDocument {
            location: location.to_string(),
        })
    }
}

/// In-memory set of taxonomy documents keyed by the namespace of their
/// taxonomy name.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    locations: HashMap<String, String>,
    documents: HashMap<String, Value>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a document under an explicit namespace and location.
    pub fn insert(&mut self, namespace: impl Into<String>, location: impl Into<String>, document: Value) {
        let location = location.into();
        self.locations.insert(namespace.into(), location.clone());
        self.documents.insert(location, document);
    }

    /// Builder-style insert that derives the namespace from the document's
    /// taxonomy name. Documents without a resolvable name are ignored.
    pub fn with_document(mut self, location: impl Into<String>, document: Value) -> Self {
        let location = location.into();
        match taxonomy_namespace(&document) {
            Some(namespace) => self.insert(namespace, location, document),
            None => warn!(%location, "catalog document has no taxonomy name; ignored"),
        }
        self
    }

    /// Scans `dir` recursively for `.json`, `.yaml` and `.yml` documents.
    /// Files that fail to parse are skipped with a warning.
    pub fn from_dir(dir: &Path) -> Result<Self, TaxonomyError> {
        let mut catalog = Self::new();
        for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            let path = entry.path();
            if !entry.file_type().is_file() || !has_document_extension(path) {
                continue;
            }
            match read_document(path, Some(DocumentFormat::from_path(path))) {
                Ok(document) => {
                    debug!(path = %path.display(), "catalog document");
                    catalog = catalog.with_document(path.display().to_string(), document);
                }
                Err(err) => warn!(path = %path.display(), error = %err, "skipping unreadable catalog document"),
            }
        }
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

impl ImportResolver for Catalog {
    fn locate(&self, namespace: &str) -> Option<String> {
        self.locations.get(namespace).cloned()
    }

    fn fetch(&self, location: &str) -> Result<Value, TaxonomyError> {
        self.documents
            .get(location)
            .cloned()
            .ok_or_else(|| TaxonomyError::MissingDocument {
                location: location.to_string(),
            })
    }
}

fn has_document_extension(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };
    ["json", "yaml", "yml"]
        .iter()
        .any(|allowed| ext.eq_ignore_ascii_case(allowed))
}

/// Prefix bindings declared in a document's `documentInfo`.
pub fn document_namespaces(document: &Value) -> Namespaces {
    let mut namespaces = Namespaces::new();
    if let Some(map) = document
        .pointer("/documentInfo/namespaces")
        .and_then(Value::as_object)
    {
        for (prefix, ns) in map {
            if let Some(ns) = ns.as_str() {
                namespaces.bind(prefix.clone(), ns);
            }
        }
    }
    namespaces
}

/// Namespace of the document's taxonomy name, read without building.
pub fn taxonomy_namespace(document: &Value) -> Option<String> {
    let name = document.pointer("/taxonomy/name")?.as_str()?;
    QName::parse(name, &document_namespaces(document))
        .ok()
        .map(|q| q.namespace().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    fn doc(ns: &str) -> Value {
        json!({
            "documentInfo": {
                "documentType": "https://xbrl.org/2025/taxonomy",
                "namespaces": {"base": ns}
            },
            "taxonomy": {"name": "base:Base"}
        })
    }

    #[test]
    fn test_taxonomy_namespace() {
        assert_eq!(
            taxonomy_namespace(&doc("http://example.com/base")).as_deref(),
            Some("http://example.com/base")
        );
        assert_eq!(taxonomy_namespace(&json!({"taxonomy": {}})), None);
    }

    #[test]
    fn test_catalog_locate_and_fetch() {
        let catalog = Catalog::new().with_document("base.json", doc("http://example.com/base"));
        assert_eq!(
            catalog.locate("http://example.com/base").as_deref(),
            Some("base.json")
        );
        assert!(catalog.fetch("base.json").is_ok());
        assert!(matches!(
            catalog.fetch("other.json"),
            Err(TaxonomyError::MissingDocument { .. })
        ));
        assert_eq!(NoImports.locate("http://example.com/base"), None);
    }

    #[test]
    fn test_catalog_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("base.json"),
            serde_json::to_string(&doc("http://example.com/base")).unwrap(),
        )
        .unwrap();
        fs::write(
            dir.path().join("other.yaml"),
            "documentInfo:\n  namespaces:\n    o: http://example.com/other\ntaxonomy:\n  name: o:Other\n",
        )
        .unwrap();
        fs::write(dir.path().join("broken.json"), "{").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let catalog = Catalog::from_dir(dir.path()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.locate("http://example.com/other").is_some());
    }
}
