#![allow(dead_code)]

use std::fs;
use std::path::Path;

use oimtax::builder::{BuildOutcome, ImportResolver, NoImports, TaxonomyBuilder};
use oimtax::model::QName;
use serde_json::{json, Value};

pub const EX_NS: &str = "http://example.com/ex";
pub const BASE_NS: &str = "http://example.com/base";

pub fn ex(local: &str) -> QName {
    QName::new(EX_NS, local)
}

pub fn base(local: &str) -> QName {
    QName::new(BASE_NS, local)
}

/// Wraps a taxonomy body in a taxonomy document binding the usual prefixes.
pub fn taxonomy_document(taxonomy: Value) -> Value {
    json!({
        "documentInfo": {
            "documentType": "https://xbrl.org/2025/taxonomy",
            "namespaces": {
                "ex": EX_NS,
                "base": BASE_NS,
                "xbrl": "https://xbrl.org/2025",
                "xs": "http://www.w3.org/2001/XMLSchema"
            }
        },
        "taxonomy": taxonomy
    })
}

/// Like [`taxonomy_document`] but a report document carrying `facts`.
pub fn report_document(taxonomy: Value, facts: Value) -> Value {
    let mut doc = taxonomy_document(taxonomy);
    doc["documentInfo"]["documentType"] = json!("https://xbrl.org/2025/report");
    doc["facts"] = facts;
    doc
}

pub fn build(document: &Value) -> BuildOutcome {
    build_with(&NoImports, document)
}

pub fn build_with(resolver: &dyn ImportResolver, document: &Value) -> BuildOutcome {
    TaxonomyBuilder::new(resolver)
        .build(document, "test.json")
        .expect("document type is accepted")
}

pub fn write_json(path: &Path, value: &Value) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, serde_json::to_vec_pretty(value).expect("serialize json")).expect("write json file");
}
