//! Reading taxonomy documents into the generic input tree.
//!
//! Documents are JSON or YAML; both are read into a [`serde_json::Value`] so
//! the builder has a single input representation. Map key order is kept.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde_json::Value;

use crate::error::TaxonomyError;

/// On-disk syntax of a taxonomy document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Guesses the format from the file extension; anything that is not
    /// `.yaml`/`.yml` is treated as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => DocumentFormat::Yaml,
            _ => DocumentFormat::Json,
        }
    }

    /// Parses a CLI format name. `auto` yields `None`.
    pub fn parse(name: &str) -> Result<Option<Self>, TaxonomyError> {
        match name {
            "auto" => Ok(None),
            "json" => Ok(Some(DocumentFormat::Json)),
            "yaml" | "yml" => Ok(Some(DocumentFormat::Yaml)),
            other => Err(TaxonomyError::UnsupportedFormat(format!(
                "'{}' (supported: auto, json, yaml)",
                other
            ))),
        }
    }
}

/// Reads a document from disk.
///
/// # Errors
/// Returns an error if the file cannot be opened or is not well-formed.
pub fn read_document(path: &Path, format: Option<DocumentFormat>) -> Result<Value, TaxonomyError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    match format.unwrap_or_else(|| DocumentFormat::from_path(path)) {
        DocumentFormat::Json => {
            serde_json::from_reader(reader).map_err(|source| TaxonomyError::JsonParse {
                path: path.to_path_buf(),
                source,
            })
        }
        DocumentFormat::Yaml => {
            serde_yaml::from_reader(reader).map_err(|source| TaxonomyError::YamlParse {
                path: path.to_path_buf(),
                source,
            })
        }
    }
}

/// Parses a JSON document held in memory.
pub fn from_json_str(json: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(json)
}

/// Parses a YAML document held in memory.
pub fn from_yaml_str(yaml: &str) -> Result<Value, serde_yaml::Error> {
    serde_yaml::from_str(yaml)
}

/// Parses raw bytes as JSON, falling back to YAML.
pub fn from_document_slice(bytes: &[u8]) -> Result<Value, TaxonomyError> {
    match serde_json::from_slice(bytes) {
        Ok(value) => Ok(value),
        Err(json_err) => serde_yaml::from_slice(bytes).map_err(|_| TaxonomyError::JsonParse {
            path: "<memory>".into(),
            source: json_err,
        }),
    }
}
