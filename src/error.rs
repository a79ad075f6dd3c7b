use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ValidationReport;

/// The main error type for oimtax operations.
///
/// Data-quality problems in a taxonomy never surface here; they are
/// collected as diagnostics in a [`ValidationReport`]. This type covers
/// I/O, unreadable input files and API contract violations.
#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON document {path}: {source}")]
    JsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse YAML document {path}: {source}")]
    YamlParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Unsupported document type: {found}")]
    UnsupportedDocumentType { found: String },

    #[error("No document is available at {location}")]
    MissingDocument { location: String },

    #[error("Built-in core taxonomy is malformed: {0}")]
    CoreTaxonomy(#[source] serde_json::Error),

    #[error("Taxonomy model has not been validated; run validation before resolving cubes")]
    NotValidated,

    #[error("Object {0} is not a fact")]
    NotAFact(String),

    #[error("Validation failed with {error_count} error(s) and {warning_count} warning(s)")]
    ValidationFailed {
        error_count: usize,
        warning_count: usize,
        report: ValidationReport,
    },

    #[error("Failed to serialize report: {0}")]
    ReportSerialize(#[source] serde_json::Error),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}
