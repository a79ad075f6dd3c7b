//! Fuzz target for the document loader.
//!
//! Arbitrary bytes are parsed as JSON or YAML, built into a model and
//! validated. Malformed input must surface as diagnostics or an error,
//! never as a panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use oimtax::builder::{NoImports, TaxonomyBuilder};
use oimtax::model::io::from_document_slice;
use oimtax::validation::{validate_taxonomy, ValidateOptions};

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    let Ok(document) = from_document_slice(data) else {
        return;
    };
    if let Ok(outcome) = TaxonomyBuilder::new(&NoImports).build(&document, "fuzz.json") {
        let _ = validate_taxonomy(&outcome.model, &ValidateOptions::default());
    }
});
