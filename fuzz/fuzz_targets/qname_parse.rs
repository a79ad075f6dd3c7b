//! Fuzz target for QName parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use oimtax::model::{Namespaces, QName};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let namespaces = Namespaces::new()
        .with("ex", "http://example.com/ex")
        .with("xbrl", "https://xbrl.org/2025");

    if let Ok(name) = QName::parse(text, &namespaces) {
        // Anything that parses must render back to an equal name.
        let rendered = name.to_string();
        let again = QName::parse(&rendered, &namespaces).expect("rendered qname parses");
        assert_eq!(name, again);
    }
    let _ = QName::parse_lenient(text, &namespaces);
});
