//! The typed taxonomy object graph.
//!
//! Objects live in an arena owned by [`TaxonomyModel`] and are addressed by
//! [`ObjectId`]. Cross-references between objects are stored as [`QName`]s
//! and resolved on demand through the named-object registry.
//!
//! # Design Principles
//!
//! 1. **Descriptor driven**: the shape of every [`ObjectKind`] is a static
//!    table of [`PropertyDescriptor`]s; there is exactly one generic builder.
//!
//! 2. **Permissive construction**: malformed values are reported and skipped
//!    rather than aborting the load, so validation sees as much of the
//!    taxonomy as possible.

mod duration;
mod ids;
pub mod io;
mod kind;
mod object;
mod period;
mod qname;
mod taxonomy;

pub use duration::XsdDuration;
pub use ids::ObjectId;
pub use kind::{DefaultValue, ObjectKind, PropertyDescriptor, Requirement, ValueKind};
pub use object::{MapValue, PropertyValue, TaxonomyObject};
pub use period::{
    end_of_day, parse_boundary, parse_date, parse_date_time, parse_month_day, start_of_day,
    FactPeriod, PeriodFormat, PeriodFormatError, PeriodPart, PeriodType,
};
pub use qname::{
    is_ncname, Namespaces, PeriodAnchor, QName, QNameError, ISO4217_NS, XBRLI_NS, XBRL_NS, XS_NS,
};
pub use taxonomy::TaxonomyModel;

/// Document type of a taxonomy document.
pub const TAXONOMY_DOCUMENT_TYPE: &str = "https://xbrl.org/2025/taxonomy";
/// Document type of a report document (a taxonomy plus facts).
pub const REPORT_DOCUMENT_TYPE: &str = "https://xbrl.org/2025/report";

/// The built-in vocabulary loaded once into every model.
pub(crate) const CORE_TAXONOMY: &str = include_str!("core_taxonomy.json");
