//! Qualified names, the universal cross-reference key of the model.
//!
//! Identity is `(namespace, local)`. The prefix is kept only for display and
//! the optional `@start`/`@end` context suffix never takes part in equality,
//! hashing or ordering, so a suffixed name finds the same registry entry as
//! the bare one.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Namespace of the OIM taxonomy vocabulary (core dimensions, object types).
pub const XBRL_NS: &str = "https://xbrl.org/2025";
/// XML Schema namespace, home of the primitive data types.
pub const XS_NS: &str = "http://www.w3.org/2001/XMLSchema";
/// XBRL 2.1 instance namespace (item types, `pure`, `shares`).
pub const XBRLI_NS: &str = "http://www.xbrl.org/2003/instance";
/// ISO 4217 currency namespace used by the built-in unit registry.
pub const ISO4217_NS: &str = "http://www.xbrl.org/2003/iso4217";

/// Which boundary of a period a name refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodAnchor {
    Start,
    End,
}

impl PeriodAnchor {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodAnchor::Start => "start",
            PeriodAnchor::End => "end",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "start" => Some(PeriodAnchor::Start),
            "end" => Some(PeriodAnchor::End),
            _ => None,
        }
    }
}

/// Errors produced when a `prefix:local` string cannot become a [`QName`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum QNameError {
    #[error("prefix '{prefix}' in '{value}' is not bound to a namespace")]
    UnboundPrefix { value: String, prefix: String },

    #[error("'{0}' is not a valid QName")]
    Invalid(String),

    #[error("'{value}' has an invalid context suffix (expected @start or @end)")]
    InvalidSuffix { value: String },
}

/// Prefix to namespace bindings declared by a document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Namespaces {
    by_prefix: BTreeMap<String, String>,
}

impl Namespaces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `prefix` to `namespace`, replacing any earlier binding.
    pub fn bind(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        self.by_prefix.insert(prefix.into(), namespace.into());
    }

    /// Builder-style [`bind`](Self::bind).
    pub fn with(mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.bind(prefix, namespace);
        self
    }

    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        self.by_prefix.get(prefix).map(String::as_str)
    }

    /// First prefix (in prefix order) bound to `namespace`.
    pub fn prefix_for(&self, namespace: &str) -> Option<&str> {
        self.by_prefix
            .iter()
            .find(|(_, ns)| ns.as_str() == namespace)
            .map(|(prefix, _)| prefix.as_str())
    }

    /// Adds bindings from `other` without overriding prefixes already bound here.
    pub fn merge(&mut self, other: &Namespaces) {
        for (prefix, namespace) in &other.by_prefix {
            self.by_prefix
                .entry(prefix.clone())
                .or_insert_with(|| namespace.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.by_prefix
            .iter()
            .map(|(prefix, ns)| (prefix.as_str(), ns.as_str()))
    }

    pub fn len(&self) -> usize {
        self.by_prefix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_prefix.is_empty()
    }
}

/// A namespace-qualified name.
#[derive(Clone, Debug)]
pub struct QName {
    namespace: String,
    local: String,
    prefix: Option<String>,
    anchor: Option<PeriodAnchor>,
}

impl QName {
    /// Creates a name directly from its namespace and local part.
    pub fn new(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local: local.into(),
            prefix: None,
            anchor: None,
        }
    }

    /// Shorthand for a name in the [`XBRL_NS`] vocabulary.
    pub fn xbrl(local: impl Into<String>) -> Self {
        Self::new(XBRL_NS, local).with_prefix("xbrl")
    }

    /// Parses `prefix:local[@start|@end]` where `local` must be an NCName.
    pub fn parse(text: &str, namespaces: &Namespaces) -> Result<Self, QNameError> {
        Self::parse_with(text, namespaces, true)
    }

    /// Parses an SQName: like [`parse`](Self::parse) but the local part may be
    /// any run of non-whitespace characters (entity identifiers, unit codes).
    pub fn parse_lenient(text: &str, namespaces: &Namespaces) -> Result<Self, QNameError> {
        Self::parse_with(text, namespaces, false)
    }

    fn parse_with(text: &str, namespaces: &Namespaces, strict: bool) -> Result<Self, QNameError> {
        // An SQName local part may itself contain '@'; only a trailing
        // @start or @end is a context suffix there.
        let (body, anchor) = match text.rsplit_once('@') {
            Some((body, suffix)) => match PeriodAnchor::parse(suffix) {
                Some(anchor) => (body, Some(anchor)),
                None if strict => {
                    return Err(QNameError::InvalidSuffix {
                        value: text.to_string(),
                    })
                }
                None => (text, None),
            },
            None => (text, None),
        };

        let (prefix, local) = body
            .split_once(':')
            .ok_or_else(|| QNameError::Invalid(text.to_string()))?;

        let local_ok = if strict {
            is_ncname(local)
        } else {
            !local.is_empty() && !local.chars().any(char::is_whitespace)
        };
        if !is_ncname(prefix) || !local_ok {
            return Err(QNameError::Invalid(text.to_string()));
        }

        let namespace = namespaces
            .resolve(prefix)
            .ok_or_else(|| QNameError::UnboundPrefix {
                value: text.to_string(),
                prefix: prefix.to_string(),
            })?;

        Ok(Self {
            namespace: namespace.to_string(),
            local: local.to_string(),
            prefix: Some(prefix.to_string()),
            anchor,
        })
    }

    /// Sets the display prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Attaches a context suffix.
    pub fn with_anchor(mut self, anchor: PeriodAnchor) -> Self {
        self.anchor = Some(anchor);
        self
    }

    /// Returns a copy with the context suffix stripped.
    pub fn without_anchor(&self) -> Self {
        Self {
            anchor: None,
            ..self.clone()
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn local_name(&self) -> &str {
        &self.local
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn anchor(&self) -> Option<PeriodAnchor> {
        self.anchor
    }

    /// The context suffix, defaulting to `@end` when none was written.
    pub fn anchor_or_default(&self) -> PeriodAnchor {
        self.anchor.unwrap_or(PeriodAnchor::End)
    }

    /// Clark notation: `{namespace}local`.
    pub fn clark(&self) -> String {
        format!("{{{}}}{}", self.namespace, self.local)
    }

    pub fn is_xbrl(&self, local: &str) -> bool {
        self.namespace == XBRL_NS && self.local == local
    }
}

/// Returns true if `text` is a non-colonized XML name.
pub fn is_ncname(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.namespace == other.namespace && self.local == other.local
    }
}

impl Eq for QName {}

impl Hash for QName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.namespace.hash(state);
        self.local.hash(state);
    }
}

impl PartialOrd for QName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QName {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.namespace.as_str(), self.local.as_str())
            .cmp(&(other.namespace.as_str(), other.local.as_str()))
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{}:{}", prefix, self.local)?,
            None => write!(f, "{{{}}}{}", self.namespace, self.local)?,
        }
        if let Some(anchor) = self.anchor {
            write!(f, "@{}", anchor.as_str())?;
        }
        Ok(())
    }
}

impl Serialize for QName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn ns() -> Namespaces {
        Namespaces::new()
            .with("ex", "http://example.com/tax")
            .with("xbrl", XBRL_NS)
    }

    #[test]
    fn test_parse_basic() {
        let q = QName::parse("ex:Revenue", &ns()).unwrap();
        assert_eq!(q.namespace(), "http://example.com/tax");
        assert_eq!(q.local_name(), "Revenue");
        assert_eq!(q.prefix(), Some("ex"));
        assert_eq!(q.anchor(), None);
        assert_eq!(q.to_string(), "ex:Revenue");
    }

    #[test]
    fn test_parse_unbound_prefix() {
        let err = QName::parse("zz:Revenue", &ns()).unwrap_err();
        assert_eq!(
            err,
            QNameError::UnboundPrefix {
                value: "zz:Revenue".into(),
                prefix: "zz".into()
            }
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            QName::parse("Revenue", &ns()),
            Err(QNameError::Invalid(_))
        ));
        assert!(matches!(
            QName::parse("ex:1abc", &ns()),
            Err(QNameError::Invalid(_))
        ));
        assert!(matches!(
            QName::parse("ex:", &ns()),
            Err(QNameError::Invalid(_))
        ));
        assert!(matches!(
            QName::parse("ex:Revenue@middle", &ns()),
            Err(QNameError::InvalidSuffix { .. })
        ));
    }

    #[test]
    fn test_lenient_accepts_identifiers() {
        let q = QName::parse_lenient("ex:5493001KJTIIGC8Y1R12", &ns()).unwrap();
        assert_eq!(q.local_name(), "5493001KJTIIGC8Y1R12");
        assert!(QName::parse("ex:5493001KJTIIGC8Y1R12", &ns()).is_err());
        assert!(QName::parse_lenient("ex:has space", &ns()).is_err());
    }

    #[test]
    fn test_lenient_keeps_at_sign_in_local_part() {
        let q = QName::parse_lenient("ex:user@example.com", &ns()).unwrap();
        assert_eq!(q.local_name(), "user@example.com");
        assert_eq!(q.anchor(), None);
        assert_eq!(q.to_string(), "ex:user@example.com");

        let anchored = QName::parse_lenient("ex:user@example.com@end", &ns()).unwrap();
        assert_eq!(anchored.local_name(), "user@example.com");
        assert_eq!(anchored.anchor(), Some(PeriodAnchor::End));
        assert_eq!(anchored, q);
    }

    #[test]
    fn test_anchor_ignored_for_identity() {
        let bare = QName::parse("ex:Revenue", &ns()).unwrap();
        let start = QName::parse("ex:Revenue@start", &ns()).unwrap();
        assert_eq!(start.anchor(), Some(PeriodAnchor::Start));
        assert_eq!(bare, start);

        let mut set = HashSet::new();
        set.insert(bare.clone());
        assert!(set.contains(&start));
        assert_eq!(bare.anchor_or_default(), PeriodAnchor::End);
        assert_eq!(start.without_anchor().anchor(), None);
    }

    #[test]
    fn test_prefix_ignored_for_identity() {
        let a = QName::new("http://example.com/tax", "Revenue");
        let b = a.clone().with_prefix("other");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "{http://example.com/tax}Revenue");
        assert_eq!(b.to_string(), "other:Revenue");
    }

    #[test]
    fn test_ordering_by_namespace_then_local() {
        let a = QName::new("a", "z");
        let b = QName::new("b", "a");
        assert!(a < b);
        assert!(QName::new("a", "a") < a);
    }

    #[test]
    fn test_namespaces_merge_keeps_existing() {
        let mut base = Namespaces::new().with("ex", "one");
        base.merge(&Namespaces::new().with("ex", "two").with("other", "three"));
        assert_eq!(base.resolve("ex"), Some("one"));
        assert_eq!(base.resolve("other"), Some("three"));
        assert_eq!(base.prefix_for("three"), Some("other"));
    }
}
