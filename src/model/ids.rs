//! Newtype IDs for objects held in the taxonomy arena.
//!
//! Objects never point at each other directly. Owned collections hold
//! [`ObjectId`]s and cross-references hold QNames that are resolved through
//! the registry, so the graph has no ownership cycles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of an object in the [`TaxonomyModel`](super::TaxonomyModel) arena.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub usize);

impl ObjectId {
    /// Creates a new ObjectId.
    #[inline]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the arena index.
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<usize> for ObjectId {
    fn from(index: usize) -> Self {
        ObjectId::new(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_equality() {
        assert_eq!(ObjectId(1), ObjectId(1));
        assert_ne!(ObjectId(1), ObjectId(2));
    }

    #[test]
    fn test_id_ordering() {
        assert!(ObjectId(1) < ObjectId(2));
        assert_eq!(ObjectId::from(7).index(), 7);
    }

    #[test]
    fn test_id_display() {
        assert_eq!(ObjectId(3).to_string(), "#3");
        assert_eq!(format!("{:?}", ObjectId(3)), "ObjectId(3)");
    }
}
