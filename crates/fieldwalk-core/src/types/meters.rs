//! Ordered set of equipment identifiers.

use serde::{Deserialize, Deserializer, Serialize};

/// Equipment identifiers attached to one field group.
///
/// Keeps first-insertion order and never holds duplicates or blank ids.
/// Groups are small (a handful of meters per building), so membership is a
/// linear scan.
///
/// # Examples
///
/// ```
/// use fieldwalk_core::MeterIds;
///
/// let mut ids = MeterIds::single("M-1");
/// assert!(ids.insert("M-2"));
/// assert!(!ids.insert("M-1"));
/// assert_eq!(ids.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MeterIds(Vec<String>);

impl MeterIds {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Creates a set holding one id.
    pub fn single(id: impl Into<String>) -> Self {
        let mut ids = Self::new();
        ids.insert(id);
        ids
    }

    /// Adds an id. Returns `false` if it was already present or blank.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        let id = id.trim();
        if id.is_empty() || self.contains(id) {
            return false;
        }
        self.0.push(id.to_string());
        true
    }

    /// Returns `true` if the id is present.
    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|m| m == id)
    }

    /// Number of ids.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates ids in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Ids as a slice, in insertion order.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl<S: Into<String>> FromIterator<S> for MeterIds {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut ids = Self::new();
        for id in iter {
            ids.insert(id);
        }
        ids
    }
}

impl<'de> Deserialize<'de> for MeterIds {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        Ok(raw.into_iter().collect())
    }
}

impl IntoIterator for MeterIds {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
