//! Dataset and group-key identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::GeoResult;

/// Prefix for keys synthesized from coordinates when no postal code is known.
pub const FALLBACK_KEY_PREFIX: &str = "LOC_";

/// A tenant/ownership partition under which groups and subscriptions live.
///
/// # Examples
///
/// ```
/// use fieldwalk_core::Dataset;
///
/// let ds = Dataset::new("daejeon-north");
/// assert_eq!(ds.as_str(), "daejeon-north");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset(String);

impl Dataset {
    /// Creates a dataset identifier.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self(name.into())
    }

    /// Returns the dataset name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Dataset {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Dataset {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifies at most one [`FieldGroup`](super::FieldGroup): `(dataset, postal_code)`.
///
/// `postal_code` is either the provider's postal code or a coordinate
/// bucket key produced by [`fallback_postal_code`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupKey {
    /// Owning dataset
    pub dataset: Dataset,
    /// Postal code or synthesized fallback key
    pub postal_code: String,
}

impl GroupKey {
    /// Creates a key from its parts.
    pub fn new(dataset: Dataset, postal_code: impl Into<String>) -> Self {
        Self {
            dataset,
            postal_code: postal_code.into(),
        }
    }

    /// Derives the group key for a geocode result.
    ///
    /// Uses the provider's postal code when present, otherwise a key
    /// bucketed on the coordinate rounded to four decimals (about 10m).
    pub fn derive(dataset: &Dataset, geo: &GeoResult) -> Self {
        let postal_code = match geo.postal_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => code.to_string(),
            _ => fallback_postal_code(geo.x, geo.y),
        };
        Self::new(dataset.clone(), postal_code)
    }

    /// Returns `true` if the key was synthesized from coordinates.
    pub fn is_fallback(&self) -> bool {
        self.postal_code.starts_with(FALLBACK_KEY_PREFIX)
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.dataset, self.postal_code)
    }
}

/// Synthesizes a group key from a coordinate.
///
/// The decimal formatter rounds from the exact binary value, so inputs that
/// differ below the fourth decimal land in the same bucket.
///
/// # Examples
///
/// ```
/// use fieldwalk_core::types::fallback_postal_code;
///
/// assert_eq!(fallback_postal_code(37.12345, 127.98765), "LOC_37.1234_127.9877");
/// assert_eq!(fallback_postal_code(37.123449, 127.987651), "LOC_37.1234_127.9877");
/// ```
pub fn fallback_postal_code(x: f64, y: f64) -> String {
    format!(
        "{FALLBACK_KEY_PREFIX}{}_{}",
        format_bucket(x),
        format_bucket(y)
    )
}

fn format_bucket(v: f64) -> String {
    let s = format!("{v:.4}");
    // -0.00001 would otherwise print as "-0.0000" and split the bucket at zero
    if s == "-0.0000" { "0.0000".to_string() } else { s }
}
