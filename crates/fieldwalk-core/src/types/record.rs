//! Ingestion-side records: normalized rows, geocode results, and row failures.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One normalized row of an uploaded table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Free-text address, trimmed and non-empty
    pub address: String,
    /// Equipment identifier, trimmed and non-empty
    pub meter_id: String,
}

impl RawRecord {
    /// Creates a record.
    pub fn new(address: impl Into<String>, meter_id: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            meter_id: meter_id.into(),
        }
    }
}

/// A successful geocode lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoResult {
    /// Longitude
    pub x: f64,
    /// Latitude
    pub y: f64,
    /// Postal code, if the provider reported one
    pub postal_code: Option<String>,
}

/// Why an address could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ResolutionCause {
    /// The provider did not answer in time.
    Timeout,
    /// The request never completed (DNS, TLS, connection reset, ...).
    Transport(String),
    /// The provider answered with a non-2xx status.
    Status(u16),
    /// The provider answered but found no candidate.
    NoCandidates,
    /// The response body could not be interpreted.
    Malformed(String),
}

impl fmt::Display for ResolutionCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timed out"),
            Self::Transport(msg) => write!(f, "transport failure: {msg}"),
            Self::Status(code) => write!(f, "provider returned HTTP {code}"),
            Self::NoCandidates => write!(f, "no candidates"),
            Self::Malformed(msg) => write!(f, "malformed response: {msg}"),
        }
    }
}

/// An address the geocoder could not resolve. The row is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionFailure {
    /// The offending address
    pub address: String,
    /// What went wrong
    pub cause: ResolutionCause,
}

impl ResolutionFailure {
    /// Creates a failure for an address.
    pub fn new(address: impl Into<String>, cause: ResolutionCause) -> Self {
        Self {
            address: address.into(),
            cause,
        }
    }
}

impl fmt::Display for ResolutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not resolve '{}': {}", self.address, self.cause)
    }
}

impl std::error::Error for ResolutionFailure {}
