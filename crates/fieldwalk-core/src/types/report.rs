//! Per-batch ingestion report.

use serde::{Deserialize, Serialize};

use super::ResolutionFailure;

/// A row that resolved but could not be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    /// Address of the row
    pub address: String,
    /// Equipment id of the row
    pub meter_id: String,
    /// Store error message
    pub message: String,
}

/// Outcome of one ingestion batch.
///
/// Every normalized row lands in exactly one bucket:
/// `rows_seen == groups_created + groups_updated + unchanged + failures.len() + row_errors.len()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Normalized rows processed
    pub rows_seen: usize,
    /// Rows that created a new group
    pub groups_created: usize,
    /// Rows that added a meter id to an existing group
    pub groups_updated: usize,
    /// Rows whose meter id was already in its group
    pub unchanged: usize,
    /// Rows skipped because the address did not resolve
    pub failures: Vec<ResolutionFailure>,
    /// Rows skipped because the store rejected the write
    pub row_errors: Vec<RowError>,
}

impl IngestReport {
    /// Groups created or updated by the batch.
    pub fn groups_touched(&self) -> usize {
        self.groups_created + self.groups_updated
    }

    /// Rows that did not make it into a group.
    pub fn rows_skipped(&self) -> usize {
        self.failures.len() + self.row_errors.len()
    }
}
