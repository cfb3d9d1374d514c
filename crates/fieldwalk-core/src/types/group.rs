//! The persisted unit of work.

use serde::{Deserialize, Serialize};

use super::{Dataset, GroupKey, MeterIds, VisitStatus};

/// All field-visit rows that share one `(dataset, postal_code)` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldGroup {
    /// Store-assigned identifier
    pub id: i64,
    /// Owning dataset
    pub dataset: Dataset,
    /// Postal code or synthesized fallback key
    pub postal_code: String,
    /// Representative address; the first one seen for the key
    pub address: String,
    /// Equipment identifiers in the group
    pub meter_ids: MeterIds,
    /// Longitude of the representative address
    pub x: f64,
    /// Latitude of the representative address
    pub y: f64,
    /// Current visit state
    pub status: VisitStatus,
}

impl FieldGroup {
    /// The group's key.
    pub fn key(&self) -> GroupKey {
        GroupKey::new(self.dataset.clone(), self.postal_code.clone())
    }
}

/// A group that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFieldGroup {
    /// Owning dataset
    pub dataset: Dataset,
    /// Postal code or synthesized fallback key
    pub postal_code: String,
    /// Representative address
    pub address: String,
    /// Initial equipment identifiers; never empty
    pub meter_ids: MeterIds,
    /// Longitude
    pub x: f64,
    /// Latitude
    pub y: f64,
    /// Initial visit state
    pub status: VisitStatus,
}

impl NewFieldGroup {
    /// The key the group will be stored under.
    pub fn key(&self) -> GroupKey {
        GroupKey::new(self.dataset.clone(), self.postal_code.clone())
    }

    /// Attaches a store-assigned id.
    pub fn with_id(self, id: i64) -> FieldGroup {
        FieldGroup {
            id,
            dataset: self.dataset,
            postal_code: self.postal_code,
            address: self.address,
            meter_ids: self.meter_ids,
            x: self.x,
            y: self.y,
            status: self.status,
        }
    }
}
