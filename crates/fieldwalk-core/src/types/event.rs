//! Status-change events delivered to live subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Dataset, FieldGroup, VisitStatus};

/// A committed status change for one field group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEvent {
    /// Dataset the group belongs to
    pub dataset: Dataset,
    /// Store id of the group
    pub group_id: i64,
    /// Group key within the dataset
    pub postal_code: String,
    /// The status now stored
    pub status: VisitStatus,
    /// When the change was committed
    pub occurred_at: DateTime<Utc>,
}

impl StatusEvent {
    /// Builds the event describing a group's stored status.
    pub fn committed(group: &FieldGroup) -> Self {
        Self {
            dataset: group.dataset.clone(),
            group_id: group.id,
            postal_code: group.postal_code.clone(),
            status: group.status,
            occurred_at: Utc::now(),
        }
    }
}
