//! Store abstraction.

use async_trait::async_trait;
use fieldwalk_core::{Dataset, FieldGroup, GroupKey, MeterIds, NewFieldGroup, Result, VisitStatus};

/// Keyed access to persisted field groups.
///
/// Every method is a single atomic step on the row it touches. Meter writes
/// are conditional on the meter ids the caller last read, so several
/// processes may append to the same group without losing ids. Implementations
/// must be shareable across tasks.
#[async_trait]
pub trait GroupStore: Send + Sync {
    /// Point lookup by `(dataset, postal_code)`.
    async fn get(&self, key: &GroupKey) -> Result<Option<FieldGroup>>;

    /// Inserts a new group and returns it with its assigned id.
    ///
    /// Fails with [`Error::Conflict`](fieldwalk_core::Error::Conflict) if the
    /// key is already taken.
    async fn insert(&self, group: NewFieldGroup) -> Result<FieldGroup>;

    /// Replaces the status of a group. Returns `None` if the key is unknown.
    async fn update_status(
        &self,
        key: &GroupKey,
        status: VisitStatus,
    ) -> Result<Option<FieldGroup>>;

    /// Replaces the meter ids of a group, provided they still equal
    /// `expected`. Returns `None` if the key is unknown.
    ///
    /// Fails with [`Error::Conflict`](fieldwalk_core::Error::Conflict) if
    /// another writer changed the meter ids since `expected` was read.
    async fn update_meters(
        &self,
        key: &GroupKey,
        expected: &MeterIds,
        meters: &MeterIds,
    ) -> Result<Option<FieldGroup>>;

    /// All groups of a dataset, oldest first.
    async fn list(&self, dataset: &Dataset) -> Result<Vec<FieldGroup>>;
}
