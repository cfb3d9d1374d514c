//! Merging resolved records into postal-code groups.

use std::sync::Arc;

use fieldwalk_core::{
    Error, FieldGroup, GeoResult, GroupKey, MeterIds, NewFieldGroup, RawRecord, RequestContext,
    Result, VisitStatus,
};
use fieldwalk_store::GroupStore;
use serde::{Deserialize, Serialize};

use crate::locks::KeyedLocks;

/// Conditional meter writes tried per record before giving up. Every lost
/// attempt means another writer committed, so this only runs out under
/// sustained contention from outside the process.
pub const MAX_APPEND_ATTEMPTS: usize = 32;

/// What a merge did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeOutcome {
    /// A new group was inserted.
    Created,
    /// The meter id was added to an existing group.
    Appended,
    /// The meter id was already in the group.
    Unchanged,
}

/// Result of one reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    /// The group as stored after the merge
    pub group: FieldGroup,
    /// What the merge did
    pub outcome: MergeOutcome,
}

/// Owns the merge rules for field groups.
///
/// - One group per `(dataset, postal_code)`.
/// - Meter ids within a group are unique; re-ingesting one is a no-op.
/// - The representative address and coordinate are the first ones seen.
///
/// The lookup-then-write sequence for a key runs under that key's lock.
/// Writers in other processes are handled by the store's conditional meter
/// update: a lost race re-reads the group and merges again.
pub struct Reconciler {
    store: Arc<dyn GroupStore>,
    locks: KeyedLocks<GroupKey>,
}

impl Reconciler {
    /// Creates a reconciler over a store.
    pub fn new(store: Arc<dyn GroupStore>) -> Self {
        Self {
            store,
            locks: KeyedLocks::new(),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn GroupStore> {
        &self.store
    }

    /// Merges a resolved record into its group.
    pub async fn reconcile(
        &self,
        ctx: &RequestContext,
        record: &RawRecord,
        geo: &GeoResult,
    ) -> Result<Reconciled> {
        let meter_id = record.meter_id.trim();
        if meter_id.is_empty() {
            return Err(Error::validation_field("meter_id", "equipment id must not be blank"));
        }

        let key = GroupKey::derive(&ctx.dataset, geo);
        let _guard = self.locks.lock(&key).await;

        let reconciled = match self.store.get(&key).await? {
            Some(existing) => self.append(&key, existing, meter_id).await?,
            None => {
                let new_group = NewFieldGroup {
                    dataset: key.dataset.clone(),
                    postal_code: key.postal_code.clone(),
                    address: record.address.trim().to_string(),
                    meter_ids: MeterIds::single(meter_id),
                    x: geo.x,
                    y: geo.y,
                    status: VisitStatus::Unvisited,
                };
                match self.store.insert(new_group).await {
                    Ok(group) => Reconciled {
                        group,
                        outcome: MergeOutcome::Created,
                    },
                    // Another writer outside this process got there first.
                    Err(Error::Conflict { .. }) => {
                        let existing = self.store.get(&key).await?.ok_or_else(|| missing(&key))?;
                        self.append(&key, existing, meter_id).await?
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        tracing::debug!(
            dataset = %ctx.dataset,
            postal_code = %key.postal_code,
            meter_id,
            outcome = ?reconciled.outcome,
            "Reconciled record"
        );
        Ok(reconciled)
    }

    /// Adds `meter_id` to the group, re-reading whenever another writer
    /// changed the meter ids between our read and our write.
    async fn append(
        &self,
        key: &GroupKey,
        mut existing: FieldGroup,
        meter_id: &str,
    ) -> Result<Reconciled> {
        let mut attempt = 1;
        loop {
            if existing.meter_ids.contains(meter_id) {
                return Ok(Reconciled {
                    group: existing,
                    outcome: MergeOutcome::Unchanged,
                });
            }
            let mut meters = existing.meter_ids.clone();
            meters.insert(meter_id);
            match self.store.update_meters(key, &existing.meter_ids, &meters).await {
                Ok(Some(group)) => {
                    return Ok(Reconciled {
                        group,
                        outcome: MergeOutcome::Appended,
                    });
                }
                Ok(None) => return Err(missing(key)),
                Err(Error::Conflict { .. }) if attempt < MAX_APPEND_ATTEMPTS => {
                    tracing::debug!(
                        dataset = %key.dataset,
                        postal_code = %key.postal_code,
                        meter_id,
                        attempt,
                        "Meter ids changed underneath; re-reading"
                    );
                    attempt += 1;
                    existing = self.store.get(key).await?.ok_or_else(|| missing(key))?;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn missing(key: &GroupKey) -> Error {
    Error::not_found(key.dataset.as_str(), key.postal_code.as_str())
}
