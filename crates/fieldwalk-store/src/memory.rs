//! In-memory store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use fieldwalk_core::{
    Dataset, Error, FieldGroup, GroupKey, MeterIds, NewFieldGroup, Result, VisitStatus,
};
use tokio::sync::RwLock;

use crate::GroupStore;

/// Process-local [`GroupStore`]. Ids start at 1.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: RwLock<HashMap<GroupKey, FieldGroup>>,
    next_id: AtomicI64,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored groups across all datasets.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Returns `true` if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl GroupStore for MemoryStore {
    async fn get(&self, key: &GroupKey) -> Result<Option<FieldGroup>> {
        Ok(self.rows.read().await.get(key).cloned())
    }

    async fn insert(&self, group: NewFieldGroup) -> Result<FieldGroup> {
        let key = group.key();
        let mut rows = self.rows.write().await;
        if rows.contains_key(&key) {
            return Err(Error::conflict(key.dataset.as_str(), key.postal_code));
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let stored = group.with_id(id);
        rows.insert(key, stored.clone());
        Ok(stored)
    }

    async fn update_status(
        &self,
        key: &GroupKey,
        status: VisitStatus,
    ) -> Result<Option<FieldGroup>> {
        let mut rows = self.rows.write().await;
        Ok(rows.get_mut(key).map(|group| {
            group.status = status;
            group.clone()
        }))
    }

    async fn update_meters(
        &self,
        key: &GroupKey,
        expected: &MeterIds,
        meters: &MeterIds,
    ) -> Result<Option<FieldGroup>> {
        let mut rows = self.rows.write().await;
        let Some(group) = rows.get_mut(key) else {
            return Ok(None);
        };
        if &group.meter_ids != expected {
            return Err(Error::conflict(key.dataset.as_str(), key.postal_code.as_str()));
        }
        group.meter_ids = meters.clone();
        Ok(Some(group.clone()))
    }

    async fn list(&self, dataset: &Dataset) -> Result<Vec<FieldGroup>> {
        let rows = self.rows.read().await;
        let mut groups: Vec<FieldGroup> = rows
            .values()
            .filter(|g| &g.dataset == dataset)
            .cloned()
            .collect();
        groups.sort_by_key(|g| g.id);
        Ok(groups)
    }
}
