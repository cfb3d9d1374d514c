//! Status mutations and dataset reads.

use std::sync::Arc;

use fieldwalk_core::{
    Error, FieldGroup, GroupKey, RequestContext, Result, StatusEvent, StatusSummary, VisitStatus,
};
use fieldwalk_store::GroupStore;

use crate::hub::{Hub, Subscription};

/// Applies status changes and announces them on the [`Hub`].
///
/// An event is published only after the store reports the write committed.
/// Concurrent updates to one group are last-writer-wins.
#[derive(Clone)]
pub struct StatusService {
    store: Arc<dyn GroupStore>,
    hub: Hub,
}

impl StatusService {
    /// Creates a service over a store and a hub.
    pub fn new(store: Arc<dyn GroupStore>, hub: Hub) -> Self {
        Self { store, hub }
    }

    /// The hub events are published on.
    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    /// Sets the status of the group at `postal_code` in the caller's dataset.
    ///
    /// Fails with [`Error::NotFound`] and publishes nothing when no such
    /// group exists.
    pub async fn set_status(
        &self,
        ctx: &RequestContext,
        postal_code: &str,
        status: VisitStatus,
    ) -> Result<FieldGroup> {
        let postal_code = postal_code.trim();
        if postal_code.is_empty() {
            return Err(Error::validation_field("postal_code", "must not be blank"));
        }

        let key = GroupKey::new(ctx.dataset.clone(), postal_code);
        let group = self
            .store
            .update_status(&key, status)
            .await?
            .ok_or_else(|| Error::not_found(key.dataset.as_str(), key.postal_code.as_str()))?;

        tracing::info!(
            dataset = %ctx.dataset,
            user = ctx.user_or_anonymous(),
            postal_code,
            status = %group.status,
            "Status updated"
        );
        self.hub.publish(StatusEvent::committed(&group));
        Ok(group)
    }

    /// Every group in the caller's dataset, oldest first.
    pub async fn groups(&self, ctx: &RequestContext) -> Result<Vec<FieldGroup>> {
        self.store.list(&ctx.dataset).await
    }

    /// Group counts per status in the caller's dataset.
    pub async fn summary(&self, ctx: &RequestContext) -> Result<StatusSummary> {
        let groups = self.store.list(&ctx.dataset).await?;
        Ok(StatusSummary::tally(groups.iter().map(|g| g.status)))
    }

    /// Subscribes to status events of the caller's dataset.
    pub fn subscribe(&self, ctx: &RequestContext) -> Subscription {
        self.hub.subscribe(&ctx.dataset)
    }
}
