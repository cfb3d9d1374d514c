//! Per-dataset broadcast of status events.
//!
//! # Usage
//!
//! ```rust
//! use fieldwalk_core::Dataset;
//! use fieldwalk_hub::Hub;
//!
//! let hub = Hub::new(16);
//! let dataset = Dataset::new("route-7");
//! let _subscription = hub.subscribe(&dataset);
//! assert_eq!(hub.subscriber_count(&dataset), 1);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, PoisonError, RwLock, Weak};
use std::task::{Context, Poll};

use fieldwalk_core::config::HubConfig;
use fieldwalk_core::{Dataset, StatusEvent};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::{Stream, StreamExt};

/// Default per-dataset buffer.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

// ============================================================================
// Hub
// ============================================================================

/// Registry of live subscribers, one channel per dataset.
///
/// Cheap to clone (Arc internals). Delivery is best effort: an event reaches
/// the subscribers registered when it is published, at most once each, with
/// no replay. A subscriber that falls more than the channel capacity behind
/// skips the events it missed. A dataset's channel is dropped as soon as its
/// last subscriber goes away.
#[derive(Clone)]
pub struct Hub {
    inner: Arc<HubInner>,
}

struct HubInner {
    channels: RwLock<HashMap<Dataset, broadcast::Sender<StatusEvent>>>,
    capacity: usize,
}

impl Hub {
    /// Creates a hub whose per-dataset buffers hold `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(HubInner {
                channels: RwLock::new(HashMap::new()),
                capacity: capacity.max(1),
            }),
        }
    }

    /// Creates a hub from the `[hub]` section.
    pub fn from_config(config: &HubConfig) -> Self {
        Self::new(config.channel_capacity)
    }

    /// Delivers an event to every current subscriber of its dataset.
    ///
    /// Never blocks and never fails. Returns the number of subscribers the
    /// event was queued for.
    pub fn publish(&self, event: StatusEvent) -> usize {
        let delivered = {
            let channels = self
                .inner
                .channels
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            match channels.get(&event.dataset) {
                Some(tx) => tx.send(event.clone()).unwrap_or(0),
                None => 0,
            }
        };

        if delivered == 0 {
            self.inner.prune(&event.dataset);
        }
        tracing::debug!(
            dataset = %event.dataset,
            postal_code = %event.postal_code,
            status = %event.status,
            delivered,
            "Published status event"
        );
        delivered
    }

    /// Registers a subscriber for a dataset.
    ///
    /// Only events published after this call are delivered.
    pub fn subscribe(&self, dataset: &Dataset) -> Subscription {
        let rx = {
            let mut channels = self
                .inner
                .channels
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            channels
                .entry(dataset.clone())
                .or_insert_with(|| broadcast::channel(self.inner.capacity).0)
                .subscribe()
        };
        tracing::debug!(dataset = %dataset, "Subscriber registered");
        Subscription::new(dataset.clone(), rx, Arc::downgrade(&self.inner))
    }

    /// Live subscribers of a dataset.
    pub fn subscriber_count(&self, dataset: &Dataset) -> usize {
        self.inner
            .channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(dataset)
            .map(broadcast::Sender::receiver_count)
            .unwrap_or(0)
    }

    /// Datasets that currently hold a channel.
    pub fn dataset_count(&self) -> usize {
        self.inner
            .channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl HubInner {
    fn prune(&self, dataset: &Dataset) {
        let mut channels = self.channels.write().unwrap_or_else(PoisonError::into_inner);
        // Re-checked under the write lock; a subscriber may have arrived.
        if channels
            .get(dataset)
            .is_some_and(|tx| tx.receiver_count() == 0)
        {
            channels.remove(dataset);
            tracing::debug!(dataset = %dataset, "Pruned empty dataset channel");
        }
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl fmt::Debug for Hub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hub")
            .field("capacity", &self.inner.capacity)
            .field("datasets", &self.dataset_count())
            .finish()
    }
}

// ============================================================================
// Subscription
// ============================================================================

/// A stream of status events for one dataset.
///
/// Dropping it unregisters the subscriber.
pub struct Subscription {
    dataset: Dataset,
    events: Pin<Box<dyn Stream<Item = StatusEvent> + Send>>,
    hub: Weak<HubInner>,
}

impl Subscription {
    fn new(dataset: Dataset, rx: broadcast::Receiver<StatusEvent>, hub: Weak<HubInner>) -> Self {
        let lagging = dataset.clone();
        let events = BroadcastStream::new(rx).filter_map(move |item| match item {
            Ok(event) => Some(event),
            Err(BroadcastStreamRecvError::Lagged(missed)) => {
                tracing::warn!(
                    dataset = %lagging,
                    missed,
                    "Subscriber fell behind; events skipped"
                );
                None
            }
        });
        Self {
            dataset,
            events: Box::pin(events),
            hub,
        }
    }

    /// The dataset this subscription follows.
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Waits for the next event. `None` once the hub is gone.
    pub async fn recv(&mut self) -> Option<StatusEvent> {
        self.events.next().await
    }
}

impl Stream for Subscription {
    type Item = StatusEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<StatusEvent>> {
        self.events.as_mut().poll_next(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // Release the receiver first so the count below no longer includes it.
        self.events = Box::pin(tokio_stream::empty());
        if let Some(hub) = self.hub.upgrade() {
            hub.prune(&self.dataset);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("dataset", &self.dataset)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
