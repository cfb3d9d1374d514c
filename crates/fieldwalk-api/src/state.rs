//! Shared handler state.

use std::sync::Arc;

use fieldwalk_core::FieldwalkConfig;
use fieldwalk_hub::{Hub, StatusService};
use fieldwalk_ingest::{Ingestor, NaverGeocoder};

/// Services shared by every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Upload pipeline
    pub ingestor: Arc<Ingestor>,
    /// Status writes, reads, and subscriptions
    pub status: StatusService,
}

impl AppState {
    /// Creates state from already-built services.
    pub fn new(ingestor: Ingestor, status: StatusService) -> Self {
        Self {
            ingestor: Arc::new(ingestor),
            status,
        }
    }

    /// Wires the store, geocoder, ingestor, and hub from configuration.
    pub fn from_config(config: &FieldwalkConfig) -> fieldwalk_core::Result<Self> {
        let store = fieldwalk_store::from_config(&config.store)?;
        let geocoder = Arc::new(NaverGeocoder::from_config(&config.geocoder)?);
        let ingestor = Ingestor::from_config(geocoder, store.clone(), &config.ingest)
            .with_timeout(config.geocoder.timeout());
        let status = StatusService::new(store, Hub::from_config(&config.hub));
        Ok(Self::new(ingestor, status))
    }
}
