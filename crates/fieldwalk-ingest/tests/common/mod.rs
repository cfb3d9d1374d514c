//! Common test utilities for ingestion integration tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use fieldwalk_core::{GeoResult, RequestContext, ResolutionCause, ResolutionFailure};
use fieldwalk_ingest::{Geocoder, Ingestor};
use fieldwalk_store::MemoryStore;

/// Geocoder answering from a fixed address table.
///
/// Unknown addresses fail with `NoCandidates`.
#[derive(Default)]
pub struct FakeGeocoder {
    answers: HashMap<String, GeoResult>,
}

impl FakeGeocoder {
    /// Creates an empty fake.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves `address` to a coordinate inside `postal_code`.
    pub fn with_postal(mut self, address: &str, postal_code: &str, x: f64, y: f64) -> Self {
        self.answers.insert(
            address.to_string(),
            GeoResult {
                x,
                y,
                postal_code: Some(postal_code.to_string()),
            },
        );
        self
    }

    /// Resolves `address` to a coordinate with no postal code.
    pub fn without_postal(mut self, address: &str, x: f64, y: f64) -> Self {
        self.answers.insert(
            address.to_string(),
            GeoResult {
                x,
                y,
                postal_code: None,
            },
        );
        self
    }
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn resolve(&self, address: &str) -> Result<GeoResult, ResolutionFailure> {
        tokio::task::yield_now().await;
        self.answers
            .get(address)
            .cloned()
            .ok_or_else(|| ResolutionFailure::new(address, ResolutionCause::NoCandidates))
    }
}

/// Test harness wiring a fake geocoder to an in-memory store.
pub struct TestHarness {
    /// Backing store
    pub store: Arc<MemoryStore>,
    /// Ingestor under test
    pub ingestor: Ingestor,
    /// Context for the default dataset
    pub ctx: RequestContext,
}

impl TestHarness {
    /// Creates a harness over the given geocoder.
    pub fn new(geocoder: FakeGeocoder) -> Self {
        let store = Arc::new(MemoryStore::new());
        let ingestor = Ingestor::new(Arc::new(geocoder), store.clone());
        Self {
            store,
            ingestor,
            ctx: RequestContext::new("route-7").with_user("tester"),
        }
    }
}

/// Geocoder covering the addresses used across the suites.
pub fn seoul_geocoder() -> FakeGeocoder {
    FakeGeocoder::new()
        .with_postal("서울 중구 세종대로 110", "04524", 126.9780, 37.5665)
        .with_postal("서울 중구 세종대로 112", "04524", 126.9782, 37.5667)
        .with_postal("서울 종로구 사직로 161", "03045", 126.9770, 37.5796)
        .without_postal("산 12-3", 127.56781, 37.12341)
        .without_postal("산 12-4", 127.567812, 37.123409)
}
