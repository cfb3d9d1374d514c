//! Common test utilities for API route tests.

// Each test binary uses a different subset.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use fieldwalk_api::{AppState, router};
use fieldwalk_core::{GeoResult, ResolutionCause, ResolutionFailure};
use fieldwalk_hub::{Hub, StatusService};
use fieldwalk_ingest::{Geocoder, Ingestor};
use fieldwalk_store::MemoryStore;

/// Multipart boundary used by [`multipart_upload`].
pub const BOUNDARY: &str = "fieldwalk-test-boundary";

/// Geocoder answering from a fixed address table.
pub struct TableGeocoder(HashMap<&'static str, GeoResult>);

#[async_trait]
impl Geocoder for TableGeocoder {
    async fn resolve(&self, address: &str) -> Result<GeoResult, ResolutionFailure> {
        self.0
            .get(address)
            .cloned()
            .ok_or_else(|| ResolutionFailure::new(address, ResolutionCause::NoCandidates))
    }
}

/// Test harness around a router backed by the in-memory store.
pub struct TestApp {
    /// Shared state, for direct subscriptions
    pub state: AppState,
    /// Backing store
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    /// Creates an app whose geocoder knows three Seoul addresses.
    pub fn new() -> Self {
        let geocoder = TableGeocoder(HashMap::from([
            ("서울 중구 세종대로 110", geo("04524")),
            ("서울 중구 세종대로 112", geo("04524")),
            ("서울 종로구 사직로 161", geo("03045")),
        ]));
        let store = Arc::new(MemoryStore::new());
        let ingestor = Ingestor::new(Arc::new(geocoder), store.clone());
        let status = StatusService::new(store.clone(), Hub::new(16));
        Self {
            state: AppState::new(ingestor, status),
            store,
        }
    }

    /// A fresh router over the shared state.
    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    /// Sends one request through a fresh router.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        use tower::ServiceExt;
        self.router().oneshot(request).await.unwrap()
    }
}

fn geo(postal_code: &str) -> GeoResult {
    GeoResult {
        x: 126.978,
        y: 37.5665,
        postal_code: Some(postal_code.to_string()),
    }
}

/// Builds a multipart body with a single part.
pub fn multipart_upload(field: &str, file_name: &str, content: &str) -> Body {
    Body::from(format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
         Content-Type: application/octet-stream\r\n\
         \r\n\
         {content}\r\n\
         --{BOUNDARY}--\r\n"
    ))
}

/// Reads a response body as JSON.
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
