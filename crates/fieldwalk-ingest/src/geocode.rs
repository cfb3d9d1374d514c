//! Address resolution.
//!
//! [`Geocoder`] is the seam between the pipeline and whichever provider is
//! configured. [`NaverGeocoder`] speaks the Naver Cloud Maps geocode API.
//! The first candidate returned is taken as-is; there is no ranking.

use async_trait::async_trait;
use fieldwalk_core::config::GeocoderConfig;
use fieldwalk_core::{Error, GeoResult, ResolutionCause, ResolutionFailure, Result};
use reqwest::{Client, Url};
use serde::Deserialize;

/// Address element type carrying the postal code.
const POSTAL_CODE_TYPE: &str = "POSTAL_CODE";

/// Resolves free-text addresses to coordinates and postal codes.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Issues one lookup. Never retries.
    async fn resolve(&self, address: &str) -> std::result::Result<GeoResult, ResolutionFailure>;
}

/// Geocoder for the Naver Cloud Maps `geocode` endpoint.
#[derive(Debug, Clone)]
pub struct NaverGeocoder {
    client: Client,
    base_url: Url,
    key_id: String,
    key: String,
}

impl NaverGeocoder {
    /// Creates a geocoder. The client's timeout bounds every lookup.
    pub fn new(
        client: Client,
        base_url: &str,
        key_id: impl Into<String>,
        key: impl Into<String>,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::config(format!("invalid geocoder url '{base_url}': {e}")))?;
        Ok(Self {
            client,
            base_url,
            key_id: key_id.into(),
            key: key.into(),
        })
    }

    /// Creates a geocoder from configuration.
    pub fn from_config(config: &GeocoderConfig) -> Result<Self> {
        if config.key_id.is_empty() || config.key.is_empty() {
            tracing::warn!("Geocoder credentials are empty; lookups will be rejected");
        }
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::transport_with_source("failed to build geocoder client", e))?;
        Self::new(client, &config.base_url, &config.key_id, &config.key)
    }

    async fn lookup(&self, address: &str) -> std::result::Result<GeoResult, ResolutionCause> {
        let mut url = self.base_url.clone();
        url.query_pairs_mut().append_pair("query", address);

        let response = self
            .client
            .get(url)
            .header("X-NCP-APIGW-API-KEY-ID", &self.key_id)
            .header("X-NCP-APIGW-API-KEY", &self.key)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ResolutionCause::Timeout
                } else {
                    ResolutionCause::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolutionCause::Status(status.as_u16()));
        }

        let body: GeocodeResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ResolutionCause::Timeout
            } else {
                ResolutionCause::Malformed(e.to_string())
            }
        })?;

        let candidate = body
            .addresses
            .into_iter()
            .next()
            .ok_or(ResolutionCause::NoCandidates)?;
        candidate.into_geo_result()
    }
}

#[async_trait]
impl Geocoder for NaverGeocoder {
    async fn resolve(&self, address: &str) -> std::result::Result<GeoResult, ResolutionFailure> {
        match self.lookup(address).await {
            Ok(geo) => {
                tracing::debug!(
                    address,
                    x = geo.x,
                    y = geo.y,
                    postal_code = ?geo.postal_code,
                    "Resolved address"
                );
                Ok(geo)
            }
            Err(cause) => Err(ResolutionFailure::new(address, cause)),
        }
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    addresses: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    x: Coordinate,
    y: Coordinate,
    #[serde(rename = "addressElements", default)]
    address_elements: Vec<AddressElement>,
}

impl Candidate {
    fn into_geo_result(self) -> std::result::Result<GeoResult, ResolutionCause> {
        Ok(GeoResult {
            x: self.x.value("x")?,
            y: self.y.value("y")?,
            postal_code: postal_code(&self.address_elements),
        })
    }
}

/// The provider sends coordinates as decimal strings; numbers are accepted too.
#[derive(Deserialize)]
#[serde(untagged)]
enum Coordinate {
    Number(f64),
    Text(String),
}

impl Coordinate {
    fn value(&self, axis: &str) -> std::result::Result<f64, ResolutionCause> {
        let parsed = match self {
            Coordinate::Number(v) => Some(*v),
            Coordinate::Text(s) => s.trim().parse::<f64>().ok(),
        };
        parsed
            .filter(|v| v.is_finite())
            .ok_or_else(|| ResolutionCause::Malformed(format!("unusable {axis} coordinate")))
    }
}

#[derive(Deserialize)]
struct AddressElement {
    #[serde(default)]
    types: Vec<String>,
    #[serde(rename = "longName", default)]
    long_name: String,
}

fn postal_code(elements: &[AddressElement]) -> Option<String> {
    elements
        .iter()
        .filter(|e| e.types.iter().any(|t| t == POSTAL_CODE_TYPE))
        .map(|e| e.long_name.trim())
        .find(|code| !code.is_empty())
        .map(str::to_string)
}
