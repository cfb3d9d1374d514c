//! Service configuration.
//!
//! Resolution order for the config file: an explicit path, then
//! `$XDG_CONFIG_HOME/fieldwalk/config.toml`, then built-in defaults. Secrets
//! can be supplied through environment variables instead of the file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{Error, Result};

/// Project name used for the config directory.
pub const PROJECT_NAME: &str = "fieldwalk";

/// Environment variable overriding `geocoder.key_id`.
pub const ENV_GEOCODER_KEY_ID: &str = "FIELDWALK_GEOCODER_KEY_ID";
/// Environment variable overriding `geocoder.key`.
pub const ENV_GEOCODER_KEY: &str = "FIELDWALK_GEOCODER_KEY";
/// Environment variable overriding `store.url`.
pub const ENV_STORE_URL: &str = "FIELDWALK_STORE_URL";
/// Environment variable overriding `store.key`.
pub const ENV_STORE_KEY: &str = "FIELDWALK_STORE_KEY";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldwalkConfig {
    /// HTTP server settings
    pub server: ServerConfig,
    /// Geocoding provider settings
    pub geocoder: GeocoderConfig,
    /// Persistent store settings
    pub store: StoreConfig,
    /// Batch ingestion settings
    pub ingest: IngestConfig,
    /// Broadcast hub settings
    pub hub: HubConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:10000".to_string(),
        }
    }
}

/// Geocoding provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    /// Geocode endpoint
    pub base_url: String,
    /// API key id credential
    pub key_id: String,
    /// API key credential
    pub key: String,
    /// Per-lookup timeout in milliseconds
    pub timeout_ms: u64,
}

impl GeocoderConfig {
    /// Per-lookup timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://naveropenapi.apigw.ntruss.com/map-geocode/v2/geocode".to_string(),
            key_id: String::new(),
            key: String::new(),
            timeout_ms: 5_000,
        }
    }
}

/// Which store adapter to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local store; contents are lost on restart
    #[default]
    Memory,
    /// PostgREST-compatible HTTP endpoint (e.g. Supabase)
    Postgrest,
}

/// Persistent store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Adapter selection
    pub backend: StoreBackend,
    /// Base URL of the PostgREST endpoint
    pub url: Option<String>,
    /// Service key for the PostgREST endpoint
    pub key: Option<String>,
    /// Table holding field groups
    pub table: String,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

impl StoreConfig {
    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            url: None,
            key: None,
            table: "field_data".to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// Batch ingestion settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Maximum geocode lookups in flight per batch
    pub concurrency: usize,
    /// Header aliases recognized as the address column
    pub address_aliases: Vec<String>,
    /// Header aliases recognized as the equipment-id column
    pub meter_aliases: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            address_aliases: ["주소", "address", "addr"].map(String::from).to_vec(),
            meter_aliases: ["계기번호", "meter_id", "meterid", "meter", "equipment"]
                .map(String::from)
                .to_vec(),
        }
    }
}

/// Broadcast hub settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Events buffered per dataset before slow subscribers start skipping
    pub channel_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
        }
    }
}

impl FieldwalkConfig {
    /// Default config file location for this platform.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(PROJECT_NAME).join("config.toml"))
    }

    /// The explicit path if given, otherwise the platform default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        match explicit {
            Some(path) => Some(PathBuf::from(path)),
            None => Self::default_config_path(),
        }
    }

    /// Loads configuration and applies environment overrides.
    ///
    /// An explicit path must exist; a missing default file means defaults.
    pub fn load(explicit: Option<&str>) -> Result<Self> {
        let mut config = match Self::resolve_config_path(explicit) {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) if explicit.is_some() => {
                return Err(Error::config(format!(
                    "Config file does not exist at {}",
                    path.display()
                )));
            }
            _ => Self::default(),
        };
        config.apply_env_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parses a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "Loaded config file");
        Self::from_toml_str(&content)
            .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))
    }

    /// Parses TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(e.to_string()))
    }

    /// Renders the configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Applies secret overrides from a variable lookup.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_GEOCODER_KEY_ID) {
            self.geocoder.key_id = v;
        }
        if let Some(v) = lookup(ENV_GEOCODER_KEY) {
            self.geocoder.key = v;
        }
        if let Some(v) = lookup(ENV_STORE_URL) {
            self.store.url = Some(v);
        }
        if let Some(v) = lookup(ENV_STORE_KEY) {
            self.store.key = Some(v);
        }
    }

    /// Checks cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        if self.ingest.concurrency == 0 {
            return Err(Error::config("ingest.concurrency must be at least 1"));
        }
        if self.ingest.address_aliases.iter().all(|a| a.trim().is_empty()) {
            return Err(Error::config("ingest.address_aliases must not be empty"));
        }
        if self.hub.channel_capacity == 0 {
            return Err(Error::config("hub.channel_capacity must be at least 1"));
        }
        if self.geocoder.timeout_ms == 0 {
            return Err(Error::config("geocoder.timeout_ms must be at least 1"));
        }
        if self.store.backend == StoreBackend::Postgrest && self.store.url.is_none() {
            return Err(Error::config(format!(
                "store.url (or {ENV_STORE_URL}) is required for the postgrest backend"
            )));
        }
        Ok(())
    }

    /// Copy with credentials masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.geocoder.key.is_empty() {
            copy.geocoder.key = "********".to_string();
        }
        if copy.store.key.is_some() {
            copy.store.key = Some("********".to_string());
        }
        copy
    }
}
