//! PostgREST (Supabase) backend.
//!
//! Talks to `{url}/rest/v1/{table}` with `apikey` and bearer headers. Each
//! call is a single HTTP request, so row-level atomicity comes from the
//! database. The `meters` column is written as a JSON array; rows written by
//! older tools that stored a comma-joined string are still readable.
//!
//! Meter updates carry the previously read list as an `eq.` filter, so a
//! PATCH that matches no row means either the group is gone or another
//! writer changed it first. A follow-up lookup tells the two apart. A row
//! still holding the comma-joined encoding never matches that filter and
//! keeps reporting a conflict until it is rewritten as an array.

use async_trait::async_trait;
use fieldwalk_core::config::StoreConfig;
use fieldwalk_core::{
    Dataset, Error, FieldGroup, GroupKey, MeterIds, NewFieldGroup, Result, VisitStatus,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::GroupStore;

/// [`GroupStore`] backed by a PostgREST table.
#[derive(Debug, Clone)]
pub struct PostgrestStore {
    client: Client,
    endpoint: String,
    key: Option<String>,
    table: String,
}

impl PostgrestStore {
    /// Creates a store for `table` under the PostgREST base `url`.
    pub fn new(client: Client, url: &str, key: Option<String>, table: &str) -> Result<Self> {
        let endpoint = format!("{}/rest/v1/{}", url.trim_end_matches('/'), table);
        Url::parse(&endpoint)
            .map_err(|e| Error::config(format!("invalid store url '{url}': {e}")))?;
        Ok(Self {
            client,
            endpoint,
            key,
            table: table.to_string(),
        })
    }

    /// Creates a store from configuration.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| Error::config("store.url is required for the postgrest backend"))?;
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::transport_with_source("failed to build store client", e))?;
        Self::new(client, url, config.key.clone(), &config.table)
    }

    fn url(&self, params: &[(&str, String)]) -> Result<Url> {
        Url::parse_with_params(&self.endpoint, params)
            .map_err(|e| Error::config(format!("invalid store url: {e}")))
    }

    fn key_filter(key: &GroupKey) -> [(&'static str, String); 2] {
        [
            ("dataset", format!("eq.{}", key.dataset)),
            ("postal_code", format!("eq.{}", key.postal_code)),
        ]
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header("Accept", "application/json");
        match &self.key {
            Some(key) => request
                .header("apikey", key)
                .header("Authorization", format!("Bearer {key}")),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        self.authorize(request)
            .send()
            .await
            .map_err(|e| {
                Error::transport_with_source(format!("{what} on {} failed", self.table), e)
            })
    }

    async fn rows(&self, response: Response, what: &str) -> Result<Vec<FieldGroup>> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::transport(format!(
                "{what} on {} returned HTTP {status}: {body}",
                self.table
            )));
        }
        let rows: Vec<StoredRow> = response.json().await.map_err(|e| {
            Error::transport_with_source(
                format!("{what} on {} returned an unreadable body", self.table),
                e,
            )
        })?;
        rows.into_iter().map(StoredRow::into_group).collect()
    }

    async fn patch(
        &self,
        params: &[(&str, String)],
        body: &PatchRow<'_>,
    ) -> Result<Option<FieldGroup>> {
        let url = self.url(params)?;
        let request = self
            .client
            .patch(url)
            .header("Prefer", "return=representation")
            .json(body);
        let response = self.send(request, "update").await?;
        Ok(self.rows(response, "update").await?.into_iter().next())
    }
}

#[async_trait]
impl GroupStore for PostgrestStore {
    async fn get(&self, key: &GroupKey) -> Result<Option<FieldGroup>> {
        let mut params = Self::key_filter(key).to_vec();
        params.push(("select", "*".to_string()));
        params.push(("limit", "1".to_string()));
        let response = self.send(self.client.get(self.url(&params)?), "lookup").await?;
        Ok(self.rows(response, "lookup").await?.into_iter().next())
    }

    async fn insert(&self, group: NewFieldGroup) -> Result<FieldGroup> {
        let row = InsertRow {
            dataset: group.dataset.as_str(),
            postal_code: &group.postal_code,
            address: &group.address,
            meters: group.meter_ids.as_slice(),
            x: group.x,
            y: group.y,
            status: group.status.as_str(),
        };
        let request = self
            .client
            .post(self.url(&[])?)
            .header("Prefer", "return=representation")
            .json(&row);
        let response = self.send(request, "insert").await?;
        if response.status() == StatusCode::CONFLICT {
            return Err(Error::conflict(group.dataset.as_str(), group.postal_code));
        }
        self.rows(response, "insert")
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::transport(format!("insert on {} returned no row", self.table)))
    }

    async fn update_status(
        &self,
        key: &GroupKey,
        status: VisitStatus,
    ) -> Result<Option<FieldGroup>> {
        let body = PatchRow {
            status: Some(status.as_str()),
            meters: None,
        };
        self.patch(&Self::key_filter(key), &body).await
    }

    async fn update_meters(
        &self,
        key: &GroupKey,
        expected: &MeterIds,
        meters: &MeterIds,
    ) -> Result<Option<FieldGroup>> {
        let mut params = Self::key_filter(key).to_vec();
        let previous = serde_json::to_string(expected.as_slice())?;
        params.push(("meters", format!("eq.{previous}")));
        let body = PatchRow {
            status: None,
            meters: Some(meters.as_slice()),
        };
        if let Some(group) = self.patch(&params, &body).await? {
            return Ok(Some(group));
        }
        match self.get(key).await? {
            Some(_) => Err(Error::conflict(key.dataset.as_str(), key.postal_code.as_str())),
            None => Ok(None),
        }
    }

    async fn list(&self, dataset: &Dataset) -> Result<Vec<FieldGroup>> {
        let params = [
            ("dataset", format!("eq.{dataset}")),
            ("select", "*".to_string()),
            ("order", "id.asc".to_string()),
        ];
        let response = self.send(self.client.get(self.url(&params)?), "list").await?;
        self.rows(response, "list").await
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Serialize)]
struct InsertRow<'a> {
    dataset: &'a str,
    postal_code: &'a str,
    address: &'a str,
    meters: &'a [String],
    x: f64,
    y: f64,
    status: &'static str,
}

#[derive(Serialize)]
struct PatchRow<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    meters: Option<&'a [String]>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MetersWire {
    List(Vec<String>),
    Joined(String),
}

impl MetersWire {
    fn into_meter_ids(self) -> MeterIds {
        match self {
            MetersWire::List(ids) => ids.into_iter().collect(),
            MetersWire::Joined(text) => text.split(',').collect(),
        }
    }
}

#[derive(Deserialize)]
struct StoredRow {
    id: i64,
    dataset: String,
    postal_code: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    meters: Option<MetersWire>,
    x: f64,
    y: f64,
    #[serde(default)]
    status: Option<String>,
}

impl StoredRow {
    fn into_group(self) -> Result<FieldGroup> {
        let status = match self.status.as_deref() {
            Some(s) if !s.trim().is_empty() => s.parse()?,
            _ => VisitStatus::default(),
        };
        Ok(FieldGroup {
            id: self.id,
            dataset: Dataset::new(self.dataset),
            postal_code: self.postal_code,
            address: self.address,
            meter_ids: self
                .meters
                .map(MetersWire::into_meter_ids)
                .unwrap_or_default(),
            x: self.x,
            y: self.y,
            status,
        })
    }
}
