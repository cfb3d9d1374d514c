//! HTTP handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use fieldwalk_core::{FieldGroup, IngestReport, StatusSummary, VisitStatus};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::context::Ctx;
use crate::error::{Error, Result};
use crate::state::AppState;
use crate::ws;

/// Largest accepted upload body.
pub const UPLOAD_LIMIT_BYTES: usize = 32 * 1024 * 1024;

/// Multipart field carrying the uploaded table.
const FILE_FIELD: &str = "file";

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/upload",
            post(upload).layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES)),
        )
        .route("/update_status", post(update_status))
        .route("/get_data", get(get_data))
        .route("/summary", get(summary))
        .route("/health", get(health))
        .route("/ws", get(ws::subscribe))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `POST /upload`: ingests the `file` part of a multipart body.
async fn upload(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    mut multipart: Multipart,
) -> Result<Json<IngestReport>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Multipart(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| Error::Multipart(e.body_text()))?;
        let report = state.ingestor.ingest_file(&ctx, &name, bytes.to_vec()).await?;
        return Ok(Json(report));
    }
    Err(Error::MissingFile)
}

/// Body of `POST /update_status`.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    /// Group key within the caller's dataset
    pub postal_code: String,
    /// Wire name (`visited`) or field label (`완료`)
    pub status: String,
}

/// `POST /update_status`: sets a group's status and notifies subscribers.
async fn update_status(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    payload: std::result::Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<FieldGroup>> {
    let Json(request) = payload.map_err(|e| Error::InvalidBody(e.body_text()))?;
    let status: VisitStatus = request.status.parse()?;
    let group = state
        .status
        .set_status(&ctx, &request.postal_code, status)
        .await?;
    Ok(Json(group))
}

/// `GET /get_data`: every group in the caller's dataset.
async fn get_data(State(state): State<AppState>, Ctx(ctx): Ctx) -> Result<Json<Vec<FieldGroup>>> {
    Ok(Json(state.status.groups(&ctx).await?))
}

/// `GET /summary`: group counts per status.
async fn summary(State(state): State<AppState>, Ctx(ctx): Ctx) -> Result<Json<StatusSummary>> {
    Ok(Json(state.status.summary(&ctx).await?))
}

/// Health check response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Server status ("healthy").
    pub status: String,
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
