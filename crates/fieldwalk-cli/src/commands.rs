//! `serve` and `import` commands.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use fieldwalk_api::AppState;
use fieldwalk_core::{FieldwalkConfig, RequestContext};
use fieldwalk_ingest::{Ingestor, NaverGeocoder};

/// Runs the server until Ctrl-C.
pub async fn serve(mut config: FieldwalkConfig, bind: Option<String>) -> anyhow::Result<()> {
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    let state = AppState::from_config(&config).context("failed to initialize services")?;
    fieldwalk_api::serve(&config.server, state).await?;
    Ok(())
}

/// Ingests a local file and prints the report as JSON on stdout.
pub async fn import(
    config: &FieldwalkConfig,
    file: &str,
    dataset: &str,
    concurrency: Option<usize>,
) -> anyhow::Result<()> {
    let path = Path::new(file);
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("not a file path: {file}"))?;
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    let store = fieldwalk_store::from_config(&config.store)?;
    let geocoder = Arc::new(NaverGeocoder::from_config(&config.geocoder)?);
    let ingestor = Ingestor::from_config(geocoder, store, &config.ingest)
        .with_concurrency(concurrency.unwrap_or(config.ingest.concurrency))
        .with_timeout(config.geocoder.timeout());

    let ctx = RequestContext::new(dataset).with_user("cli");
    let report = ingestor.ingest_file(&ctx, name, bytes).await?;

    if !report.failures.is_empty() {
        tracing::warn!(
            unresolved = report.failures.len(),
            "Some addresses could not be resolved; see the report"
        );
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
