//! Batch ingestion driver.
//!
//! Resolution runs with bounded concurrency; every resolved row is handed to
//! the [`Reconciler`]. Row-level problems are collected into the
//! [`IngestReport`] and never abort the batch.

use std::sync::Arc;
use std::time::Duration;

use fieldwalk_core::config::IngestConfig;
use fieldwalk_core::{
    GeoResult, IngestReport, RawRecord, RequestContext, ResolutionCause, ResolutionFailure,
    Result, RowError,
};
use fieldwalk_store::GroupStore;
use futures::StreamExt;

use crate::geocode::Geocoder;
use crate::normalize::{ColumnAliases, normalize_table};
use crate::reconcile::{MergeOutcome, Reconciler};
use crate::table::read_table;

/// Default number of lookups in flight.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// What happened to one row.
enum RowOutcome {
    Merged(MergeOutcome),
    Unresolved(ResolutionFailure),
    Rejected(RowError),
}

/// Runs uploaded tables through resolution and reconciliation.
pub struct Ingestor {
    geocoder: Arc<dyn Geocoder>,
    reconciler: Reconciler,
    aliases: ColumnAliases,
    concurrency: usize,
    resolve_timeout: Option<Duration>,
}

impl Ingestor {
    /// Creates an ingestor with default aliases and concurrency.
    pub fn new(geocoder: Arc<dyn Geocoder>, store: Arc<dyn GroupStore>) -> Self {
        Self {
            geocoder,
            reconciler: Reconciler::new(store),
            aliases: ColumnAliases::default(),
            concurrency: DEFAULT_CONCURRENCY,
            resolve_timeout: None,
        }
    }

    /// Creates an ingestor configured from the `[ingest]` section.
    pub fn from_config(
        geocoder: Arc<dyn Geocoder>,
        store: Arc<dyn GroupStore>,
        config: &IngestConfig,
    ) -> Self {
        Self::new(geocoder, store)
            .with_concurrency(config.concurrency)
            .with_aliases(ColumnAliases::from_config(config))
    }

    /// Caps lookups in flight. Zero is treated as one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Replaces the header aliases.
    pub fn with_aliases(mut self, aliases: ColumnAliases) -> Self {
        self.aliases = aliases;
        self
    }

    /// Bounds every lookup, on top of whatever the geocoder enforces itself.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.resolve_timeout = Some(timeout);
        self
    }

    /// The reconciler rows are merged through.
    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Parses, normalizes, and ingests an uploaded file.
    ///
    /// Fails before touching any row when the format is unsupported or no
    /// address column exists.
    pub async fn ingest_file(
        &self,
        ctx: &RequestContext,
        name: &str,
        bytes: Vec<u8>,
    ) -> Result<IngestReport> {
        let table = read_table(name, bytes)?;
        let records = normalize_table(table, &self.aliases)?;
        tracing::info!(
            dataset = %ctx.dataset,
            user = ctx.user_or_anonymous(),
            file = name,
            "Ingesting upload"
        );
        Ok(self.ingest(ctx, records).await)
    }

    /// Ingests already-normalized records.
    pub async fn ingest<I>(&self, ctx: &RequestContext, records: I) -> IngestReport
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let report = futures::stream::iter(records)
            .map(|record| self.process(ctx, record))
            .buffer_unordered(self.concurrency)
            .fold(IngestReport::default(), |mut report, outcome| async move {
                report.rows_seen += 1;
                match outcome {
                    RowOutcome::Merged(MergeOutcome::Created) => report.groups_created += 1,
                    RowOutcome::Merged(MergeOutcome::Appended) => report.groups_updated += 1,
                    RowOutcome::Merged(MergeOutcome::Unchanged) => report.unchanged += 1,
                    RowOutcome::Unresolved(failure) => report.failures.push(failure),
                    RowOutcome::Rejected(error) => report.row_errors.push(error),
                }
                report
            })
            .await;

        tracing::info!(
            dataset = %ctx.dataset,
            rows = report.rows_seen,
            created = report.groups_created,
            updated = report.groups_updated,
            unchanged = report.unchanged,
            unresolved = report.failures.len(),
            rejected = report.row_errors.len(),
            "Ingestion batch complete"
        );
        report
    }

    async fn process(&self, ctx: &RequestContext, record: RawRecord) -> RowOutcome {
        let geo = match self.resolve(&record.address).await {
            Ok(geo) => geo,
            Err(failure) => {
                tracing::warn!(
                    dataset = %ctx.dataset,
                    address = %failure.address,
                    cause = %failure.cause,
                    "Skipping unresolved row"
                );
                return RowOutcome::Unresolved(failure);
            }
        };

        match self.reconciler.reconcile(ctx, &record, &geo).await {
            Ok(reconciled) => RowOutcome::Merged(reconciled.outcome),
            Err(e) => {
                tracing::warn!(
                    dataset = %ctx.dataset,
                    address = %record.address,
                    meter_id = %record.meter_id,
                    error = %e,
                    "Skipping row the store rejected"
                );
                RowOutcome::Rejected(RowError {
                    address: record.address,
                    meter_id: record.meter_id,
                    message: e.to_string(),
                })
            }
        }
    }

    async fn resolve(&self, address: &str) -> std::result::Result<GeoResult, ResolutionFailure> {
        let lookup = self.geocoder.resolve(address);
        match self.resolve_timeout {
            Some(limit) => tokio::time::timeout(limit, lookup)
                .await
                .unwrap_or_else(|_| Err(ResolutionFailure::new(address, ResolutionCause::Timeout))),
            None => lookup.await,
        }
    }
}
