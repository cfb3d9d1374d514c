#![doc = include_str!("../README.md")]
//! # fieldwalk-store
//!
//! Persistence for field groups.
//!
//! This crate provides:
//! - The [`GroupStore`] trait: point lookup, insert, and partial updates by group key
//! - [`MemoryStore`]: a process-local backend for tests and local runs
//! - [`PostgrestStore`]: an HTTP backend for PostgREST/Supabase tables
//!
//! Backends guarantee row-level atomicity per key. Meter updates are
//! compare-and-set: a writer that lost a race gets a conflict and re-reads.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod memory;
pub mod postgrest;
pub mod traits;

use std::sync::Arc;

use fieldwalk_core::config::{StoreBackend, StoreConfig};

pub use memory::MemoryStore;
pub use postgrest::PostgrestStore;
pub use traits::GroupStore;

/// Builds the backend selected by the configuration.
pub fn from_config(config: &StoreConfig) -> fieldwalk_core::Result<Arc<dyn GroupStore>> {
    match config.backend {
        StoreBackend::Memory => {
            tracing::info!("Using in-memory field group store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgrest => {
            let store = PostgrestStore::from_config(config)?;
            tracing::info!(table = %config.table, "Using PostgREST field group store");
            Ok(Arc::new(store))
        }
    }
}
