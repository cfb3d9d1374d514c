#![doc = include_str!("../README.md")]
//! # fieldwalk-ingest
//!
//! The ingestion half of the fieldwalk pipeline: uploaded table in, merged
//! postal-code groups out.
//!
//! - [`table`]: CSV/TSV and spreadsheet parsing
//! - [`normalize`]: header aliasing and row filtering into [`RawRecord`]s
//! - [`geocode`]: the [`Geocoder`] seam and the Naver Maps client
//! - [`reconcile`]: create-or-append merging under a per-key lock
//! - [`batch`]: the [`Ingestor`] that ties it together with bounded concurrency
//!
//! [`RawRecord`]: fieldwalk_core::RawRecord

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod batch;
pub mod geocode;
pub mod locks;
pub mod normalize;
pub mod reconcile;
pub mod table;

pub use batch::Ingestor;
pub use geocode::{Geocoder, NaverGeocoder};
pub use normalize::{ColumnAliases, ColumnMap, Records, normalize, normalize_table};
pub use reconcile::{MergeOutcome, Reconciled, Reconciler};
pub use table::{Table, TabularFormat, read_table};
