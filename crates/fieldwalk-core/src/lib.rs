#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Fieldwalk Core
//!
//! Shared types, errors, and configuration for the fieldwalk workspace.
//! This crate has no internal fieldwalk dependencies.
//!
//! # Modules
//!
//! - [`error`]: Error taxonomy and `Result` alias
//! - [`types`]: Records, groups, keys, visit states, events, and reports
//! - [`config`]: TOML-backed service configuration

pub mod config;
pub mod error;
pub mod types;

// Re-exports for convenience
pub use config::FieldwalkConfig;
pub use error::{Error, Result};
pub use types::{
    Dataset, FieldGroup, GeoResult, GroupKey, IngestReport, MeterIds, NewFieldGroup, RawRecord,
    RequestContext, ResolutionCause, ResolutionFailure, RowError, StatusEvent, StatusSummary,
    VisitStatus,
};
