//! Core types for fieldwalk.

mod context;
mod event;
mod group;
mod ids;
mod meters;
mod proptests;
mod record;
mod report;
mod status;

pub use context::RequestContext;
pub use event::StatusEvent;
pub use group::{FieldGroup, NewFieldGroup};
pub use ids::{Dataset, FALLBACK_KEY_PREFIX, GroupKey, fallback_postal_code};
pub use meters::MeterIds;
pub use record::{GeoResult, RawRecord, ResolutionCause, ResolutionFailure};
pub use report::{IngestReport, RowError};
pub use status::{StatusSummary, VisitStatus};
