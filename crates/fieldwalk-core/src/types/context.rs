//! Per-request caller context.

use serde::{Deserialize, Serialize};

use super::Dataset;

/// Who is calling and which dataset the call is scoped to.
///
/// Built once per request by the transport layer and passed into every core
/// operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Dataset every read and write is scoped to
    pub dataset: Dataset,
    /// Caller identity, for logging only
    pub user: Option<String>,
}

impl RequestContext {
    /// Creates an anonymous context for a dataset.
    pub fn new(dataset: impl Into<Dataset>) -> Self {
        Self {
            dataset: dataset.into(),
            user: None,
        }
    }

    /// Attaches a caller identity.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Caller identity, or `"anonymous"`.
    pub fn user_or_anonymous(&self) -> &str {
        self.user.as_deref().unwrap_or("anonymous")
    }
}
