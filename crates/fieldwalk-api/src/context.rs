//! Request context extraction.
//!
//! Every handler works on behalf of a [`RequestContext`]. A layer in front
//! of the router may insert one into the request extensions; otherwise it is
//! built from the `x-dataset` and `x-user-id` headers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use fieldwalk_core::RequestContext;

use crate::error::{Error, Result};

/// Header naming the dataset a request is scoped to.
pub const DATASET_HEADER: &str = "x-dataset";

/// Header carrying the caller identity.
pub const USER_HEADER: &str = "x-user-id";

/// Dataset used when the request names none.
pub const DEFAULT_DATASET: &str = "default";

/// Extractor yielding the caller's [`RequestContext`].
#[derive(Debug, Clone)]
pub struct Ctx(pub RequestContext);

impl<S> FromRequestParts<S> for Ctx
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        context_from_parts(parts).map(Ctx)
    }
}

/// Builds the context for a request.
pub fn context_from_parts(parts: &Parts) -> Result<RequestContext> {
    if let Some(ctx) = parts.extensions.get::<RequestContext>() {
        return Ok(ctx.clone());
    }

    let dataset = header_value(parts, DATASET_HEADER)?.unwrap_or(DEFAULT_DATASET);
    let mut ctx = RequestContext::new(dataset);
    if let Some(user) = header_value(parts, USER_HEADER)? {
        ctx = ctx.with_user(user);
    }
    Ok(ctx)
}

/// A trimmed, non-empty header value.
fn header_value<'a>(parts: &'a Parts, name: &'static str) -> Result<Option<&'a str>> {
    let Some(value) = parts.headers.get(name) else {
        return Ok(None);
    };
    let text = value.to_str().map_err(|e| Error::BadHeader {
        name,
        message: e.to_string(),
    })?;
    let text = text.trim();
    Ok((!text.is_empty()).then_some(text))
}
