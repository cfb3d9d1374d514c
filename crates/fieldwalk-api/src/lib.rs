#![doc = include_str!("../README.md")]
//! # fieldwalk-api
//!
//! HTTP surface for fieldwalk.
//!
//! This crate provides the HTTP API server:
//! - `POST /upload` and `POST /update_status` for writes
//! - `GET /get_data`, `GET /summary`, and `GET /health` for reads
//! - `GET /ws` for the live status feed
//! - Request context extraction and error-to-status mapping

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod context;
pub mod error;
pub mod routes;
pub mod server;
pub mod state;
pub mod ws;

pub use context::Ctx;
pub use error::{Error, Result};
pub use routes::router;
pub use server::serve;
pub use state::AppState;
