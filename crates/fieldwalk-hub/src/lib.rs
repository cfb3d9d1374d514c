#![doc = include_str!("../README.md")]
//! # fieldwalk-hub
//!
//! The broadcast half of the fieldwalk pipeline.
//!
//! - [`Hub`]: per-dataset fan-out of [`StatusEvent`](fieldwalk_core::StatusEvent)s
//! - [`StatusService`]: status writes that publish on commit, plus dataset reads

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod hub;
pub mod service;

pub use hub::{DEFAULT_CHANNEL_CAPACITY, Hub, Subscription};
pub use service::StatusService;
