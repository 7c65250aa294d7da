//! marga-core library.
//!
//! Progress accounting and schedule health for road-construction contracts:
//! a bill of quantities plus weekly quantity reports go in; completion,
//! value-weighted physical progress, schedule status, deadline and
//! staleness signals, and a planned-vs-actual S-curve come out.
//!
//! The engine modules ([`ledger`], [`progress`], [`schedule`], [`curve`],
//! [`validate`], [`summary`]) are pure functions over a project snapshot.
//! [`tracker::Tracker`] puts the validator in front of a
//! [`store::ProjectStore`] and is the only code path that mutates records.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` errors in the library, `anyhow::Result`
//!   at config and CLI boundaries. Validation failures are data, not `Err`.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod config;
pub mod curve;
pub mod error;
pub mod ledger;
pub mod model;
pub mod progress;
pub mod schedule;
pub mod store;
pub mod summary;
pub mod tracker;
pub mod validate;

pub use error::ErrorCode;
pub use tracker::{Tracker, TrackerError};
