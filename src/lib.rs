//! Hotfix viewer: search service over a catalog of hotfix (ECP) records.
//!
//! Records are bulk-loaded from an exported sheet into an in-memory catalog
//! generation and queried over REST with up to twelve optional filters.

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod query;
pub mod service;
pub mod usage;

pub use error::{AppError, Result};
