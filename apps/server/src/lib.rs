//! Zenodeo - biodiversity literature query gateway
//!
//! Serves treatments and the material extracted from them over a read-only
//! HTTP API:
//! - Declarative resource descriptors drive validation and SQL generation
//! - Count, data, related, facet and stats queries per request
//! - Partial responses when an auxiliary query fails
//! - Canonical-key response caching per resource

#![allow(clippy::type_complexity)]

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};
pub use state::AppState;
