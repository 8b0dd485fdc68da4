//! Request handlers for API endpoints
//!
//! Handlers coordinate between routes and services, handling:
//! - Request extraction
//! - Service invocation
//! - Response formatting

pub mod metrics;
pub mod resources;

pub use metrics::*;
pub use resources::*;
