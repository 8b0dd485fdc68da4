//! Service layer - business logic between handlers and the database

pub mod query;

pub use query::{QueryOutcome, QueryService};
