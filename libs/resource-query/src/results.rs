//! Rows produced by executing a compiled query set.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// One result row, keyed by output column name in select order.
pub type Row = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    Count,
    Data,
    Related,
    Facets,
    Stats,
}

impl StatementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Data => "data",
            Self::Related => "related",
            Self::Facets => "facets",
            Self::Stats => "stats",
        }
    }

    /// Whether the envelope can be built without this statement's rows.
    pub fn is_auxiliary(self) -> bool {
        matches!(self, Self::Related | Self::Facets | Self::Stats)
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An auxiliary statement that failed and was left out of the envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementFailure {
    pub kind: StatementKind,
    pub name: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResults {
    pub num_of_records: u64,
    pub records: Vec<Row>,
    pub related: BTreeMap<String, Vec<Row>>,
    pub facets: BTreeMap<String, Vec<Row>>,
    pub stats: BTreeMap<String, Vec<Row>>,
    pub failures: Vec<StatementFailure>,
}

impl QueryResults {
    /// Results for a query whose count matched nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}
