//! Runs a compiled query set against SQLite.
//!
//! Count and data statements are mandatory: if either fails the whole query
//! fails. Related, facet and stats statements are auxiliary; a failure there is
//! recorded on the results and the rest of the envelope is still served.

use futures::future::join_all;
use serde_json::{Number, Value as JsonValue};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{Column, Row as _, TypeInfo, ValueRef};
use std::time::{Duration, Instant};
use thiserror::Error;
use zenodeo_query::{
    BindValue, CompiledQuerySet, CompiledStatement, NamedStatement, QueryResults, Row,
    StatementFailure, StatementKind,
};

use crate::metrics::{STATEMENT_DURATION_SECONDS, STATEMENT_FAILURES_TOTAL};

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("statement timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Bind(#[from] zenodeo_query::Error),
}

impl ExecutionError {
    fn error_type(&self) -> &'static str {
        match self {
            ExecutionError::Timeout(_) => "timeout",
            ExecutionError::Database(_) => "database",
            ExecutionError::Bind(_) => "bind",
        }
    }
}

#[derive(Clone)]
pub struct QueryExecutor {
    pool: SqlitePool,
    timeout: Duration,
}

impl QueryExecutor {
    pub fn new(pool: SqlitePool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    pub async fn execute(&self, set: &CompiledQuerySet) -> crate::Result<QueryResults> {
        match &set.count {
            None => self.execute_single(set).await,
            Some(count) => self.execute_many(set, count).await,
        }
    }

    async fn execute_single(&self, set: &CompiledQuerySet) -> crate::Result<QueryResults> {
        let records = self
            .mandatory(&set.resource, StatementKind::Data, &set.data)
            .await?;

        let mut results = QueryResults {
            num_of_records: records.len() as u64,
            records,
            ..QueryResults::default()
        };

        self.auxiliary(&set.resource, StatementKind::Related, &set.related, &mut results)
            .await;

        Ok(results)
    }

    async fn execute_many(
        &self,
        set: &CompiledQuerySet,
        count: &CompiledStatement,
    ) -> crate::Result<QueryResults> {
        let count_rows = self
            .mandatory(&set.resource, StatementKind::Count, count)
            .await?;
        let num_of_records = first_integer(&count_rows);

        if num_of_records == 0 {
            tracing::debug!(
                resource = %set.resource,
                "No matching records, skipping remaining statements"
            );
            return Ok(QueryResults::empty());
        }

        let records = self
            .mandatory(&set.resource, StatementKind::Data, &set.data)
            .await?;

        let mut results = QueryResults {
            num_of_records,
            records,
            ..QueryResults::default()
        };

        let facets = self.run_group(&set.resource, StatementKind::Facets, &set.facets);
        let stats = self.run_group(&set.resource, StatementKind::Stats, &set.stats);
        let (facets, stats) = futures::join!(facets, stats);

        collect(StatementKind::Facets, facets, &mut results);
        collect(StatementKind::Stats, stats, &mut results);

        Ok(results)
    }

    async fn mandatory(
        &self,
        resource: &str,
        kind: StatementKind,
        statement: &CompiledStatement,
    ) -> crate::Result<Vec<Row>> {
        self.run(resource, kind, kind.as_str(), statement)
            .await
            .map_err(|e| crate::Error::Execution {
                statement: format!("{resource}.{kind}"),
                message: e.to_string(),
            })
    }

    async fn auxiliary(
        &self,
        resource: &str,
        kind: StatementKind,
        group: &[NamedStatement],
        results: &mut QueryResults,
    ) {
        let outcomes = self.run_group(resource, kind, group).await;
        collect(kind, outcomes, results);
    }

    async fn run_group<'a>(
        &self,
        resource: &str,
        kind: StatementKind,
        group: &'a [NamedStatement],
    ) -> Vec<(&'a str, Result<Vec<Row>, ExecutionError>)> {
        let futures = group.iter().map(|named| async move {
            let outcome = self
                .run(resource, kind, &named.name, &named.statement)
                .await;
            (named.name.as_str(), outcome)
        });
        join_all(futures).await
    }

    async fn run(
        &self,
        resource: &str,
        kind: StatementKind,
        name: &str,
        statement: &CompiledStatement,
    ) -> Result<Vec<Row>, ExecutionError> {
        let start = Instant::now();
        let outcome = self.fetch(statement).await;
        let elapsed = start.elapsed();

        STATEMENT_DURATION_SECONDS
            .with_label_values(&[resource, kind.as_str()])
            .observe(elapsed.as_secs_f64());

        match &outcome {
            Ok(rows) => tracing::debug!(
                resource,
                kind = %kind,
                name,
                sql = %statement.logged,
                rows = rows.len(),
                elapsed_ms = elapsed.as_millis() as u64,
                "Statement executed"
            ),
            Err(e) => {
                STATEMENT_FAILURES_TOTAL
                    .with_label_values(&[resource, kind.as_str(), e.error_type()])
                    .inc();
                let elapsed_ms = elapsed.as_millis() as u64;
                if kind.is_auxiliary() {
                    tracing::warn!(
                        resource,
                        kind = %kind,
                        name,
                        sql = %statement.logged,
                        elapsed_ms,
                        error = %e,
                        "Auxiliary statement failed"
                    );
                } else {
                    tracing::error!(
                        resource,
                        kind = %kind,
                        name,
                        sql = %statement.logged,
                        elapsed_ms,
                        error = %e,
                        "Statement failed"
                    );
                }
            }
        }

        outcome
    }

    async fn fetch(&self, statement: &CompiledStatement) -> Result<Vec<Row>, ExecutionError> {
        let (sql, bind_values) = statement.positional()?;

        let mut query_builder = sqlx::query(&sql);
        for value in bind_values {
            query_builder = match value {
                BindValue::Text(v) => query_builder.bind(v),
                BindValue::Integer(v) => query_builder.bind(v),
                BindValue::Real(v) => query_builder.bind(v),
            };
        }

        let rows = tokio::time::timeout(self.timeout, query_builder.fetch_all(&self.pool))
            .await
            .map_err(|_| ExecutionError::Timeout(self.timeout))??;

        Ok(rows.iter().map(row_to_json).collect())
    }
}

fn collect(
    kind: StatementKind,
    outcomes: Vec<(&str, Result<Vec<Row>, ExecutionError>)>,
    results: &mut QueryResults,
) {
    for (name, outcome) in outcomes {
        match outcome {
            Ok(rows) => {
                let target = match kind {
                    StatementKind::Related => &mut results.related,
                    StatementKind::Facets => &mut results.facets,
                    _ => &mut results.stats,
                };
                target.insert(name.to_string(), rows);
            }
            Err(e) => results.failures.push(StatementFailure {
                kind,
                name: name.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

/// First column of the first row as a record count.
fn first_integer(rows: &[Row]) -> u64 {
    rows.first()
        .and_then(|row| row.values().next())
        .and_then(|v| v.as_u64().or_else(|| v.as_f64().map(|f| f.max(0.0) as u64)))
        .unwrap_or(0)
}

/// Decode a row by the storage class of each value.
fn row_to_json(row: &SqliteRow) -> Row {
    let mut out = Row::new();
    for (i, column) in row.columns().iter().enumerate() {
        let value = decode_column(row, i).unwrap_or_else(|e| {
            tracing::warn!(column = column.name(), error = %e, "Undecodable column value");
            JsonValue::Null
        });
        out.insert(column.name().to_string(), value);
    }
    out
}

fn decode_column(row: &SqliteRow, index: usize) -> Result<JsonValue, sqlx::Error> {
    let type_name = {
        let raw = row.try_get_raw(index)?;
        if raw.is_null() {
            return Ok(JsonValue::Null);
        }
        raw.type_info().name().to_ascii_uppercase()
    };

    let value = match type_name.as_str() {
        "INTEGER" | "BOOLEAN" => JsonValue::from(row.try_get::<i64, _>(index)?),
        "REAL" | "NUMERIC" => Number::from_f64(row.try_get::<f64, _>(index)?)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        "BLOB" => JsonValue::String(hex::encode(row.try_get::<Vec<u8>, _>(index)?)),
        _ => JsonValue::String(row.try_get::<String, _>(index)?),
    };
    Ok(value)
}
