//! Error types for the gateway

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Compile error: {0}")]
    Compile(String),

    #[error("Execution error in {statement}: {message}")]
    Execution { statement: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Short machine-readable classification used in error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "ValidationError",
            Error::ResourceNotFound(_) => "NotFound",
            Error::Compile(_) => "CompileError",
            Error::Execution { .. } => "ExecutionError",
            Error::Database(_) | Error::Migration(_) => "DatabaseError",
            Error::Config(_) => "ConfigError",
            Error::Internal(_) | Error::Other(_) => "InternalError",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            Error::Compile(_)
            | Error::Execution { .. }
            | Error::Database(_)
            | Error::Migration(_)
            | Error::Config(_)
            | Error::Internal(_)
            | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<zenodeo_query::Error> for Error {
    fn from(err: zenodeo_query::Error) -> Self {
        use zenodeo_query::Error as Q;
        match err {
            Q::Validation { .. } => Error::Validation(err.to_string()),
            Q::UnknownResource(name) => Error::ResourceNotFound(name),
            Q::Compile { .. } | Q::UnboundParameter(_) => Error::Compile(err.to_string()),
            Q::Descriptor { .. } | Q::Parse(_) | Q::Io(_) => Error::Config(err.to_string()),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if status.is_server_error() {
            tracing::error!(kind = self.kind(), "Internal error: {}", self);
            match &self {
                // Compile and execution failures name the statement; they are safe to surface.
                Error::Compile(_) | Error::Execution { .. } => self.to_string(),
                _ => "Internal server error".to_string(),
            }
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": {
                "kind": self.kind(),
                "message": message
            }
        }));

        let mut response = (status, body).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        response
    }
}
