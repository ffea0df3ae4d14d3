//! Error types and HTTP error response handling.
//!
//! This module defines the errors raised while loading configuration,
//! preparing the database schema, and serving HTTP requests.

use std::path::PathBuf;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Errors raised while assembling [`Config`](crate::config::Config).
///
/// A missing environment file or a missing variable is never an error;
/// fallbacks apply instead.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The environment file exists but could not be read or parsed.
    #[error("Failed to load environment file {}: {source}", path.display())]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },

    /// `DB_PORT` does not hold a valid TCP port number.
    #[error("Invalid database port {value:?}: expected an integer between 0 and 65535")]
    InvalidPort { value: String },

    /// The `DB_*` variables could not be deserialized.
    #[error("Invalid database settings: {0}")]
    Database(envy::Error),

    /// The server variables (e.g. `SERVER_PORT`) could not be deserialized.
    #[error("Invalid server settings: {0}")]
    Server(envy::Error),
}

/// Errors raised while bringing the database schema in line with the
/// managed entities.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// A registered entity has no backing table after schema preparation.
    #[error("Table `{table}` for entity {entity} does not exist")]
    MissingTable {
        entity: &'static str,
        table: &'static str,
    },
}

/// HTTP-facing error type.
///
/// Handlers return `Result<T, AppError>`; the error is turned into a JSON body
/// of the form `{"error": {"code": ..., "message": ...}}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (connection error, query error).
    ///
    /// Returns HTTP 500 and hides the details from the client.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Database(ref err) => {
                tracing::error!(error = %err, "Database request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
