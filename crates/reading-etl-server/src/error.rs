//! Server-specific error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::db::DbError;

/// Errors returned by HTTP handlers
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Service unavailable: {0}")]
    Unavailable(#[from] DbError),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Unavailable(ref e) => {
                tracing::error!(error = %e, "Dependency unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
            },
            AppError::NotFound(ref message) => (StatusCode::NOT_FOUND, message.clone()),
        };

        let body = Json(json!({
            "error": {
                "message": error_message,
                "status": status.as_u16(),
            }
        }));

        (status, body).into_response()
    }
}
