//! Route handlers

use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};

use super::AppState;
use crate::{db, error::AppError};

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Welcome to the Observability Hub." }))
}

pub async fn reading() -> Json<Value> {
    Json(json!({ "placeholder": "reading placeholder still" }))
}

/// Health check handler
pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    db::health_check(&state.db).await?;

    Ok(Json(json!({
        "status": "healthy",
        "database": "connected"
    })))
}

/// Run one sync cycle; 200 on success, 500 with the error outcome otherwise
pub async fn sync_reading(State(state): State<AppState>) -> impl IntoResponse {
    let outcome = state.sync.trigger().await;

    let status = if outcome.is_success() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    (status, Json(outcome))
}

pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("no route for {}", uri.path()))
}
