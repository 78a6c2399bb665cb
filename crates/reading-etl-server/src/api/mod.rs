//! HTTP surface
//!
//! | method | path | handler |
//! |---|---|---|
//! | GET | `/` | welcome message |
//! | GET | `/health` | PostgreSQL ping |
//! | GET | `/api/reading` | placeholder |
//! | GET, POST | `/api/sync/reading` | run one sync cycle |

pub mod routes;

use axum::{routing::get, Router};
use sqlx::PgPool;
use std::sync::Arc;

use crate::middleware;
use crate::sync::SyncService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub sync: Arc<SyncService>,
}

/// Build the application router with all routes and middleware
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::root))
        .route("/health", get(routes::health))
        .route("/api/reading", get(routes::reading))
        .route(
            "/api/sync/reading",
            get(routes::sync_reading).post(routes::sync_reading),
        )
        .fallback(routes::not_found)
        .with_state(state)
        .layer(middleware::tracing_layer())
}
