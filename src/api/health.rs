//! Health check endpoints

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::AppState;
use crate::db::schema;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub database: bool,
    /// Blog tables the storage bootstrap has not created
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_tables: Vec<&'static str>,
}

/// Liveness: OK whenever the process is serving
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness: the pool answers and every blog table exists
async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let missing = match schema::missing_tables(state.db.pool()).await {
        Ok(missing) => Some(missing),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness probe could not reach the database");
            None
        }
    };

    let response = match missing {
        Some(missing_tables) => ReadyResponse {
            ready: missing_tables.is_empty(),
            database: true,
            missing_tables,
        },
        None => ReadyResponse {
            ready: false,
            database: false,
            missing_tables: Vec::new(),
        },
    };
    let status = if response.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/readyz", get(readyz))
}
