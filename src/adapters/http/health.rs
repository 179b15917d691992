//! GET /health - liveness plus connection pool occupancy.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

use crate::adapters::pool::{ConnectionPool, PoolStatus};
use crate::ports::Connector;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<PoolStatus>,
}

/// 200 with pool occupancy while the pool is live, 503 otherwise.
pub async fn health<C: Connector>(
    State(pool): State<ConnectionPool<C>>,
) -> (StatusCode, Json<HealthResponse>) {
    match pool.status() {
        Some(status) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                pool: Some(status),
            }),
        ),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unavailable",
                pool: None,
            }),
        ),
    }
}

pub fn health_routes<C: Connector>(pool: ConnectionPool<C>) -> Router {
    Router::new()
        .route("/health", get(health::<C>))
        .with_state(pool)
}
