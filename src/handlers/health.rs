//! Liveness endpoint used by load balancers and uptime checks.

use crate::{db::DbPool, error::AppError};
use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: PoolHealth,
    pub timestamp: DateTime<Utc>,
}

/// Connection pool usage at the time of the check.
#[derive(Debug, Serialize)]
pub struct PoolHealth {
    pub connected: bool,
    pub open_connections: u32,
    pub idle_connections: usize,
}

/// `GET /health`
///
/// Runs `SELECT 1` through the pool. Any database failure surfaces as the
/// standard 500 `internal_error` body.
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": { "connected": true, "open_connections": 2, "idle_connections": 1 },
///   "timestamp": "2026-03-14T09:00:00Z"
/// }
/// ```
pub async fn health_check(State(pool): State<DbPool>) -> Result<Json<HealthResponse>, AppError> {
    sqlx::query("SELECT 1").execute(&pool).await?;

    Ok(Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        database: PoolHealth {
            connected: true,
            open_connections: pool.size(),
            idle_connections: pool.num_idle(),
        },
        timestamp: Utc::now(),
    }))
}
