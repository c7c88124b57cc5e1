//! Training session HTTP handlers.
//!
//! - POST /api/v1/sessions - Log a session (consumes a package credit)
//! - GET /api/v1/sessions - List sessions
//! - POST /api/v1/sessions/:id/cancel - Cancel a session (restores the credit)

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::session::{LogSessionRequest, SessionQuery, SessionResponse},
    services::session_service,
};

/// Log a completed (or no-show) session.
///
/// # Request Body
///
/// ```json
/// {
///   "client_id": "660e8400-e29b-41d4-a716-446655440001",
///   "package_id": "880e8400-e29b-41d4-a716-446655440003",
///   "session_at": "2026-03-14T09:00:00Z",
///   "status": "completed"
/// }
/// ```
///
/// # Response (201 Created)
///
/// The session including its `session_value_cents` snapshot.
///
/// - **Error (422)**: `package_exhausted` or `package_expired`
/// - **Error (404)**: client or package not found
pub async fn log_session(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<LogSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = session_service::log_session(&pool, &auth, request).await?;
    Ok((StatusCode::CREATED, Json(SessionResponse::from(session))))
}

/// List sessions, newest first.
///
/// # Query Parameters
///
/// - `trainer_id`, `client_id` (optional)
/// - `from`, `to` (optional, inclusive dates)
/// - `status` (optional)
pub async fn list_sessions(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<Vec<SessionResponse>>, AppError> {
    let sessions = session_service::list_sessions(&pool, &auth, query).await?;
    Ok(Json(sessions.into_iter().map(Into::into).collect()))
}

pub async fn cancel_session(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = session_service::cancel_session(&pool, &auth, session_id).await?;
    Ok(Json(session.into()))
}
