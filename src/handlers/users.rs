//! Staff user HTTP handlers.
//!
//! - POST /api/v1/users - Create user (managers)
//! - GET /api/v1/users - List users (managers)
//! - GET /api/v1/users/:id - Get user (managers or self)
//! - PUT /api/v1/users/:id/commission-profile - Assign commission profile (managers)
//! - POST /api/v1/users/:id/api-keys - Rotate API key (managers or self)

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::{
        api_key::IssuedApiKeyResponse,
        user::{AssignProfileRequest, CreateUserRequest, UserResponse},
    },
    services::user_service,
};

/// Create a staff user.
///
/// # Request Body
///
/// ```json
/// {
///   "email": "sam@studio.example",
///   "full_name": "Sam Rivera",
///   "role": "trainer"
/// }
/// ```
///
/// # Response (201 Created)
///
/// ```json
/// {
///   "user": { "id": "...", "email": "sam@studio.example", "role": "trainer", ... },
///   "api_key": "9f86d081884c7d65..."
/// }
/// ```
///
/// - **Error (403)**: caller is a trainer, or an admin creating a manager
/// - **Error (409)**: email already used in this organization
pub async fn create_user(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let created = user_service::create_user(&pool, &auth, request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// List all users of the organization, alphabetically.
pub async fn list_users(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    auth.require_manager()?;
    let users = user_service::list_users(&pool, auth.organization_id).await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

pub async fn get_user(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, AppError> {
    auth.require_self_or_manager(user_id)?;
    let user = user_service::get_user(&pool, auth.organization_id, user_id).await?;
    Ok(Json(user.into()))
}

/// Assign a commission profile to a trainer, or clear it with `null`.
///
/// ```json
/// { "commission_profile_id": "770e8400-e29b-41d4-a716-446655440002" }
/// ```
pub async fn assign_commission_profile(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<AssignProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    auth.require_manager()?;
    let user = user_service::assign_commission_profile(
        &pool,
        auth.organization_id,
        user_id,
        request.commission_profile_id,
    )
    .await?;
    Ok(Json(user.into()))
}

/// Issue a new API key and deactivate the user's previous keys.
pub async fn rotate_api_key(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<Uuid>,
) -> Result<(StatusCode, Json<IssuedApiKeyResponse>), AppError> {
    let issued = user_service::rotate_api_key(&pool, &auth, user_id).await?;
    Ok((StatusCode::CREATED, Json(issued)))
}
