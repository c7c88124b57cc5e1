//! Session package HTTP handlers.

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
    models::package::{CreatePackageRequest, PackageQuery, PackageResponse},
    services::package_service,
};

/// Sell a package of sessions to a client. Managers only.
///
/// # Request Body
///
/// ```json
/// {
///   "client_id": "660e8400-e29b-41d4-a716-446655440001",
///   "name": "10 x 60min",
///   "total_sessions": 10,
///   "price_cents": 75000,
///   "expires_on": "2026-06-30"
/// }
/// ```
///
/// # Response (201 Created)
///
/// The package with `remaining_sessions` equal to `total_sessions` and the
/// derived `session_value_cents` (7500 above).
pub async fn create_package(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CreatePackageRequest>,
) -> Result<impl IntoResponse, AppError> {
    let package = package_service::create_package(&pool, &auth, request).await?;
    Ok((StatusCode::CREATED, Json(PackageResponse::from(package))))
}

/// List packages, optionally for one client or only those still usable.
pub async fn list_packages(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<PackageQuery>,
) -> Result<Json<Vec<PackageResponse>>, AppError> {
    let packages = package_service::list_packages(&pool, &auth, query).await?;
    Ok(Json(packages.into_iter().map(Into::into).collect()))
}

pub async fn get_package(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(package_id): Path<Uuid>,
) -> Result<Json<PackageResponse>, AppError> {
    let package = package_service::get_package(&pool, &auth, package_id).await?;
    Ok(Json(package.into()))
}
