//! Organization HTTP handlers.
//!
//! - POST /api/v1/organizations - Public signup (organization + owner)
//! - GET /api/v1/organization - Caller's organization
//! - GET /api/v1/organization/onboarding - Setup checklist

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::{
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::organization::{CreateOrganizationRequest, OnboardingChecklist, Organization},
    services::organization_service,
};

/// Sign up a new organization.
///
/// # Endpoint
///
/// `POST /api/v1/organizations` (no authentication)
///
/// # Request Body
///
/// ```json
/// {
///   "name": "Iron Temple Fitness",
///   "owner_email": "jo@irontemple.example",
///   "owner_name": "Jo Park",
///   "timezone": "Europe/Berlin"
/// }
/// ```
///
/// # Response (201 Created)
///
/// The organization, its owner and the owner's API key. The key is not
/// retrievable afterwards.
///
/// - **Error (409)**: slug already taken
/// - **Error (400)**: missing name or invalid email
pub async fn create_organization(
    State(pool): State<DbPool>,
    Json(request): Json<CreateOrganizationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let signup = organization_service::signup(&pool, request).await?;
    Ok((StatusCode::CREATED, Json(signup)))
}

/// Get the caller's organization.
pub async fn get_organization(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Organization>, AppError> {
    let organization = organization_service::get_organization(&pool, auth.organization_id).await?;
    Ok(Json(organization))
}

/// Onboarding checklist for the caller's organization.
///
/// # Response
///
/// ```json
/// {
///   "steps": [
///     { "key": "add_trainer", "label": "Add a trainer", "done": true },
///     { "key": "add_client", "label": "Add a client", "done": false }
///   ],
///   "completed": 1,
///   "total": 7,
///   "percent_complete": 14
/// }
/// ```
pub async fn get_onboarding(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<OnboardingChecklist>, AppError> {
    auth.require_manager()?;
    let checklist = organization_service::onboarding(&pool, auth.organization_id).await?;
    Ok(Json(checklist))
}
