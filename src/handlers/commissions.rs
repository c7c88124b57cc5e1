//! Commission HTTP handlers.
//!
//! Profiles:
//! - POST /api/v1/commission-profiles
//! - GET /api/v1/commission-profiles
//! - GET /api/v1/commission-profiles/:id
//! - PUT /api/v1/commission-profiles/:id
//! - DELETE /api/v1/commission-profiles/:id
//!
//! Calculation:
//! - GET /api/v1/commissions/calculate - One trainer, one period
//! - GET /api/v1/commissions/report - Every trainer, one period
//! - POST /api/v1/commissions/runs - Persist a calculation
//! - GET /api/v1/commissions/runs - List persisted runs

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
    models::commission::{
        CalculateQuery, CommissionProfileRequest, CommissionProfileResponse, CommissionReport,
        CommissionRun, CreateRunRequest, RunQuery, TrainerCommission,
    },
    services::commission_service,
};

/// Create a commission profile with its tiers. Managers only.
///
/// # Request Body
///
/// ```json
/// {
///   "name": "Senior trainers",
///   "calculation_method": "graduated",
///   "trigger_type": "session_count",
///   "tiers": [
///     { "level": 1, "session_rate_bps": 4000 },
///     { "level": 2, "session_threshold": 20, "session_rate_bps": 5000, "bonus_cents": 10000 }
///   ]
/// }
/// ```
///
/// - **Error (400)**: `invalid_commission_plan` (no tiers, rate above 10000 bps,
///   decreasing thresholds, duplicate levels)
/// - **Error (409)**: name already used
pub async fn create_profile(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CommissionProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let profile = commission_service::create_profile(&pool, &auth, request).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn list_profiles(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<CommissionProfileResponse>>, AppError> {
    auth.require_manager()?;
    let profiles = commission_service::list_profiles(&pool, auth.organization_id).await?;
    Ok(Json(profiles))
}

pub async fn get_profile(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(profile_id): Path<Uuid>,
) -> Result<Json<CommissionProfileResponse>, AppError> {
    auth.require_manager()?;
    let profile = commission_service::get_profile(&pool, auth.organization_id, profile_id).await?;
    Ok(Json(profile))
}

/// Replace a profile's settings and its whole tier list.
pub async fn update_profile(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(profile_id): Path<Uuid>,
    Json(request): Json<CommissionProfileRequest>,
) -> Result<Json<CommissionProfileResponse>, AppError> {
    let profile = commission_service::update_profile(&pool, &auth, profile_id, request).await?;
    Ok(Json(profile))
}

/// Delete a profile. Fails with 409 while any user is assigned to it.
pub async fn delete_profile(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(profile_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    commission_service::delete_profile(&pool, &auth, profile_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Calculate one trainer's commission for a period.
///
/// # Query Parameters
///
/// - `trainer_id` (optional): defaults to the caller; trainers may only ask for themselves
/// - `period_start`, `period_end` (optional, inclusive): default to the current month
///
/// # Response
///
/// ```json
/// {
///   "trainer_id": "...",
///   "trainer_name": "Sam Rivera",
///   "profile_name": "Senior trainers",
///   "period": { "start": "2026-03-01", "end": "2026-03-31" },
///   "breakdown": {
///     "method": "graduated",
///     "session_count": 24,
///     "tier_reached": 2,
///     "total_cents": 82000,
///     "tiers": [ ... ]
///   }
/// }
/// ```
pub async fn calculate(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<CalculateQuery>,
) -> Result<Json<TrainerCommission>, AppError> {
    let commission = commission_service::calculate(&pool, &auth, query).await?;
    Ok(Json(commission))
}

/// Commission for every trainer in the organization. Managers only.
pub async fn report(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<CalculateQuery>,
) -> Result<Json<CommissionReport>, AppError> {
    let report = commission_service::report(&pool, &auth, query).await?;
    Ok(Json(report))
}

/// Calculate and persist a commission run for payroll.
pub async fn create_run(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CreateRunRequest>,
) -> Result<(StatusCode, Json<CommissionRun>), AppError> {
    let run = commission_service::save_run(&pool, &auth, request).await?;
    Ok((StatusCode::CREATED, Json(run)))
}

pub async fn list_runs(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<RunQuery>,
) -> Result<Json<Vec<CommissionRun>>, AppError> {
    let runs = commission_service::list_runs(&pool, &auth, query).await?;
    Ok(Json(runs))
}
