//! Dashboard HTTP handler.

use axum::{Extension, Json, extract::State};

use crate::{
    db::DbPool, error::AppError, middleware::auth::AuthContext, models::dashboard::Dashboard,
    services::dashboard_service,
};

/// Current-month dashboard for the caller.
///
/// Owners and admins get the studio view (`"view": "manager"`), trainers get
/// their own numbers and commission estimate (`"view": "trainer"`).
pub async fn get_dashboard(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Dashboard>, AppError> {
    let dashboard = dashboard_service::dashboard(&pool, &auth).await?;
    Ok(Json(dashboard))
}
