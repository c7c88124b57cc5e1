//! Session package sales and lookups.

use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::package::{CreatePackageRequest, PACKAGE_SELECT, Package, PackageQuery},
    services::{client_service, user_service::find_active_staff},
};

/// Sell a package to a client. Managers only.
///
/// The package starts with all sessions remaining. Its trainer defaults to
/// the client's assigned trainer.
pub async fn create_package(
    pool: &DbPool,
    auth: &AuthContext,
    request: CreatePackageRequest,
) -> Result<Package, AppError> {
    auth.require_manager()?;
    request.validate().map_err(AppError::InvalidRequest)?;

    let client = client_service::fetch_client(pool, auth.organization_id, request.client_id).await?;
    let trainer_id = request.trainer_id.or(client.trainer_id);
    if let Some(trainer_id) = trainer_id {
        let mut conn = pool.acquire().await?;
        find_active_staff(&mut conn, auth.organization_id, trainer_id).await?;
    }

    let package_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO packages (
            organization_id, client_id, trainer_id, name,
            total_sessions, remaining_sessions, price_cents, expires_on
        )
        VALUES ($1, $2, $3, $4, $5, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(auth.organization_id)
    .bind(client.id)
    .bind(trainer_id)
    .bind(request.name.trim())
    .bind(request.total_sessions)
    .bind(request.price_cents)
    .bind(request.expires_on)
    .fetch_one(pool)
    .await?;

    tracing::info!(
        package_id = %package_id,
        client_id = %client.id,
        price_cents = request.price_cents,
        sessions = request.total_sessions,
        "package sold"
    );

    fetch_package(pool, auth.organization_id, package_id).await
}

/// Load a package of the organization without access checks.
pub async fn fetch_package(
    pool: &DbPool,
    organization_id: Uuid,
    package_id: Uuid,
) -> Result<Package, AppError> {
    sqlx::query_as::<_, Package>(&format!(
        "{PACKAGE_SELECT} WHERE p.id = $1 AND p.organization_id = $2"
    ))
    .bind(package_id)
    .bind(organization_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Package"))
}

/// Load a package the caller is allowed to see.
///
/// Trainers see packages of their clients and packages sold under their name.
pub async fn get_package(
    pool: &DbPool,
    auth: &AuthContext,
    package_id: Uuid,
) -> Result<Package, AppError> {
    let package = fetch_package(pool, auth.organization_id, package_id).await?;
    if auth.is_manager() || package.trainer_id == Some(auth.user_id) {
        return Ok(package);
    }

    let client = client_service::fetch_client(pool, auth.organization_id, package.client_id).await?;
    client_service::ensure_client_access(auth, &client)
        .map_err(|_| AppError::NotFound("Package"))?;
    Ok(package)
}

/// List packages, newest first.
pub async fn list_packages(
    pool: &DbPool,
    auth: &AuthContext,
    query: PackageQuery,
) -> Result<Vec<Package>, AppError> {
    let trainer_id = auth.trainer_filter(None)?;

    let packages = sqlx::query_as::<_, Package>(&format!(
        r#"
        {PACKAGE_SELECT}
        JOIN clients c ON c.id = p.client_id
        WHERE p.organization_id = $1
          AND ($2::uuid IS NULL OR p.client_id = $2)
          AND ($3::uuid IS NULL OR p.trainer_id = $3 OR c.trainer_id = $3)
          AND (NOT $4 OR p.remaining_sessions > 0)
        ORDER BY p.created_at DESC
        "#
    ))
    .bind(auth.organization_id)
    .bind(query.client_id)
    .bind(trainer_id)
    .bind(query.active_only)
    .fetch_all(pool)
    .await?;

    Ok(packages)
}

/// Unexpired packages with `LOW_REMAINING_SESSIONS` or fewer credits left,
/// exhausted ones included, optionally for one trainer's clients.
pub async fn list_running_low(
    pool: &DbPool,
    organization_id: Uuid,
    trainer_id: Option<Uuid>,
) -> Result<Vec<Package>, AppError> {
    let packages = sqlx::query_as::<_, Package>(&format!(
        r#"
        {PACKAGE_SELECT}
        JOIN clients c ON c.id = p.client_id
        WHERE p.organization_id = $1
          AND c.is_active = true
          AND p.remaining_sessions <= $2
          AND ($3::uuid IS NULL OR p.trainer_id = $3 OR c.trainer_id = $3)
          AND (p.expires_on IS NULL OR p.expires_on >= CURRENT_DATE)
        ORDER BY p.remaining_sessions, p.created_at
        "#
    ))
    .bind(organization_id)
    .bind(crate::models::package::LOW_REMAINING_SESSIONS)
    .bind(trainer_id)
    .fetch_all(pool)
    .await?;

    Ok(packages)
}
