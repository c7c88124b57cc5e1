//! Staff user management and API key issuance.

use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::{AppError, conflict_on_unique},
    middleware::auth::AuthContext,
    models::{
        api_key::{ApiKey, IssuedApiKeyResponse, generate_api_key, hash_api_key},
        user::{
            CreateUserRequest, CreatedUserResponse, Role, USER_COLUMNS, User, normalize_email,
        },
    },
    services::required_text,
};

/// Insert a user inside an open transaction.
///
/// Duplicate emails within the organization become `Conflict`.
pub async fn insert_user(
    conn: &mut PgConnection,
    organization_id: Uuid,
    email: &str,
    full_name: &str,
    role: Role,
) -> Result<User, AppError> {
    let email = normalize_email(email)
        .ok_or_else(|| AppError::InvalidRequest("A valid email is required".to_string()))?;
    let full_name = required_text(full_name, "full_name")?;

    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (organization_id, email, full_name, role) \
         VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
    ))
    .bind(organization_id)
    .bind(&email)
    .bind(&full_name)
    .bind(role.as_str())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| conflict_on_unique(e, "A user with this email already exists"))
}

/// Generate a key for `user_id`, store its hash, and return the record plus the plain key.
pub async fn insert_api_key(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<(ApiKey, String), AppError> {
    let api_key = generate_api_key();

    let record = sqlx::query_as::<_, ApiKey>(
        r#"
        INSERT INTO api_keys (user_id, key_hash)
        VALUES ($1, $2)
        RETURNING id, user_id, key_hash, created_at, is_active
        "#,
    )
    .bind(user_id)
    .bind(hash_api_key(&api_key))
    .fetch_one(&mut *conn)
    .await?;

    Ok((record, api_key))
}

/// Create a staff user and their first API key.
///
/// # Rules
///
/// - Only managers may create users
/// - Only owners may create other owners or admins
pub async fn create_user(
    pool: &DbPool,
    auth: &AuthContext,
    request: CreateUserRequest,
) -> Result<CreatedUserResponse, AppError> {
    auth.require_manager()?;
    if !auth.role.can_create(request.role) {
        return Err(AppError::Forbidden);
    }

    let mut tx = pool.begin().await?;
    let user = insert_user(
        &mut tx,
        auth.organization_id,
        &request.email,
        &request.full_name,
        request.role,
    )
    .await?;
    let (_, api_key) = insert_api_key(&mut tx, user.id).await?;
    tx.commit().await?;

    tracing::info!(
        user_id = %user.id,
        organization_id = %auth.organization_id,
        role = %user.role,
        created_by = %auth.user_id,
        "user created"
    );

    Ok(CreatedUserResponse {
        user: user.into(),
        api_key,
    })
}

pub async fn list_users(pool: &DbPool, organization_id: Uuid) -> Result<Vec<User>, AppError> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE organization_id = $1 ORDER BY full_name"
    ))
    .bind(organization_id)
    .fetch_all(pool)
    .await?;

    Ok(users)
}

pub async fn get_user(
    pool: &DbPool,
    organization_id: Uuid,
    user_id: Uuid,
) -> Result<User, AppError> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND organization_id = $2"
    ))
    .bind(user_id)
    .bind(organization_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("User"))
}

/// Load an active staff member who can be assigned clients, sessions or sales.
///
/// Any role can train; studio owners often do.
pub async fn find_active_staff(
    conn: &mut PgConnection,
    organization_id: Uuid,
    user_id: Uuid,
) -> Result<User, AppError> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users \
         WHERE id = $1 AND organization_id = $2 AND is_active = true"
    ))
    .bind(user_id)
    .bind(organization_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(AppError::NotFound("Trainer"))
}

/// Assign or clear a trainer's commission profile.
pub async fn assign_commission_profile(
    pool: &DbPool,
    organization_id: Uuid,
    user_id: Uuid,
    profile_id: Option<Uuid>,
) -> Result<User, AppError> {
    if let Some(profile_id) = profile_id {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM commission_profiles WHERE id = $1 AND organization_id = $2)",
        )
        .bind(profile_id)
        .bind(organization_id)
        .fetch_one(pool)
        .await?;

        if !exists {
            return Err(AppError::NotFound("Commission profile"));
        }
    }

    let user = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET commission_profile_id = $1, updated_at = NOW() \
         WHERE id = $2 AND organization_id = $3 RETURNING {USER_COLUMNS}"
    ))
    .bind(profile_id)
    .bind(user_id)
    .bind(organization_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("User"))?;

    tracing::info!(user_id = %user.id, profile_id = ?profile_id, "commission profile assigned");

    Ok(user)
}

/// Replace all of a user's API keys with a fresh one.
pub async fn rotate_api_key(
    pool: &DbPool,
    auth: &AuthContext,
    user_id: Uuid,
) -> Result<IssuedApiKeyResponse, AppError> {
    auth.require_self_or_manager(user_id)?;

    let mut tx = pool.begin().await?;

    let target = find_active_staff(&mut tx, auth.organization_id, user_id)
        .await
        .map_err(|e| match e {
            AppError::NotFound(_) => AppError::NotFound("User"),
            other => other,
        })?;

    // Admins may not take over an owner's account
    if target.id != auth.user_id && !auth.role.can_create(target.role) {
        return Err(AppError::Forbidden);
    }

    sqlx::query("UPDATE api_keys SET is_active = false WHERE user_id = $1 AND is_active = true")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    let (record, api_key) = insert_api_key(&mut tx, user_id).await?;
    tx.commit().await?;

    tracing::info!(user_id = %user_id, rotated_by = %auth.user_id, "api key rotated");

    Ok(IssuedApiKeyResponse {
        api_key_id: record.id,
        user_id: record.user_id,
        api_key,
    })
}
