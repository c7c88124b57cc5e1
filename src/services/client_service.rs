//! Client management with trainer scoping.

use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::client::{
        CLIENT_COLUMNS, Client, ClientQuery, CreateClientRequest, UpdateClientRequest,
    },
    services::{optional_text, required_text, user_service::find_active_staff},
};

/// Fail with 404 unless the caller may see this client.
///
/// Trainers only see clients assigned to them. A 404 (not 403) avoids
/// revealing that the client exists.
pub fn ensure_client_access(auth: &AuthContext, client: &Client) -> Result<(), AppError> {
    if auth.is_manager() || client.trainer_id == Some(auth.user_id) {
        Ok(())
    } else {
        Err(AppError::NotFound("Client"))
    }
}

/// Load a client of the caller's organization without access checks.
pub async fn fetch_client(
    pool: &DbPool,
    organization_id: Uuid,
    client_id: Uuid,
) -> Result<Client, AppError> {
    sqlx::query_as::<_, Client>(&format!(
        "SELECT {CLIENT_COLUMNS} FROM clients WHERE id = $1 AND organization_id = $2"
    ))
    .bind(client_id)
    .bind(organization_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Client"))
}

/// Load a client the caller is allowed to see.
pub async fn get_client(
    pool: &DbPool,
    auth: &AuthContext,
    client_id: Uuid,
) -> Result<Client, AppError> {
    let client = fetch_client(pool, auth.organization_id, client_id).await?;
    ensure_client_access(auth, &client)?;
    Ok(client)
}

/// Create a client.
///
/// Trainers may only create clients for themselves; a trainer creating a
/// client without naming a trainer is assigned automatically.
pub async fn create_client(
    pool: &DbPool,
    auth: &AuthContext,
    request: CreateClientRequest,
) -> Result<Client, AppError> {
    let full_name = required_text(&request.full_name, "full_name")?;

    let trainer_id = match request.trainer_id {
        Some(id) => Some(auth.scoped_trainer(Some(id))?),
        None if !auth.is_manager() => Some(auth.user_id),
        None => None,
    };

    if let Some(trainer_id) = trainer_id {
        let mut conn = pool.acquire().await?;
        find_active_staff(&mut conn, auth.organization_id, trainer_id).await?;
    }

    let client = sqlx::query_as::<_, Client>(&format!(
        "INSERT INTO clients (organization_id, trainer_id, full_name, email, phone) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {CLIENT_COLUMNS}"
    ))
    .bind(auth.organization_id)
    .bind(trainer_id)
    .bind(&full_name)
    .bind(optional_text(request.email))
    .bind(optional_text(request.phone))
    .fetch_one(pool)
    .await?;

    tracing::info!(client_id = %client.id, trainer_id = ?trainer_id, "client created");

    Ok(client)
}

/// List clients, newest first. Trainers only get their own.
pub async fn list_clients(
    pool: &DbPool,
    auth: &AuthContext,
    query: ClientQuery,
) -> Result<Vec<Client>, AppError> {
    let trainer_id = auth.trainer_filter(query.trainer_id)?;

    let clients = sqlx::query_as::<_, Client>(&format!(
        r#"
        SELECT {CLIENT_COLUMNS} FROM clients
        WHERE organization_id = $1
          AND ($2::uuid IS NULL OR trainer_id = $2)
          AND ($3 OR is_active = true)
        ORDER BY created_at DESC
        "#
    ))
    .bind(auth.organization_id)
    .bind(trainer_id)
    .bind(query.include_inactive)
    .fetch_all(pool)
    .await?;

    Ok(clients)
}

/// Apply a partial update.
///
/// Only managers may reassign a client to a different trainer.
pub async fn update_client(
    pool: &DbPool,
    auth: &AuthContext,
    client_id: Uuid,
    request: UpdateClientRequest,
) -> Result<Client, AppError> {
    let current = get_client(pool, auth, client_id).await?;

    let full_name = match request.full_name {
        Some(name) => required_text(&name, "full_name")?,
        None => current.full_name,
    };
    let email = match request.email {
        Some(email) => optional_text(email),
        None => current.email,
    };
    let phone = match request.phone {
        Some(phone) => optional_text(phone),
        None => current.phone,
    };
    let trainer_id = match request.trainer_id {
        Some(new_trainer) if new_trainer != current.trainer_id => {
            auth.require_manager()?;
            if let Some(trainer_id) = new_trainer {
                let mut conn = pool.acquire().await?;
                find_active_staff(&mut conn, auth.organization_id, trainer_id).await?;
            }
            new_trainer
        }
        _ => current.trainer_id,
    };
    let is_active = request.is_active.unwrap_or(current.is_active);

    let client = sqlx::query_as::<_, Client>(&format!(
        r#"
        UPDATE clients
        SET full_name = $1, email = $2, phone = $3, trainer_id = $4, is_active = $5,
            updated_at = NOW()
        WHERE id = $6 AND organization_id = $7
        RETURNING {CLIENT_COLUMNS}
        "#
    ))
    .bind(&full_name)
    .bind(email)
    .bind(phone)
    .bind(trainer_id)
    .bind(is_active)
    .bind(client_id)
    .bind(auth.organization_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Client"))?;

    Ok(client)
}
