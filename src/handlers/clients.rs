//! Client HTTP handlers.
//!
//! - POST /api/v1/clients - Create client
//! - GET /api/v1/clients - List clients
//! - GET /api/v1/clients/:id - Get client
//! - PATCH /api/v1/clients/:id - Update client

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
    models::client::{ClientQuery, ClientResponse, CreateClientRequest, UpdateClientRequest},
    services::client_service,
};

/// Create a client.
///
/// Trainers may only create clients for themselves; managers may assign any
/// trainer or leave the client unassigned.
///
/// # Request Body
///
/// ```json
/// {
///   "full_name": "Alex Moreno",
///   "email": "alex@example.com",
///   "phone": "+1 555 0100",
///   "trainer_id": "550e8400-e29b-41d4-a716-446655440000"
/// }
/// ```
pub async fn create_client(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CreateClientRequest>,
) -> Result<impl IntoResponse, AppError> {
    let client = client_service::create_client(&pool, &auth, request).await?;
    Ok((StatusCode::CREATED, Json(ClientResponse::from(client))))
}

/// List clients.
///
/// # Query Parameters
///
/// - `trainer_id` (optional): managers only; trainers always see their own
/// - `include_inactive` (optional, default false)
pub async fn list_clients(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ClientQuery>,
) -> Result<Json<Vec<ClientResponse>>, AppError> {
    let clients = client_service::list_clients(&pool, &auth, query).await?;
    Ok(Json(clients.into_iter().map(Into::into).collect()))
}

pub async fn get_client(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(client_id): Path<Uuid>,
) -> Result<Json<ClientResponse>, AppError> {
    let client = client_service::get_client(&pool, &auth, client_id).await?;
    Ok(Json(client.into()))
}

/// Partially update a client. Absent fields are left alone; `null` clears
/// an optional field.
pub async fn update_client(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(client_id): Path<Uuid>,
    Json(request): Json<UpdateClientRequest>,
) -> Result<Json<ClientResponse>, AppError> {
    let client = client_service::update_client(&pool, &auth, client_id, request).await?;
    Ok(Json(client.into()))
}
