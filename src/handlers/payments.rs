//! Payment HTTP handlers.

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
    models::payment::{PaymentQuery, PaymentResponse, RecordPaymentRequest},
    services::payment_service,
};

/// Record a payment. Managers only.
///
/// # Request Body
///
/// ```json
/// {
///   "client_id": "660e8400-e29b-41d4-a716-446655440001",
///   "package_id": "880e8400-e29b-41d4-a716-446655440003",
///   "amount_cents": 75000,
///   "method": "card"
/// }
/// ```
///
/// The sale is credited to `trainer_id` if given, else the package's
/// trainer, else the client's trainer.
pub async fn record_payment(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let payment = payment_service::record_payment(&pool, &auth, request).await?;
    Ok((StatusCode::CREATED, Json(PaymentResponse::from(payment))))
}

pub async fn list_payments(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<PaymentQuery>,
) -> Result<Json<Vec<PaymentResponse>>, AppError> {
    let payments = payment_service::list_payments(&pool, &auth, query).await?;
    Ok(Json(payments.into_iter().map(Into::into).collect()))
}

/// Refund a payment. It stops counting toward sales-based commission.
pub async fn refund_payment(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<PaymentResponse>, AppError> {
    let payment = payment_service::refund_payment(&pool, &auth, payment_id).await?;
    Ok(Json(payment.into()))
}
