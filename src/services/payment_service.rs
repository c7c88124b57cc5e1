//! Payment tracking and sales attribution.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    commission::money::MAX_AMOUNT_CENTS,
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::payment::{
        PAYMENT_COLUMNS, Payment, PaymentQuery, PaymentStatus, RecordPaymentRequest,
        resolve_attribution,
    },
    services::{
        client_service, day_range, optional_text, package_service,
        user_service::find_active_staff,
    },
};

/// Record a payment from a client. Managers only.
///
/// # Process
///
/// 1. Validate the amount and load the client (and package, if given)
/// 2. Work out which trainer the sale is credited to
/// 3. Insert the payment as `completed`
pub async fn record_payment(
    pool: &DbPool,
    auth: &AuthContext,
    request: RecordPaymentRequest,
) -> Result<Payment, AppError> {
    auth.require_manager()?;

    if !(1..=MAX_AMOUNT_CENTS).contains(&request.amount_cents) {
        return Err(AppError::InvalidRequest(format!(
            "Amount must be between 1 and {MAX_AMOUNT_CENTS} cents"
        )));
    }

    let client = client_service::fetch_client(pool, auth.organization_id, request.client_id).await?;

    let package_trainer = match request.package_id {
        Some(package_id) => {
            let package =
                package_service::fetch_package(pool, auth.organization_id, package_id).await?;
            if package.client_id != client.id {
                return Err(AppError::InvalidRequest(
                    "Package does not belong to this client".to_string(),
                ));
            }
            package.trainer_id
        }
        None => None,
    };

    let trainer_id = resolve_attribution(request.trainer_id, package_trainer, client.trainer_id);
    if let Some(explicit) = request.trainer_id {
        let mut conn = pool.acquire().await?;
        find_active_staff(&mut conn, auth.organization_id, explicit).await?;
    }

    let payment = sqlx::query_as::<_, Payment>(&format!(
        r#"
        INSERT INTO payments (
            organization_id, client_id, package_id, trainer_id,
            amount_cents, method, status, paid_at, notes
        )
        VALUES ($1, $2, $3, $4, $5, $6, 'completed', COALESCE($7, NOW()), $8)
        RETURNING {PAYMENT_COLUMNS}
        "#
    ))
    .bind(auth.organization_id)
    .bind(client.id)
    .bind(request.package_id)
    .bind(trainer_id)
    .bind(request.amount_cents)
    .bind(request.method.as_str())
    .bind(request.paid_at)
    .bind(optional_text(request.notes))
    .fetch_one(pool)
    .await?;

    tracing::info!(
        payment_id = %payment.id,
        client_id = %payment.client_id,
        trainer_id = ?payment.trainer_id,
        amount_cents = payment.amount_cents,
        method = %payment.method,
        "payment recorded"
    );

    Ok(payment)
}

/// Mark a payment refunded so it no longer counts as a sale.
pub async fn refund_payment(
    pool: &DbPool,
    auth: &AuthContext,
    payment_id: Uuid,
) -> Result<Payment, AppError> {
    auth.require_manager()?;

    let mut tx = pool.begin().await?;

    let status: String = sqlx::query_scalar(
        "SELECT status FROM payments WHERE id = $1 AND organization_id = $2 FOR UPDATE",
    )
    .bind(payment_id)
    .bind(auth.organization_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("Payment"))?;

    if status == PaymentStatus::Refunded.as_str() {
        tx.rollback().await?;
        return Err(AppError::InvalidRequest(
            "Payment is already refunded".to_string(),
        ));
    }

    let payment = sqlx::query_as::<_, Payment>(&format!(
        "UPDATE payments SET status = $1 WHERE id = $2 RETURNING {PAYMENT_COLUMNS}"
    ))
    .bind(PaymentStatus::Refunded.as_str())
    .bind(payment_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(payment_id = %payment.id, refunded_by = %auth.user_id, "payment refunded");

    Ok(payment)
}

/// List payments, most recent first. Trainers only see sales credited to them.
pub async fn list_payments(
    pool: &DbPool,
    auth: &AuthContext,
    query: PaymentQuery,
) -> Result<Vec<Payment>, AppError> {
    let trainer_id = auth.trainer_filter(query.trainer_id)?;
    let (from, to) = day_range(query.from, query.to);

    let payments = sqlx::query_as::<_, Payment>(&format!(
        r#"
        SELECT {PAYMENT_COLUMNS} FROM payments
        WHERE organization_id = $1
          AND ($2::uuid IS NULL OR trainer_id = $2)
          AND ($3::uuid IS NULL OR client_id = $3)
          AND ($4::timestamptz IS NULL OR paid_at >= $4)
          AND ($5::timestamptz IS NULL OR paid_at < $5)
        ORDER BY paid_at DESC
        "#
    ))
    .bind(auth.organization_id)
    .bind(trainer_id)
    .bind(query.client_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    Ok(payments)
}

/// Completed sales credited to `trainer_id` in `[from, to)`.
pub async fn attributed_sales_cents(
    pool: &DbPool,
    organization_id: Uuid,
    trainer_id: Uuid,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<i64, AppError> {
    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(amount_cents), 0)::BIGINT FROM payments
        WHERE organization_id = $1
          AND trainer_id = $2
          AND status = 'completed'
          AND paid_at >= $3 AND paid_at < $4
        "#,
    )
    .bind(organization_id)
    .bind(trainer_id)
    .bind(from)
    .bind(to)
    .fetch_one(pool)
    .await?;

    Ok(total)
}
