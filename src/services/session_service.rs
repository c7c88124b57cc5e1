//! Session logging - package credit consumption and cancellation.
//!
//! # Atomicity Guarantees
//!
//! Logging a session against a package locks the package row
//! (`SELECT ... FOR UPDATE`), decrements its remaining sessions and inserts
//! the session in one PostgreSQL transaction. Cancelling restores the credit
//! the same way, so two concurrent requests can never over-draw a package.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    commission::money::per_session_value,
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::session::{
        LogSessionRequest, SESSION_COLUMNS, SessionQuery, SessionStatus, TrainingSession,
    },
    services::{client_service, day_range, optional_text, user_service::find_active_staff},
};

/// Package columns needed while logging, read under a row lock.
#[derive(Debug, sqlx::FromRow)]
struct LockedPackage {
    client_id: Uuid,
    total_sessions: i32,
    remaining_sessions: i32,
    price_cents: i64,
    expires_on: Option<chrono::NaiveDate>,
}

impl LockedPackage {
    /// Check that this package can pay for a session of `client_id` at `session_at`.
    fn check_usable(&self, client_id: Uuid, session_at: DateTime<Utc>) -> Result<(), AppError> {
        if self.client_id != client_id {
            return Err(AppError::InvalidRequest(
                "Package does not belong to this client".to_string(),
            ));
        }
        if self
            .expires_on
            .is_some_and(|expiry| session_at.date_naive() > expiry)
        {
            return Err(AppError::PackageExpired);
        }
        if self.remaining_sessions <= 0 {
            return Err(AppError::PackageExhausted);
        }
        Ok(())
    }
}

/// Log a session.
///
/// # Process
///
/// 1. Resolve the trainer (caller by default; managers may log for others)
/// 2. Verify the client belongs to the organization and is visible to the caller
/// 3. Start a database transaction
/// 4. If a package is given: lock it, validate it, decrement it
/// 5. Insert the session with the package's per-session value snapshot
/// 6. Commit (or roll back on any error)
///
/// # Errors
///
/// - `NotFound`: client, trainer or package not found in the organization
/// - `PackageExhausted` / `PackageExpired`: the package cannot pay for the session
/// - `InvalidRequest`: status `cancelled`, or package of a different client
pub async fn log_session(
    pool: &DbPool,
    auth: &AuthContext,
    request: LogSessionRequest,
) -> Result<TrainingSession, AppError> {
    if request.status == SessionStatus::Cancelled {
        return Err(AppError::InvalidRequest(
            "Cancelled sessions cannot be logged; log and then cancel instead".to_string(),
        ));
    }

    let trainer_id = auth.scoped_trainer(request.trainer_id)?;
    let client = client_service::get_client(pool, auth, request.client_id).await?;
    if !client.is_active {
        return Err(AppError::InvalidRequest("Client is inactive".to_string()));
    }

    let mut tx = pool.begin().await?;

    find_active_staff(&mut tx, auth.organization_id, trainer_id).await?;

    let mut session_value_cents = 0;
    if let Some(package_id) = request.package_id {
        // FOR UPDATE holds the row until commit, serializing concurrent loggers
        let package = sqlx::query_as::<_, LockedPackage>(
            r#"
            SELECT client_id, total_sessions, remaining_sessions, price_cents, expires_on
            FROM packages
            WHERE id = $1 AND organization_id = $2
            FOR UPDATE
            "#,
        )
        .bind(package_id)
        .bind(auth.organization_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Package"))?;

        if let Err(e) = package.check_usable(client.id, request.session_at) {
            tx.rollback().await?;
            return Err(e);
        }

        sqlx::query(
            r#"
            UPDATE packages
            SET remaining_sessions = remaining_sessions - 1,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(package_id)
        .execute(&mut *tx)
        .await?;

        session_value_cents = per_session_value(package.price_cents, package.total_sessions);
    }

    let session = sqlx::query_as::<_, TrainingSession>(&format!(
        r#"
        INSERT INTO sessions (
            organization_id, trainer_id, client_id, package_id,
            session_at, status, session_value_cents, notes, created_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {SESSION_COLUMNS}
        "#
    ))
    .bind(auth.organization_id)
    .bind(trainer_id)
    .bind(client.id)
    .bind(request.package_id)
    .bind(request.session_at)
    .bind(request.status.as_str())
    .bind(session_value_cents)
    .bind(optional_text(request.notes))
    .bind(auth.user_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        session_id = %session.id,
        trainer_id = %session.trainer_id,
        client_id = %session.client_id,
        package_id = ?session.package_id,
        status = %session.status,
        "session logged"
    );

    Ok(session)
}

/// Cancel a session and give its package credit back.
pub async fn cancel_session(
    pool: &DbPool,
    auth: &AuthContext,
    session_id: Uuid,
) -> Result<TrainingSession, AppError> {
    let mut tx = pool.begin().await?;

    let session = sqlx::query_as::<_, TrainingSession>(&format!(
        "SELECT {SESSION_COLUMNS} FROM sessions \
         WHERE id = $1 AND organization_id = $2 FOR UPDATE"
    ))
    .bind(session_id)
    .bind(auth.organization_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("Session"))?;

    if !auth.is_manager() && session.trainer_id != auth.user_id {
        tx.rollback().await?;
        return Err(AppError::NotFound("Session"));
    }
    if session.status == SessionStatus::Cancelled {
        tx.rollback().await?;
        return Err(AppError::InvalidRequest(
            "Session is already cancelled".to_string(),
        ));
    }

    if let Some(package_id) = session.package_id {
        sqlx::query(
            r#"
            UPDATE packages
            SET remaining_sessions = LEAST(remaining_sessions + 1, total_sessions),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(package_id)
        .execute(&mut *tx)
        .await?;
    }

    let cancelled = sqlx::query_as::<_, TrainingSession>(&format!(
        "UPDATE sessions SET status = $1 WHERE id = $2 RETURNING {SESSION_COLUMNS}"
    ))
    .bind(SessionStatus::Cancelled.as_str())
    .bind(session_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        session_id = %cancelled.id,
        cancelled_by = %auth.user_id,
        package_id = ?cancelled.package_id,
        "session cancelled"
    );

    Ok(cancelled)
}

/// List sessions, most recent first. Trainers only see their own.
pub async fn list_sessions(
    pool: &DbPool,
    auth: &AuthContext,
    query: SessionQuery,
) -> Result<Vec<TrainingSession>, AppError> {
    let trainer_id = auth.trainer_filter(query.trainer_id)?;
    let (from, to) = day_range(query.from, query.to);

    let sessions = sqlx::query_as::<_, TrainingSession>(&format!(
        r#"
        SELECT {SESSION_COLUMNS} FROM sessions
        WHERE organization_id = $1
          AND ($2::uuid IS NULL OR trainer_id = $2)
          AND ($3::uuid IS NULL OR client_id = $3)
          AND ($4::timestamptz IS NULL OR session_at >= $4)
          AND ($5::timestamptz IS NULL OR session_at < $5)
          AND ($6::text IS NULL OR status = $6)
        ORDER BY session_at DESC
        "#
    ))
    .bind(auth.organization_id)
    .bind(trainer_id)
    .bind(query.client_id)
    .bind(from)
    .bind(to)
    .bind(query.status.map(SessionStatus::as_str))
    .fetch_all(pool)
    .await?;

    Ok(sessions)
}

/// Statuses whose sessions earn commission.
fn commissionable_statuses() -> Vec<&'static str> {
    [
        SessionStatus::Completed,
        SessionStatus::NoShow,
        SessionStatus::Cancelled,
    ]
    .into_iter()
    .filter(|status| status.counts_toward_commission())
    .map(SessionStatus::as_str)
    .collect()
}

/// Values of a trainer's commissionable sessions in `[from, to)`, oldest first.
pub async fn commissionable_session_values(
    pool: &DbPool,
    organization_id: Uuid,
    trainer_id: Uuid,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<i64>, AppError> {
    let values = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT session_value_cents FROM sessions
        WHERE organization_id = $1
          AND trainer_id = $2
          AND session_at >= $3 AND session_at < $4
          AND status = ANY($5)
        ORDER BY session_at, created_at
        "#,
    )
    .bind(organization_id)
    .bind(trainer_id)
    .bind(from)
    .bind(to)
    .bind(commissionable_statuses())
    .fetch_all(pool)
    .await?;

    Ok(values)
}
